//! Monthly OHLC candles from a daily NAV series.
//!
//! The window ends at the first day of the current month, so the month in progress
//! is never charted. Months without observations produce no candle.
//!
//! Open and close are the first and last values *encountered* while walking a
//! bucket from the series tail towards its head. For a well-formed newest-first
//! source that is the first and last trading day of the month, but the source does
//! not promise intra-month ordering, so these are approximations of true OHLC.
//! [`BucketOrder::Chronological`] sorts each bucket by date first.

use crate::core::period::{ReturnPeriod, months_before, whole_months_between};
use crate::core::series::{NavPoint, NavSeries};
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use std::iter::{FusedIterator, Rev};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BucketOrder {
    /// Values in the order the series yields them.
    #[default]
    Encounter,
    /// Values sorted by date within each month.
    Chronological,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candle {
    /// Month summarised, e.g. "Jan 24".
    pub label: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Start of the summarised month, midnight UTC.
    pub timestamp: DateTime<Utc>,
}

/// Number of months a window asks for. `AllTime` spans the series, at least one month.
pub fn candle_count(series: &NavSeries, window: ReturnPeriod) -> u32 {
    window.months().unwrap_or_else(|| {
        series
            .date_span()
            .map_or(0, |(first, last)| whole_months_between(first, last))
            .max(1)
    })
}

pub fn aggregate(series: &NavSeries, window: ReturnPeriod, today: NaiveDate) -> Candles<'_> {
    aggregate_with(series, window, today, BucketOrder::default())
}

pub fn aggregate_with(
    series: &NavSeries,
    window: ReturnPeriod,
    today: NaiveDate,
    order: BucketOrder,
) -> Candles<'_> {
    let count = candle_count(series, window);
    Candles {
        series,
        current_month: today.with_day(1).unwrap_or(today),
        offsets: (0..count).rev(),
        order,
    }
}

/// Lazy candle sequence, oldest month first. Cloning restarts from the same position.
#[derive(Debug, Clone)]
pub struct Candles<'a> {
    series: &'a NavSeries,
    current_month: NaiveDate,
    offsets: Rev<Range<u32>>,
    order: BucketOrder,
}

impl Candles<'_> {
    fn bucket(&self, month_start: NaiveDate, month_end: NaiveDate) -> Option<Candle> {
        let mut points: Vec<&NavPoint> = self
            .series
            .oldest_first()
            .filter(|p| p.date >= month_start && p.date < month_end)
            .collect();
        if self.order == BucketOrder::Chronological {
            points.sort_by_key(|p| p.date);
        }

        let open = points.first()?.nav;
        let close = points.last()?.nav;
        let (high, low) = points
            .iter()
            .fold((f64::MIN, f64::MAX), |(high, low), p| {
                (high.max(p.nav), low.min(p.nav))
            });

        Some(Candle {
            label: month_start.format("%b %y").to_string(),
            open,
            high,
            low,
            close,
            timestamp: month_start.and_time(NaiveTime::MIN).and_utc(),
        })
    }
}

impl Iterator for Candles<'_> {
    type Item = Candle;

    fn next(&mut self) -> Option<Candle> {
        loop {
            let offset = self.offsets.next()?;
            let month_end = months_before(self.current_month, offset);
            let month_start = months_before(month_end, 1);
            if let Some(candle) = self.bucket(month_start, month_end) {
                return Some(candle);
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.offsets.size_hint().1)
    }
}

impl FusedIterator for Candles<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn point(date: NaiveDate, nav: f64) -> NavPoint {
        NavPoint { date, nav }
    }

    /// Daily points from `from` to `to` inclusive, newest first, NAV rising by 1 per day.
    fn daily(from: NaiveDate, to: NaiveDate) -> NavSeries {
        let days = (to - from).num_days();
        NavSeries::new(
            (0..=days)
                .rev()
                .map(|i| NavPoint {
                    date: from + Duration::days(i),
                    nav: 100.0 + i as f64,
                })
                .collect(),
        )
    }

    #[test]
    fn one_year_window_yields_twelve_ascending_months() {
        let series = daily(d(2023, 1, 1), d(2024, 6, 20));
        let candles: Vec<Candle> =
            aggregate(&series, ReturnPeriod::OneYear, d(2024, 6, 20)).collect();

        assert_eq!(candles.len(), 12);
        assert_eq!(candles.first().unwrap().label, "Jun 23");
        assert_eq!(candles.last().unwrap().label, "May 24");
        assert!(
            candles
                .windows(2)
                .all(|pair| pair[0].timestamp < pair[1].timestamp)
        );
    }

    #[test]
    fn ohlc_values_cover_the_whole_month() {
        let series = daily(d(2024, 1, 1), d(2024, 3, 10));
        let candles: Vec<Candle> =
            aggregate(&series, ReturnPeriod::OneMonth, d(2024, 3, 10)).collect();

        assert_eq!(candles.len(), 1);
        let feb = &candles[0];
        assert_eq!(feb.label, "Feb 24");
        // 2024-02-01 is day 31 after 2024-01-01, 2024-02-29 is day 59
        assert_eq!(feb.open, 131.0);
        assert_eq!(feb.close, 159.0);
        assert_eq!(feb.low, 131.0);
        assert_eq!(feb.high, 159.0);
        let month_start = d(2024, 2, 1).and_time(NaiveTime::MIN).and_utc();
        assert_eq!(feb.timestamp, month_start);
    }

    #[test]
    fn empty_months_are_omitted() {
        let series = NavSeries::new(vec![
            point(d(2024, 5, 10), 12.0),
            point(d(2024, 2, 10), 11.0),
            point(d(2024, 2, 3), 10.0),
        ]);

        let candles: Vec<Candle> =
            aggregate(&series, ReturnPeriod::SixMonths, d(2024, 6, 15)).collect();

        let labels: Vec<&str> = candles.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Feb 24", "May 24"]);
    }

    #[test]
    fn current_month_is_not_charted() {
        let series = daily(d(2024, 5, 1), d(2024, 6, 20));
        let candles: Vec<Candle> =
            aggregate(&series, ReturnPeriod::OneYear, d(2024, 6, 20)).collect();

        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].label, "May 24");
    }

    #[test]
    fn aggregation_is_restartable() {
        let series = daily(d(2022, 1, 1), d(2024, 6, 20));
        let candles = aggregate(&series, ReturnPeriod::ThreeYears, d(2024, 6, 20));

        let first: Vec<Candle> = candles.clone().collect();
        let second: Vec<Candle> = candles.collect();
        let third: Vec<Candle> =
            aggregate(&series, ReturnPeriod::ThreeYears, d(2024, 6, 20)).collect();

        assert_eq!(first, second);
        assert_eq!(first, third);
        assert_eq!(first.len(), 29);
    }

    #[test]
    fn all_time_window_spans_the_series() {
        let series = daily(d(2023, 3, 15), d(2024, 3, 20));
        assert_eq!(candle_count(&series, ReturnPeriod::AllTime), 12);

        let short = daily(d(2024, 3, 1), d(2024, 3, 5));
        assert_eq!(candle_count(&short, ReturnPeriod::AllTime), 1);
        let empty = NavSeries::default();
        assert_eq!(candle_count(&empty, ReturnPeriod::AllTime), 1);
        assert_eq!(candle_count(&short, ReturnPeriod::FiveYears), 60);
    }

    #[test]
    fn chronological_order_differs_only_for_unordered_sources() {
        // out-of-order source: mid-month point delivered after the month end
        let series = NavSeries::new(vec![
            point(d(2024, 1, 15), 15.0),
            point(d(2024, 1, 31), 31.0),
            point(d(2024, 1, 2), 2.0),
        ]);

        let encounter: Vec<Candle> =
            aggregate(&series, ReturnPeriod::OneMonth, d(2024, 2, 5)).collect();
        let sorted: Vec<Candle> = aggregate_with(
            &series,
            ReturnPeriod::OneMonth,
            d(2024, 2, 5),
            BucketOrder::Chronological,
        )
        .collect();

        assert_eq!((encounter[0].open, encounter[0].close), (2.0, 15.0));
        assert_eq!((sorted[0].open, sorted[0].close), (2.0, 31.0));
        assert_eq!((sorted[0].high, sorted[0].low), (31.0, 2.0));
        assert_eq!((encounter[0].high, encounter[0].low), (31.0, 2.0));
    }
}
