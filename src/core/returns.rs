//! Trailing return calculations over a NAV series.
//!
//! Two anchoring modes exist. The trailing mode takes the closest observation on
//! or before the anchor date and falls back to the oldest observation when the
//! series is shorter than the look-back. The nearest-date mode only accepts an
//! observation within a tolerance window around the anchor and reports the
//! return as unavailable otherwise, since NAVs are not published on holidays
//! and weekends.
use crate::core::error::AnalyticsError;
use crate::core::period::{ReturnPeriod, months_before, whole_months_between};
use crate::core::series::{NavPoint, NavSeries};
use chrono::NaiveDate;
use rust_decimal::{Decimal, prelude::*};
use rust_finprim::rate::cagr;
use serde::Serialize;
use tracing::debug;

/// Default half-width of the nearest-date window.
pub const NEAR_DATE_TOLERANCE_DAYS: i64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReturnResult {
    pub period_months: u32,
    /// Absolute change in percent, `None` when the series cannot support it.
    pub percent: Option<f64>,
    /// Compound annual growth over the actual span, only for spans of a year or more.
    pub annualized: Option<f64>,
}

impl ReturnResult {
    fn unavailable(period_months: u32) -> Self {
        Self {
            period_months,
            percent: None,
            annualized: None,
        }
    }

    fn from_points(period_months: u32, start: &NavPoint, end: &NavPoint) -> Self {
        match percent_change(start.nav, end.nav) {
            Ok(percent) => Self {
                period_months,
                percent: Some(percent),
                annualized: annualized_return(start, end),
            },
            Err(e) => {
                debug!("Return over {period_months} months unavailable: {e}");
                Self::unavailable(period_months)
            }
        }
    }
}

/// `(end - start) / start * 100`, refusing to divide by a non-positive start.
pub fn percent_change(start_nav: f64, end_nav: f64) -> Result<f64, AnalyticsError> {
    if start_nav.is_nan() || start_nav <= 0.0 {
        return Err(AnalyticsError::DivisionGuard);
    }
    Ok((end_nav - start_nav) / start_nav * 100.0)
}

/// Start and end observations for a trailing return anchored `period_months` before `today`.
pub fn trailing_points(
    series: &NavSeries,
    period_months: u32,
    today: NaiveDate,
) -> Result<(NavPoint, NavPoint), AnalyticsError> {
    if series.len() < 2 {
        return Err(AnalyticsError::InsufficientData);
    }
    let end = *series.latest().ok_or(AnalyticsError::InsufficientData)?;
    let anchor = months_before(today, period_months);

    let start = series
        .points()
        .iter()
        .filter(|p| p.date <= anchor)
        .max_by_key(|p| p.date)
        .or_else(|| series.oldest())
        .copied()
        .ok_or(AnalyticsError::InsufficientData)?;

    Ok((start, end))
}

/// Percentage return over `period_months` with closest-on-or-before anchoring.
pub fn try_compute_return(
    series: &NavSeries,
    period_months: u32,
    today: NaiveDate,
) -> Result<f64, AnalyticsError> {
    let (start, end) = trailing_points(series, period_months, today)?;
    percent_change(start.nav, end.nav)
}

pub fn compute_return(series: &NavSeries, period_months: u32, today: NaiveDate) -> ReturnResult {
    match trailing_points(series, period_months, today) {
        Ok((start, end)) => ReturnResult::from_points(period_months, &start, &end),
        Err(_) => ReturnResult::unavailable(period_months),
    }
}

/// Trailing return for a named period. [`ReturnPeriod::AllTime`] always anchors
/// on the oldest observation.
pub fn compute_period_return(
    series: &NavSeries,
    period: ReturnPeriod,
    today: NaiveDate,
) -> ReturnResult {
    match period.months() {
        Some(months) => compute_return(series, months, today),
        None => {
            let (Some(start), Some(end)) = (series.oldest(), series.latest()) else {
                return ReturnResult::unavailable(0);
            };
            let months = whole_months_between(start.date, end.date);
            if series.len() < 2 {
                return ReturnResult::unavailable(months);
            }
            ReturnResult::from_points(months, start, end)
        }
    }
}

/// Return against the observation closest to the anchor date, accepted only when it
/// lies strictly within `tolerance_days` of the anchor.
pub fn nearest_date_return(
    series: &NavSeries,
    period_months: u32,
    tolerance_days: i64,
    today: NaiveDate,
) -> ReturnResult {
    if series.len() < 2 {
        return ReturnResult::unavailable(period_months);
    }
    let Some(end) = series.latest() else {
        return ReturnResult::unavailable(period_months);
    };
    if end.nav.is_nan() || end.nav <= 0.0 {
        return ReturnResult::unavailable(period_months);
    }

    let anchor = months_before(today, period_months);
    let start = series
        .points()
        .iter()
        .filter(|p| (p.date - anchor).num_days().abs() < tolerance_days)
        .min_by_key(|p| (p.date - anchor).num_days().abs());

    match start {
        Some(start) => ReturnResult::from_points(period_months, start, end),
        None => {
            debug!("No NAV within {tolerance_days} days of {anchor}");
            ReturnResult::unavailable(period_months)
        }
    }
}

fn annualized_return(start: &NavPoint, end: &NavPoint) -> Option<f64> {
    let days = (end.date - start.date).num_days();
    if days < 365 {
        return None;
    }
    let begin_bal = Decimal::from_f64(start.nav)?;
    let end_bal = Decimal::from_f64(end.nav)?;
    let n_years = Decimal::from_f64(days as f64 / 365.0)?;
    if begin_bal.is_zero() || n_years.is_zero() {
        return None;
    }

    let rate = cagr(begin_bal, end_bal, n_years);
    (rate * Decimal::from(100)).to_f64()
}
