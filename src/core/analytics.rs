//! Fund analytics over cached NAV histories.
//!
//! Within one scheme the pipeline is strictly fetch, cache write, compute. Across
//! schemes, fetches run concurrently up to `max_in_flight` and results are
//! recombined by input position or scheme code, so completion order never matters.
use crate::core::cache::SeriesCache;
use crate::core::candles::{BucketOrder, Candle, aggregate_with};
use crate::core::catalog::SchemeRef;
use crate::core::clock::Clock;
use crate::core::error::FetchError;
use crate::core::period::ReturnPeriod;
use crate::core::returns::{
    NEAR_DATE_TOLERANCE_DAYS, ReturnResult, compute_period_return, nearest_date_return,
};
use crate::core::risk::RiskTier;
use crate::core::series::NavSeries;
use crate::core::source::NavSource;
use crate::providers::util::{RetryPolicy, with_retry};
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Periods reported on a fund snapshot.
pub const SNAPSHOT_PERIODS: [ReturnPeriod; 3] = [
    ReturnPeriod::OneYear,
    ReturnPeriod::ThreeYears,
    ReturnPeriod::FiveYears,
];

#[derive(Debug, Clone, Copy)]
pub struct AnalyticsSettings {
    pub retry: RetryPolicy,
    pub max_in_flight: usize,
    pub near_tolerance_days: i64,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::new(3, Duration::from_millis(1000), Duration::from_secs(8)),
            max_in_flight: 4,
            near_tolerance_days: NEAR_DATE_TOLERANCE_DAYS,
        }
    }
}

/// Everything a fund card or detail screen shows for one scheme.
#[derive(Debug, Clone)]
pub struct FundSnapshot {
    pub scheme: SchemeRef,
    pub latest_nav: Option<f64>,
    pub latest_date: Option<NaiveDate>,
    pub returns: BTreeMap<ReturnPeriod, ReturnResult>,
    /// One-year return against an observation near the anchor date.
    pub one_year_near: Option<f64>,
    pub risk: RiskTier,
    pub nav_std_dev: Option<f64>,
    pub error: Option<String>,
}

impl FundSnapshot {
    fn unavailable(scheme: &SchemeRef, error: String) -> Self {
        Self {
            scheme: scheme.clone(),
            latest_nav: None,
            latest_date: None,
            returns: BTreeMap::new(),
            one_year_near: None,
            risk: scheme.risk(),
            nav_std_dev: None,
            error: Some(error),
        }
    }

    pub fn percent(&self, period: ReturnPeriod) -> Option<f64> {
        self.returns.get(&period).and_then(|r| r.percent)
    }
}

pub struct FundAnalytics {
    source: Arc<dyn NavSource>,
    cache: Arc<SeriesCache>,
    clock: Arc<dyn Clock>,
    settings: AnalyticsSettings,
}

impl FundAnalytics {
    pub fn new(
        source: Arc<dyn NavSource>,
        cache: Arc<SeriesCache>,
        clock: Arc<dyn Clock>,
        settings: AnalyticsSettings,
    ) -> Self {
        Self {
            source,
            cache,
            clock,
            settings,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn near_tolerance_days(&self) -> i64 {
        self.settings.near_tolerance_days
    }

    /// The scheme's NAV history, from cache when present.
    pub async fn series(&self, scheme_code: &str) -> Result<Arc<NavSeries>, FetchError> {
        if let Some(series) = self.cache.get(scheme_code).await {
            return Ok(series);
        }
        self.refresh(scheme_code).await
    }

    /// Fetches the scheme's NAV history, bypassing and then overwriting the cache.
    pub async fn refresh(&self, scheme_code: &str) -> Result<Arc<NavSeries>, FetchError> {
        let series = with_retry(
            || self.source.fetch_series(scheme_code),
            &self.settings.retry,
        )
        .await
        .map(Arc::new)?;

        // An empty history is returned but never cached, so a later call fetches again
        if series.is_empty() {
            debug!("Scheme {} returned no NAV points; not caching", scheme_code);
        } else {
            self.cache
                .put(scheme_code, Arc::clone(&series), self.clock.now())
                .await;
        }
        Ok(series)
    }

    /// Trailing return; fetch failures resolve to an unavailable result.
    pub async fn period_return(&self, scheme_code: &str, period: ReturnPeriod) -> ReturnResult {
        match self.series(scheme_code).await {
            Ok(series) => compute_period_return(&series, period, self.today()),
            Err(e) => {
                warn!("Return for scheme {} unavailable: {}", scheme_code, e);
                ReturnResult {
                    period_months: period.months().unwrap_or(0),
                    percent: None,
                    annualized: None,
                }
            }
        }
    }

    pub async fn candles(
        &self,
        scheme_code: &str,
        window: ReturnPeriod,
        order: BucketOrder,
    ) -> Result<Vec<Candle>, FetchError> {
        let series = self.series(scheme_code).await?;
        let today = self.today();
        let candles: Vec<Candle> = aggregate_with(&series, window, today, order).collect();
        debug!(
            "Generated {} candles for scheme {}, window {}",
            candles.len(),
            scheme_code,
            window
        );
        Ok(candles)
    }

    pub async fn snapshot(&self, scheme: &SchemeRef) -> FundSnapshot {
        match self.series(&scheme.code).await {
            Ok(series) => self.snapshot_from(scheme, &series),
            Err(e) => {
                warn!("Scheme {} unavailable: {}", scheme.code, e);
                FundSnapshot::unavailable(scheme, e.to_string())
            }
        }
    }

    /// Computes a snapshot from an already fetched series.
    pub fn snapshot_from(&self, scheme: &SchemeRef, series: &NavSeries) -> FundSnapshot {
        let today = self.today();
        let tolerance = self.settings.near_tolerance_days;
        let returns = SNAPSHOT_PERIODS
            .iter()
            .map(|period| (*period, compute_period_return(series, *period, today)))
            .collect();

        FundSnapshot {
            scheme: scheme.clone(),
            latest_nav: series.latest().map(|p| p.nav),
            latest_date: series.latest().map(|p| p.date),
            returns,
            one_year_near: nearest_date_return(series, 12, tolerance, today).percent,
            risk: scheme.risk(),
            nav_std_dev: series.nav_std_dev(),
            error: None,
        }
    }

    /// Snapshots for many schemes with at most `max_in_flight` fetches outstanding.
    /// Results come back in input order; `on_done` fires as each scheme completes.
    pub async fn snapshots(
        &self,
        schemes: &[SchemeRef],
        on_done: &(dyn Fn() + Sync),
    ) -> Vec<FundSnapshot> {
        let limit = self.settings.max_in_flight.max(1);
        let mut indexed: Vec<(usize, FundSnapshot)> = stream::iter(schemes.iter().enumerate())
            .map(|(index, scheme)| async move {
                let snapshot = self.snapshot(scheme).await;
                on_done();
                (index, snapshot)
            })
            .buffer_unordered(limit)
            .collect()
            .await;

        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, snapshot)| snapshot).collect()
    }

    fn returns_row(&self, series: &NavSeries, periods: &[ReturnPeriod]) -> ReturnsRow {
        let today = self.today();
        let tolerance = self.settings.near_tolerance_days;
        ReturnsRow {
            returns: periods
                .iter()
                .map(|p| (*p, compute_period_return(series, *p, today)))
                .collect(),
            one_year_near: nearest_date_return(series, 12, tolerance, today).percent,
        }
    }

    /// Returns for many schemes and periods, fanned out like [`Self::snapshots`].
    pub async fn returns_table(
        &self,
        scheme_codes: &[String],
        periods: &[ReturnPeriod],
        on_done: &(dyn Fn() + Sync),
    ) -> HashMap<String, Result<ReturnsRow, FetchError>> {
        let limit = self.settings.max_in_flight.max(1);
        stream::iter(scheme_codes)
            .map(|code| async move {
                let row = self
                    .series(code)
                    .await
                    .map(|series| self.returns_row(&series, periods));
                on_done();
                (code.clone(), row)
            })
            .buffer_unordered(limit)
            .collect()
            .await
    }
}

/// Returns of one scheme across the requested periods.
#[derive(Debug, Clone)]
pub struct ReturnsRow {
    pub returns: BTreeMap<ReturnPeriod, ReturnResult>,
    pub one_year_near: Option<f64>,
}
