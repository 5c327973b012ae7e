//! NAV observations and the series they form.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One published NAV for a scheme.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavPoint {
    pub date: NaiveDate,
    pub nav: f64,
}

impl NavPoint {
    /// Returns `None` unless `nav` is a finite, strictly positive number.
    pub fn new(date: NaiveDate, nav: f64) -> Option<Self> {
        (nav.is_finite() && nav > 0.0).then_some(Self { date, nav })
    }
}

/// An immutable NAV history in source order, newest observation first.
///
/// No two points share a date. The source is trusted for ordering but not for
/// uniqueness: when a date repeats, the first occurrence wins.
///
/// Deserialises from a bare list of points through [`NavSeries::new`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<NavPoint>", into = "Vec<NavPoint>")]
pub struct NavSeries {
    points: Vec<NavPoint>,
}

impl NavSeries {
    pub fn new(points: Vec<NavPoint>) -> Self {
        let mut seen = HashSet::with_capacity(points.len());
        let points = points
            .into_iter()
            .filter(|point| seen.insert(point.date))
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[NavPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The most recent observation (series head).
    pub fn latest(&self) -> Option<&NavPoint> {
        self.points.first()
    }

    /// The oldest observation (series tail).
    pub fn oldest(&self) -> Option<&NavPoint> {
        self.points.last()
    }

    /// Walks the series from the tail towards the head.
    pub fn oldest_first(&self) -> impl DoubleEndedIterator<Item = &NavPoint> + Clone {
        self.points.iter().rev()
    }

    /// Earliest and latest dates present, independent of storage order.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.points.iter().map(|p| p.date).min()?;
        let last = self.points.iter().map(|p| p.date).max()?;
        Some((first, last))
    }

    /// Population standard deviation of all NAV values.
    pub fn nav_std_dev(&self) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }
        let n = self.points.len() as f64;
        let mean = self.points.iter().map(|p| p.nav).sum::<f64>() / n;
        let variance = self
            .points
            .iter()
            .map(|p| (p.nav - mean).powi(2))
            .sum::<f64>()
            / n;
        Some(variance.sqrt())
    }
}

impl From<Vec<NavPoint>> for NavSeries {
    fn from(points: Vec<NavPoint>) -> Self {
        Self::new(points)
    }
}

impl From<NavSeries> for Vec<NavPoint> {
    fn from(series: NavSeries) -> Self {
        series.points
    }
}

impl FromIterator<NavPoint> for NavSeries {
    fn from_iter<I: IntoIterator<Item = NavPoint>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
