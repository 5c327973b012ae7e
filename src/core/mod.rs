//! Domain types and calculations. Nothing in here talks to the network directly.

pub mod analytics;
pub mod cache;
pub mod candles;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod log;
pub mod period;
pub mod returns;
pub mod risk;
pub mod series;
pub mod source;

// Re-export main types for cleaner imports
pub use analytics::{AnalyticsSettings, FundAnalytics, FundSnapshot};
pub use cache::SeriesCache;
pub use candles::{BucketOrder, Candle};
pub use catalog::{CatalogSource, SchemeCategory, SchemeRef};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{AnalyticsError, FetchError};
pub use period::ReturnPeriod;
pub use returns::ReturnResult;
pub use risk::RiskTier;
pub use series::{NavPoint, NavSeries};
pub use source::NavSource;
