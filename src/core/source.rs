use crate::core::error::FetchError;
use crate::core::series::NavSeries;
use async_trait::async_trait;

/// Fetches the full NAV history of one scheme.
///
/// Implementations perform exactly one request per call; retrying and caching are
/// layered on top by the caller.
#[async_trait]
pub trait NavSource: Send + Sync {
    async fn fetch_series(&self, scheme_code: &str) -> Result<NavSeries, FetchError>;
}
