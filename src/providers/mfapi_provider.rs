use crate::core::catalog::{CatalogSource, SchemeRef, UNKNOWN};
use crate::core::error::FetchError;
use crate::core::series::{NavPoint, NavSeries};
use crate::core::source::NavSource;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.mfapi.in";
pub const DEFAULT_CATALOG_LIMIT: usize = 50;

/// Client for the public mutual fund NAV history API.
///
/// `GET {base}/mf/{code}` returns `{"meta": {..}, "data": [..]}` with `data` records
/// shaped like `{"date": "DD-MM-YYYY", "nav": "12.34"}`, newest first.
/// `GET {base}/mf` returns the scheme list.
pub struct MfApiProvider {
    base_url: String,
    client: reqwest::Client,
    timeout: Option<Duration>,
    catalog_limit: usize,
}

impl MfApiProvider {
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("navlens/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout: None,
            catalog_limit: DEFAULT_CATALOG_LIMIT,
        })
    }

    /// Bounds every request; an expired request is aborted and reported as a timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Number of leading catalog records considered.
    pub fn with_catalog_limit(mut self, limit: usize) -> Self {
        self.catalog_limit = limit;
        self
    }

    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        debug!("Requesting {}", url);
        let mut request = self.client.get(url).header("Accept", "application/json");
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| self.request_error(e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(|e| self.request_error(e))?;
        if text.trim().is_empty() {
            return Err(FetchError::Malformed(format!("empty response from {url}")));
        }
        Ok(text)
    }

    fn request_error(&self, err: reqwest::Error) -> FetchError {
        match self.timeout {
            Some(timeout) if err.is_timeout() => FetchError::Timeout(timeout),
            _ => FetchError::from(err),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NavHistoryResponse {
    data: Vec<Value>,
}

/// Parses the `DD-MM-YYYY` dates used by the API.
pub fn parse_api_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%d-%m-%Y").ok()
}

fn number_field(record: &Value, key: &str) -> Option<f64> {
    match record.get(key)? {
        Value::String(text) => text.trim().parse().ok(),
        Value::Number(number) => number.as_f64(),
        _ => None,
    }
}

fn text_field(record: &Value, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Validates one `data` record; anything missing or unparsable yields `None`.
fn validate_nav_record(record: &Value) -> Option<NavPoint> {
    let date = record.get("date")?.as_str().and_then(parse_api_date)?;
    let nav = number_field(record, "nav")?;
    NavPoint::new(date, nav)
}

/// Validates one catalog record. Code and name are required.
fn validate_scheme_record(record: &Value) -> Option<SchemeRef> {
    let code = text_field(record, "schemeCode")?;
    let name = text_field(record, "schemeName")?;
    Some(SchemeRef {
        code,
        name,
        category: text_field(record, "schemeCategory").unwrap_or_else(|| UNKNOWN.to_string()),
        amc: text_field(record, "fundHouse").unwrap_or_else(|| UNKNOWN.to_string()),
    })
}

pub(crate) fn parse_nav_history(scheme_code: &str, body: &str) -> Result<NavSeries, FetchError> {
    let response: NavHistoryResponse = serde_json::from_str(body).map_err(|e| {
        FetchError::Malformed(format!("NAV history for scheme {scheme_code}: {e}"))
    })?;

    let total = response.data.len();
    let points: Vec<NavPoint> = response
        .data
        .iter()
        .filter_map(validate_nav_record)
        .collect();
    if points.len() < total {
        debug!(
            "Dropped {} malformed NAV records for scheme {}",
            total - points.len(),
            scheme_code
        );
    }
    Ok(NavSeries::new(points))
}

pub(crate) fn parse_catalog(body: &str, limit: usize) -> Result<Vec<SchemeRef>, FetchError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| FetchError::Malformed(format!("scheme catalog: {e}")))?;
    let records = value
        .as_array()
        .ok_or_else(|| FetchError::Malformed("scheme catalog is not an array".to_string()))?;

    Ok(records
        .iter()
        .take(limit)
        .filter_map(validate_scheme_record)
        .collect())
}

#[async_trait]
impl NavSource for MfApiProvider {
    async fn fetch_series(&self, scheme_code: &str) -> Result<NavSeries, FetchError> {
        let url = format!("{}/mf/{}", self.base_url, scheme_code);
        let body = self.get_text(&url).await?;
        let series = parse_nav_history(scheme_code, &body)?;
        debug!("Scheme {}: loaded {} NAV points", scheme_code, series.len());
        Ok(series)
    }
}

#[async_trait]
impl CatalogSource for MfApiProvider {
    async fn fetch_schemes(&self) -> Result<Vec<SchemeRef>, FetchError> {
        let url = format!("{}/mf", self.base_url);
        let body = self.get_text(&url).await?;
        parse_catalog(&body, self.catalog_limit)
    }
}
