//! Scheme metadata supplied by a static list or a remote catalog.

use crate::core::error::FetchError;
use crate::core::risk::{RiskTier, classify};
use crate::providers::util::{RetryPolicy, with_retry};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const UNKNOWN: &str = "Unknown";

fn unknown() -> String {
    UNKNOWN.to_string()
}

/// Identifies a fund scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemeRef {
    pub code: String,
    pub name: String,
    #[serde(default = "unknown")]
    pub category: String,
    #[serde(default = "unknown")]
    pub amc: String,
}

impl SchemeRef {
    pub fn new(code: &str, name: &str, category: &str, amc: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            amc: amc.to_string(),
        }
    }

    /// Placeholder for a code that is not in any catalog.
    pub fn bare(code: &str) -> Self {
        Self::new(code, code, UNKNOWN, UNKNOWN)
    }

    pub fn risk(&self) -> RiskTier {
        classify(&self.category)
    }
}

/// A named group of schemes, as shown on category screens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeCategory {
    pub name: String,
    #[serde(default)]
    pub schemes: Vec<SchemeRef>,
}

/// Looks up a scheme by code across all categories.
pub fn find_scheme<'a>(categories: &'a [SchemeCategory], code: &str) -> Option<&'a SchemeRef> {
    categories
        .iter()
        .flat_map(|c| c.schemes.iter())
        .find(|s| s.code == code)
}

/// Looks up a category by name, case-insensitively.
pub fn find_category<'a>(
    categories: &'a [SchemeCategory],
    name: &str,
) -> Option<&'a SchemeCategory> {
    categories
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name))
}

/// Every scheme in catalog order, each code listed once.
pub fn all_schemes(categories: &[SchemeCategory]) -> Vec<SchemeRef> {
    let mut seen = std::collections::HashSet::new();
    categories
        .iter()
        .flat_map(|c| c.schemes.iter())
        .filter(|s| seen.insert(s.code.clone()))
        .cloned()
        .collect()
}

#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_schemes(&self) -> Result<Vec<SchemeRef>, FetchError>;
}

/// Fetches the remote catalog under `policy`. Exhausted retries or a malformed
/// response yield an empty list, which callers must treat as "unavailable".
pub async fn load_catalog(source: &dyn CatalogSource, policy: &RetryPolicy) -> Vec<SchemeRef> {
    match with_retry(|| source.fetch_schemes(), policy).await {
        Ok(schemes) => {
            debug!("Loaded {} schemes from catalog", schemes.len());
            schemes
        }
        Err(e) => {
            warn!("Scheme catalog unavailable: {}", e);
            Vec::new()
        }
    }
}
