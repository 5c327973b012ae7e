use crate::core::analytics::AnalyticsSettings;
use crate::core::cache::SeriesCache;
use crate::core::catalog::SchemeCategory;
use crate::core::returns::NEAR_DATE_TOLERANCE_DAYS;
use crate::providers::mfapi_provider::{DEFAULT_BASE_URL, DEFAULT_CATALOG_LIMIT};
use crate::providers::util::RetryPolicy;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MfApiProviderConfig {
    pub base_url: String,
}

impl Default for MfApiProviderConfig {
    fn default() -> Self {
        MfApiProviderConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub mfapi: MfApiProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct FetchConfig {
    /// Total attempts per request, including the first.
    pub attempts: usize,
    pub retry_delay_ms: u64,
    pub fund_timeout_secs: u64,
    pub catalog_timeout_secs: u64,
    pub max_in_flight: usize,
    pub catalog_limit: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            attempts: 3,
            retry_delay_ms: 1000,
            fund_timeout_secs: 8,
            catalog_timeout_secs: 15,
            max_in_flight: 4,
            catalog_limit: DEFAULT_CATALOG_LIMIT,
        }
    }
}

impl FetchConfig {
    pub fn fund_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.attempts,
            Duration::from_millis(self.retry_delay_ms),
            Duration::from_secs(self.fund_timeout_secs),
        )
    }

    pub fn catalog_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.attempts,
            Duration::from_millis(self.retry_delay_ms),
            Duration::from_secs(self.catalog_timeout_secs),
        )
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct CacheConfig {
    /// Maximum number of cached series; unbounded when absent.
    #[serde(default)]
    pub capacity: Option<usize>,
}

impl CacheConfig {
    pub fn build(&self) -> SeriesCache {
        match self.capacity {
            Some(capacity) => SeriesCache::bounded(capacity),
            None => SeriesCache::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ReturnsConfig {
    pub near_tolerance_days: i64,
}

impl Default for ReturnsConfig {
    fn default() -> Self {
        ReturnsConfig {
            near_tolerance_days: NEAR_DATE_TOLERANCE_DAYS,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub returns: ReturnsConfig,
    pub categories: Vec<SchemeCategory>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "navlens", "navlens")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn analytics_settings(&self) -> AnalyticsSettings {
        AnalyticsSettings {
            retry: self.fetch.fund_policy(),
            max_in_flight: self.fetch.max_in_flight,
            near_tolerance_days: self.returns.near_tolerance_days,
        }
    }
}
