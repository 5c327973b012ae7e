pub mod cli;
pub mod core;
pub mod providers;

use crate::core::analytics::FundAnalytics;
use crate::core::candles::BucketOrder;
use crate::core::catalog::{SchemeRef, all_schemes, find_category, find_scheme};
use crate::core::clock::SystemClock;
use crate::core::config::AppConfig;
use crate::core::period::ReturnPeriod;
use crate::providers::mfapi_provider::MfApiProvider;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub enum AppCommand {
    Returns { codes: Vec<String> },
    Candles {
        code: String,
        window: ReturnPeriod,
        chronological: bool,
    },
    Catalog { remote: bool },
    Category { name: String },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("navlens starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Returns { codes } => {
            let schemes = if codes.is_empty() {
                all_schemes(&config.categories)
            } else {
                codes
                    .iter()
                    .map(|code| resolve_scheme(&config, code))
                    .collect()
            };
            let analytics = build_analytics(&config)?;
            cli::returns::run(&analytics, &schemes).await
        }
        AppCommand::Candles {
            code,
            window,
            chronological,
        } => {
            let order = if chronological {
                BucketOrder::Chronological
            } else {
                BucketOrder::Encounter
            };
            let scheme = resolve_scheme(&config, &code);
            let analytics = build_analytics(&config)?;
            cli::candles::run(&analytics, &scheme, window, order).await
        }
        AppCommand::Catalog { remote: false } => cli::catalog::run_static(&config.categories),
        AppCommand::Catalog { remote: true } => {
            let policy = config.fetch.catalog_policy();
            let provider = build_provider(&config, policy.timeout)?;
            cli::catalog::run_remote(&provider, &policy).await
        }
        AppCommand::Category { name } => {
            let category = find_category(&config.categories, &name)
                .with_context(|| format!("Unknown category: {name}"))?;
            let analytics = build_analytics(&config)?;
            cli::category::run(&analytics, category).await
        }
    }
}

fn resolve_scheme(config: &AppConfig, code: &str) -> SchemeRef {
    find_scheme(&config.categories, code)
        .cloned()
        .unwrap_or_else(|| SchemeRef::bare(code))
}

/// The mfapi client, with each request bounded by `timeout`.
fn build_provider(config: &AppConfig, timeout: Duration) -> Result<MfApiProvider> {
    let provider = MfApiProvider::new(&config.providers.mfapi.base_url)
        .context("Failed to create NAV history client")?
        .with_timeout(timeout)
        .with_catalog_limit(config.fetch.catalog_limit);
    Ok(provider)
}

/// Wires the NAV client, series cache and system clock into an analytics service.
pub fn build_analytics(config: &AppConfig) -> Result<FundAnalytics> {
    let settings = config.analytics_settings();
    let provider = build_provider(config, settings.retry.timeout)?;
    Ok(FundAnalytics::new(
        Arc::new(provider),
        Arc::new(config.cache.build()),
        Arc::new(SystemClock),
        settings,
    ))
}
