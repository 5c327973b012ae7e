use chrono::{Duration, Months, NaiveDate, Utc};
use navlens::core::candles::BucketOrder;
use navlens::core::config::AppConfig;
use navlens::core::error::FetchError;
use navlens::core::period::ReturnPeriod;
use navlens::core::risk::RiskTier;
use std::fs;
use tempfile::NamedTempFile;
use tracing::info;

mod test_utils {
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Serves `body` for one scheme's NAV history, expecting `calls` requests.
    pub async fn mount_history(
        server: &MockServer,
        code: &str,
        status: u16,
        body: &str,
        calls: u64,
    ) {
        Mock::given(method("GET"))
            .and(path(format!("/mf/{code}")))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .expect(calls)
            .mount(server)
            .await;
    }

    /// Serves `body` only after `delay`, expecting a single request.
    pub async fn mount_slow_history(server: &MockServer, code: &str, body: &str, delay: Duration) {
        Mock::given(method("GET"))
            .and(path(format!("/mf/{code}")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(body)
                    .set_delay(delay),
            )
            .expect(1)
            .mount(server)
            .await;
    }

    pub async fn mount_catalog(server: &MockServer, body: &str) {
        Mock::given(method("GET"))
            .and(path("/mf"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(server)
            .await;
    }
}

/// Daily NAVs for the last `days` days, newest first, growing 0.05% a day.
fn history_body(days: i64) -> String {
    let today = Utc::now().date_naive();
    let data: Vec<serde_json::Value> = (0..days)
        .map(|i| {
            serde_json::json!({
                "date": (today - Duration::days(i)).format("%d-%m-%Y").to_string(),
                "nav": format!("{:.4}", served_nav(days, i)),
            })
        })
        .collect();
    serde_json::json!({
        "meta": {"scheme_code": 120828, "fund_house": "Quant Mutual Fund"},
        "data": data,
        "status": "SUCCESS"
    })
    .to_string()
}

/// NAV served for the day `days_ago` in a [`history_body`] of `days` entries.
fn served_nav(days: i64, days_ago: i64) -> f64 {
    let nav = 100.0 * 1.0005_f64.powi((days - days_ago) as i32);
    format!("{nav:.4}").parse().unwrap()
}

fn one_year_back(today: NaiveDate) -> NaiveDate {
    today.checked_sub_months(Months::new(12)).unwrap()
}

fn write_config(base_url: &str) -> NamedTempFile {
    let config = format!(
        r#"
providers:
  mfapi:
    base_url: "{base_url}"
fetch:
  attempts: 3
  retry_delay_ms: 10
  fund_timeout_secs: 5
  max_in_flight: 2
categories:
  - name: "Equity Leaders"
    schemes:
      - {{ code: "120828", name: "Quant Small Cap Fund", category: "Small Cap", amc: "Quant" }}
      - {{ code: "119063", name: "Nippon India Small Cap", category: "Small Cap", amc: "Nippon" }}
"#
    );
    let file = NamedTempFile::new().expect("Failed to create temp config file");
    fs::write(file.path(), config).expect("Failed to write temp config file");
    file
}

#[test_log::test(tokio::test)]
async fn test_returns_for_configured_schemes() {
    let mock_server = wiremock::MockServer::start().await;
    test_utils::mount_history(&mock_server, "120828", 200, &history_body(800), 1).await;
    test_utils::mount_history(&mock_server, "119063", 200, &history_body(200), 1).await;
    let config = write_config(&mock_server.uri());

    let result = navlens::run_command(
        navlens::AppCommand::Returns { codes: vec![] },
        config.path().to_str(),
    )
    .await;

    info!(?result, "Returns command finished");
    assert!(result.is_ok(), "Returns command failed: {result:?}");
}

#[test_log::test(tokio::test)]
async fn test_failing_scheme_is_retried_then_reported_unavailable() {
    let mock_server = wiremock::MockServer::start().await;
    test_utils::mount_history(&mock_server, "999999", 503, "Service Unavailable", 3).await;
    let config = write_config(&mock_server.uri());

    let result = navlens::run_command(
        navlens::AppCommand::Returns {
            codes: vec!["999999".to_string()],
        },
        config.path().to_str(),
    )
    .await;

    // An unavailable scheme renders as N/A rather than failing the command
    assert!(result.is_ok());
}

#[test_log::test(tokio::test)]
async fn test_candles_for_unlisted_scheme() {
    let mock_server = wiremock::MockServer::start().await;
    test_utils::mount_history(&mock_server, "120716", 200, &history_body(400), 1).await;
    let config = write_config(&mock_server.uri());

    let result = navlens::run_command(
        navlens::AppCommand::Candles {
            code: "120716".to_string(),
            window: ReturnPeriod::OneYear,
            chronological: true,
        },
        config.path().to_str(),
    )
    .await;

    assert!(result.is_ok(), "Candles command failed: {result:?}");
}

#[test_log::test(tokio::test)]
async fn test_candles_propagate_malformed_history() {
    let mock_server = wiremock::MockServer::start().await;
    // Malformed bodies are not retried
    test_utils::mount_history(&mock_server, "120828", 200, "<html>maintenance</html>", 1).await;
    let config = write_config(&mock_server.uri());

    let result = navlens::run_command(
        navlens::AppCommand::Candles {
            code: "120828".to_string(),
            window: ReturnPeriod::AllTime,
            chronological: false,
        },
        config.path().to_str(),
    )
    .await;

    let err = result.unwrap_err();
    assert!(err.to_string().contains("malformed response"));
}

#[test_log::test(tokio::test)]
async fn test_category_fetches_each_scheme_once() {
    let mock_server = wiremock::MockServer::start().await;
    test_utils::mount_history(&mock_server, "120828", 200, &history_body(1200), 1).await;
    test_utils::mount_history(&mock_server, "119063", 200, &history_body(30), 1).await;
    let config = write_config(&mock_server.uri());

    let result = navlens::run_command(
        navlens::AppCommand::Category {
            name: "equity leaders".to_string(),
        },
        config.path().to_str(),
    )
    .await;

    assert!(result.is_ok(), "Category command failed: {result:?}");
}

#[test_log::test(tokio::test)]
async fn test_unknown_category_is_an_error() {
    let config = write_config("http://127.0.0.1:9");

    let result = navlens::run_command(
        navlens::AppCommand::Category {
            name: "Gold".to_string(),
        },
        config.path().to_str(),
    )
    .await;

    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("Unknown category: Gold")
    );
}

#[test_log::test(tokio::test)]
async fn test_remote_catalog() {
    let mock_server = wiremock::MockServer::start().await;
    test_utils::mount_catalog(
        &mock_server,
        r#"[
            {"schemeCode": 120828, "schemeName": "Quant Small Cap Fund", "schemeCategory": "Small Cap", "fundHouse": "Quant"},
            {"schemeCode": 119063}
        ]"#,
    )
    .await;
    let config = write_config(&mock_server.uri());

    let result = navlens::run_command(
        navlens::AppCommand::Catalog { remote: true },
        config.path().to_str(),
    )
    .await;

    assert!(result.is_ok());
}

#[test_log::test(tokio::test)]
async fn test_static_catalog_needs_no_network() {
    let config = write_config("http://127.0.0.1:9");

    let result = navlens::run_command(
        navlens::AppCommand::Catalog { remote: false },
        config.path().to_str(),
    )
    .await;

    assert!(result.is_ok());
}

#[test_log::test(tokio::test)]
async fn test_missing_config_file() {
    let result = navlens::run_command(
        navlens::AppCommand::Catalog { remote: false },
        Some("/nonexistent/navlens/config.yaml"),
    )
    .await;

    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("Failed to read config file")
    );
}

#[test]
fn test_setup_writes_loadable_config() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("config.yaml");
    let path_str = path.to_str().expect("temp path is not UTF-8");

    navlens::cli::setup::setup(Some(path_str)).expect("setup failed");
    let config = AppConfig::load_from_path(&path).expect("load failed");

    assert!(!config.categories.is_empty());
    assert!(navlens::cli::setup::setup(Some(path_str)).is_err());
}

#[test_log::test(tokio::test)]
async fn test_one_year_return_matches_served_history() {
    let mock_server = wiremock::MockServer::start().await;
    test_utils::mount_history(&mock_server, "120828", 200, &history_body(800), 1).await;
    let config_file = write_config(&mock_server.uri());
    let config = AppConfig::load_from_path(config_file.path()).unwrap();
    let analytics = navlens::build_analytics(&config).unwrap();

    let period = ReturnPeriod::OneYear;
    let result = analytics.period_return("120828", period).await;

    let today = analytics.today();
    let days_back = (today - one_year_back(today)).num_days();
    let start = served_nav(800, days_back);
    let end = served_nav(800, 0);
    let expected = (end - start) / start * 100.0;
    info!(?result, expected, "One year return");
    assert!((result.percent.unwrap() - expected).abs() < 1e-9);
    assert!(result.annualized.is_some());
    assert_eq!(result.period_months, 12);
}

#[test_log::test(tokio::test)]
async fn test_monthly_candles_from_served_history() {
    let mock_server = wiremock::MockServer::start().await;
    test_utils::mount_history(&mock_server, "120828", 200, &history_body(800), 1).await;
    let config_file = write_config(&mock_server.uri());
    let config = AppConfig::load_from_path(config_file.path()).unwrap();
    let analytics = navlens::build_analytics(&config).unwrap();

    let candles = analytics
        .candles("120828", ReturnPeriod::OneYear, BucketOrder::Chronological)
        .await
        .unwrap();

    let today = analytics.today();
    let last_month = today.checked_sub_months(Months::new(1)).unwrap();
    assert_eq!(candles.len(), 12);
    assert_eq!(candles[11].label, last_month.format("%b %y").to_string());
    for candle in &candles {
        // the served NAV rises every day
        assert!(candle.open < candle.close, "{candle:?}");
        assert_eq!(candle.low, candle.open);
        assert_eq!(candle.high, candle.close);
    }
}

#[test_log::test(tokio::test)]
async fn test_short_history_snapshot() {
    let mock_server = wiremock::MockServer::start().await;
    test_utils::mount_history(&mock_server, "119063", 200, &history_body(30), 1).await;
    let config_file = write_config(&mock_server.uri());
    let config = AppConfig::load_from_path(config_file.path()).unwrap();
    let analytics = navlens::build_analytics(&config).unwrap();
    let scheme = config.categories[0].schemes[1].clone();

    let snapshot = analytics.snapshot(&scheme).await;

    assert_eq!(snapshot.latest_nav, Some(served_nav(30, 0)));
    assert_eq!(snapshot.latest_date, Some(analytics.today()));
    // a month of data has nothing near the one-year anchor
    assert_eq!(snapshot.one_year_near, None);
    // trailing returns fall back to the oldest observation
    let start = served_nav(30, 29);
    let expected = (served_nav(30, 0) - start) / start * 100.0;
    let one_year = snapshot.percent(ReturnPeriod::OneYear).unwrap();
    assert!((one_year - expected).abs() < 1e-9);
    assert_eq!(snapshot.risk, RiskTier::VeryHigh);
}

#[test_log::test(tokio::test)]
async fn test_slow_history_times_out_with_configured_limit() {
    let mock_server = wiremock::MockServer::start().await;
    let delay = std::time::Duration::from_secs(3);
    test_utils::mount_slow_history(&mock_server, "120828", &history_body(10), delay).await;
    let config_file = write_config(&mock_server.uri());
    let mut config = AppConfig::load_from_path(config_file.path()).unwrap();
    config.fetch.attempts = 1;
    config.fetch.fund_timeout_secs = 1;
    let analytics = navlens::build_analytics(&config).unwrap();

    let result = analytics.series("120828").await;

    let limit = std::time::Duration::from_secs(1);
    assert_eq!(result.unwrap_err(), FetchError::Timeout(limit));
}
