use assert_cmd::Command;
use httpmock::{Method::POST, MockServer};
use predicates::prelude::*;

fn cmd() -> Command {
    let mut c = Command::cargo_bin("sanbase-client").unwrap();
    c.env_remove("SANBASE_API_KEY").arg("--log-level").arg("warn");
    c
}

#[test]
fn metrics_lists_vocabularies() {
    cmd()
        .arg("metrics")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"ohlcv\""))
        .stdout(predicate::str::contains("\"mvrv_usd\""))
        .stdout(predicate::str::contains("\"top_social_gainers_losers\""));
}

#[test]
fn get_prints_csv() -> anyhow::Result<()> {
    let server = MockServer::start();
    let _m = server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .body_contains("getMetric");
        then.status(200).json_body(serde_json::json!({
            "data": {"query_0": {"timeseriesData": [
                {"datetime": "2020-01-01T00:00:00Z", "value": 3}
            ]}}
        }));
    });
    cmd()
        .env("SANBASE_GRAPHQL_URL", format!("{}/graphql", server.base_url()))
        .args([
            "get",
            "dev_activity",
            "--selector",
            r#"{"organization":"ethereum"}"#,
            "--from",
            "utc_now-60d",
            "--to",
            "utc_now-40d",
            "--format",
            "csv",
        ])
        .assert()
        .success()
        .stdout("datetime,value\n2020-01-01T00:00:00Z,3\n");
    Ok(())
}

#[test]
fn get_without_selector_fails() {
    cmd()
        .env("SANBASE_GRAPHQL_URL", "http://127.0.0.1:9/graphql")
        .args(["get", "dev_activity"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid call of the get function"));
}

#[test]
fn invalid_url_is_a_config_error() {
    cmd()
        .env("SANBASE_GRAPHQL_URL", "not a url")
        .arg("calls-made")
        .assert()
        .failure()
        .stderr(predicate::str::contains("SANBASE_GRAPHQL_URL"));
}
