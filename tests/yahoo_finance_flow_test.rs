use std::io::Read;

use flate2::read::GzDecoder;
use httpmock::prelude::*;
use serde_json::json;

use quanterra::config::{Environment, Settings};
use quanterra::flows::yahoo_finance;
use quanterra::lake::LakeClient;

fn settings_for(server: &MockServer, tickers: &str) -> Settings {
    let toml = format!(
        r#"
[lake]
bucket = "datalake-dev-bronze"
url = "memory:///"

[yahoo_finance]
base_url = "{}"
tickers = [{tickers}]

[retry]
max_attempts = 1
initial_backoff_secs = 0
max_backoff_secs = 0
"#,
        server.base_url()
    );
    Settings::from_toml_str(&toml, Environment::Dev).unwrap()
}

#[tokio::test]
async fn test_yahoo_finance_flow_end_to_end() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path_contains("/v10/finance/quoteSummary/")
            .query_param_exists("modules");
        then.status(200).json_body(json!({
            "quoteSummary": {"result": [{"price": {"shortName": "Fund"}}], "error": null}
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path_contains("/v8/finance/chart/");
        then.status(200).json_body(json!({
            "chart": {
                "result": [{
                    "timestamp": [1700000000],
                    "indicators": {"quote": [{"close": [1.25]}]}
                }],
                "error": null
            }
        }));
    });

    let settings = settings_for(&server, r#""0P0000XYZ1.L", "VUAG.L""#);
    let lake = LakeClient::in_memory("datalake-dev-bronze");

    let context = yahoo_finance::run(&settings, &lake).await.unwrap();

    assert!(context.all_succeeded());
    // Summary plus chart per ticker.
    assert_eq!(context.total_records_processed(), 4);

    let date = chrono::Utc::now().format("%Y/%m/%d");
    let stored = lake
        .fetch(&format!("yahoo_finance/market/{date}/VUAG.L.json.gz"))
        .await
        .unwrap();
    let mut decoder = GzDecoder::new(&stored[..]);
    let mut decoded = Vec::new();
    decoder.read_to_end(&mut decoded).unwrap();
    let envelope: serde_json::Value = serde_json::from_slice(&decoded).unwrap();

    // Chart arrays are reshaped into per-field series keyed by bar time.
    assert_eq!(envelope["data"]["Close"]["1700000000"], 1.25);
    assert_eq!(envelope["metadata"]["data_type"], "market");
}

#[tokio::test]
async fn test_yahoo_finance_flow_fails_on_unknown_ticker() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v10/finance/quoteSummary/NOPE.L");
        then.status(200)
            .json_body(json!({"quoteSummary": {"result": [], "error": null}}));
    });

    let settings = settings_for(&server, r#""NOPE.L""#);
    let lake = LakeClient::in_memory("datalake-dev-bronze");

    let err = yahoo_finance::run(&settings, &lake).await.unwrap_err();
    assert!(err.to_string().contains("yf_tickers"));
}
