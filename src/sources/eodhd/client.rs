//! Thin HTTP client for the EODHD REST API.
//!
//! Every call goes through [`EodhdClient::get_json`], which appends the
//! `api_token` and `fmt=json` query parameters, enforces the request
//! timeout and retries transient failures with the shared backoff policy.

use std::time::Duration;

use serde_json::Value;

use crate::config::EodhdSettings;
use crate::utils::retry::{retry_request, RetryConfig};
use crate::utils::{QuanterraError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct EodhdClient {
    http: reqwest::Client,
    api_token: String,
    base_url: String,
    retry: RetryConfig,
}

impl EodhdClient {
    pub fn new(settings: &EodhdSettings, retry: RetryConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_token: settings.api_token.expose().to_string(),
            base_url: settings.base_url.clone(),
            retry,
        })
    }

    async fn get_json(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        retry_request(&self.retry, || async {
            let response = self
                .http
                .get(&url)
                .query(&[("api_token", self.api_token.as_str()), ("fmt", "json")])
                .query(params)
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(QuanterraError::ApiStatusError {
                    status: response.status().as_u16(),
                    url: url.clone(),
                });
            }
            Ok(response.json::<Value>().await?)
        })
        .await
    }

    pub async fn get_exchanges(&self) -> Result<Value> {
        self.get_json("exchanges-list", &[]).await
    }

    pub async fn get_exchange_symbols(&self, exchange: &str) -> Result<Value> {
        self.get_json(&format!("exchange-symbol-list/{exchange}"), &[])
            .await
    }

    pub async fn get_eod_data(&self, code: &str, exchange: &str) -> Result<Value> {
        self.get_json(&format!("eod/{code}.{exchange}"), &[]).await
    }

    pub async fn get_dividends(&self, code: &str, exchange: &str) -> Result<Value> {
        self.get_json(&format!("div/{code}.{exchange}"), &[]).await
    }

    pub async fn get_splits(&self, code: &str, exchange: &str) -> Result<Value> {
        self.get_json(&format!("splits/{code}.{exchange}"), &[])
            .await
    }

    pub async fn get_fundamentals(&self, code: &str, exchange: &str) -> Result<Value> {
        self.get_json(&format!("fundamentals/{code}.{exchange}"), &[])
            .await
    }

    pub async fn get_news(&self, code: &str, exchange: &str) -> Result<Value> {
        let symbol = format!("{code}.{exchange}");
        self.get_json("news", &[("s", symbol.as_str())]).await
    }

    pub async fn get_bulk_eod(&self, exchange: &str) -> Result<Value> {
        self.get_json(&format!("eod-bulk-last-day/{exchange}"), &[])
            .await
    }

    pub async fn get_bulk_dividends(&self, exchange: &str) -> Result<Value> {
        self.get_json(
            &format!("eod-bulk-last-day/{exchange}"),
            &[("type", "dividends")],
        )
        .await
    }

    pub async fn get_bulk_splits(&self, exchange: &str) -> Result<Value> {
        self.get_json(
            &format!("eod-bulk-last-day/{exchange}"),
            &[("type", "splits")],
        )
        .await
    }

    pub async fn get_macro_indicator(&self, iso_code: &str, indicator: &str) -> Result<Value> {
        self.get_json(
            &format!("macro-indicator/{iso_code}"),
            &[("indicator", indicator)],
        )
        .await
    }

    /// Economic calendar for the coming window, capped at 1000 events per
    /// the API maximum.
    pub async fn get_economic_events(&self) -> Result<Value> {
        self.get_json("economic-events", &[("limit", "1000")]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn test_settings(base_url: String) -> EodhdSettings {
        EodhdSettings {
            api_token: crate::config::ApiToken::new("test-token"),
            base_url,
            ..Default::default()
        }
    }

    fn no_backoff() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_backoff_secs: 0,
            max_backoff_secs: 0,
        }
    }

    fn client_for(server: &MockServer) -> EodhdClient {
        EodhdClient::new(&test_settings(format!("{}/", server.base_url())), no_backoff()).unwrap()
    }

    #[tokio::test]
    async fn test_get_exchanges_sends_token_and_format() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/exchanges-list")
                .query_param("api_token", "test-token")
                .query_param("fmt", "json");
            then.status(200).json_body(json!([{"Code": "LSE"}]));
        });

        let client = client_for(&server);
        let data = client.get_exchanges().await.unwrap();

        mock.assert();
        assert_eq!(data[0]["Code"], "LSE");
    }

    #[tokio::test]
    async fn test_bulk_dividends_sends_type_param() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/eod-bulk-last-day/US")
                .query_param("type", "dividends")
                .query_param("fmt", "json");
            then.status(200).json_body(json!([]));
        });

        let client = client_for(&server);
        client.get_bulk_dividends("US").await.unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_macro_indicator_sends_indicator_param() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/macro-indicator/GBR")
                .query_param("indicator", "gdp_current_usd");
            then.status(200).json_body(json!([]));
        });

        let client = client_for(&server);
        client
            .get_macro_indicator("GBR", "gdp_current_usd")
            .await
            .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_server_error_is_retried_then_surfaced() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/exchanges-list");
            then.status(500);
        });

        let client = client_for(&server);
        let err = client.get_exchanges().await.unwrap_err();

        mock.assert_hits(3);
        match err {
            QuanterraError::ApiStatusError { status, .. } => assert_eq!(status, 500),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let server = MockServer::start();
        let mut failing = server.mock(|when, then| {
            when.method(GET).path("/economic-events");
            then.status(502);
        });

        let client = client_for(&server);
        let first = client.get_economic_events().await;
        assert!(first.is_err());
        failing.assert_hits(3);

        failing.delete();
        server.mock(|when, then| {
            when.method(GET).path("/economic-events");
            then.status(200).json_body(json!([{"type": "cpi"}]));
        });

        let data = client.get_economic_events().await.unwrap();
        assert_eq!(data[0]["type"], "cpi");
    }
}
