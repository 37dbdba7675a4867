//! Thin HTTP client for the OANDA v3 REST API.
//!
//! OANDA authenticates with a bearer token header rather than query
//! parameters. Requests share the timeout and retry policy of the other
//! source clients.

use std::time::Duration;

use serde_json::Value;

use crate::config::OandaSettings;
use crate::utils::retry::{retry_request, RetryConfig};
use crate::utils::{QuanterraError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct OandaClient {
    http: reqwest::Client,
    api_token: String,
    base_url: String,
    account_id: String,
    retry: RetryConfig,
}

impl OandaClient {
    pub fn new(settings: &OandaSettings, retry: RetryConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_token: settings.api_token.expose().to_string(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            account_id: settings.account_id.clone(),
            retry,
        })
    }

    async fn get_json(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, endpoint);
        retry_request(&self.retry, || async {
            let response = self
                .http
                .get(&url)
                .bearer_auth(&self.api_token)
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

    pub async fn get_instruments(&self) -> Result<Value> {
        self.get_json(&format!("accounts/{}/instruments", self.account_id), &[])
            .await
    }

    pub async fn get_candles(
        &self,
        instrument: &str,
        granularity: &str,
        count: usize,
        price: &str,
    ) -> Result<Value> {
        let count = count.to_string();
        self.get_json(
            &format!("instruments/{instrument}/candles"),
            &[
                ("granularity", granularity),
                ("count", count.as_str()),
                ("price", price),
            ],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiToken;
    use httpmock::prelude::*;
    use serde_json::json;

    fn test_settings(base_url: String) -> OandaSettings {
        OandaSettings {
            api_token: ApiToken::new("oanda-token"),
            account_id: "001-004-1234567-001".to_string(),
            base_url,
            ..Default::default()
        }
    }

    fn no_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 1,
            initial_backoff_secs: 0,
            max_backoff_secs: 0,
        }
    }

    #[tokio::test]
    async fn test_get_instruments_uses_bearer_auth() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/accounts/001-004-1234567-001/instruments")
                .header("authorization", "Bearer oanda-token");
            then.status(200)
                .json_body(json!({"instruments": [{"name": "EUR_USD"}]}));
        });

        let client = OandaClient::new(&test_settings(server.base_url()), no_retry()).unwrap();
        let data = client.get_instruments().await.unwrap();

        mock.assert();
        assert_eq!(data["instruments"][0]["name"], "EUR_USD");
    }

    #[tokio::test]
    async fn test_get_candles_sends_query_params() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/instruments/EUR_USD/candles")
                .query_param("granularity", "D")
                .query_param("count", "50")
                .query_param("price", "MBA");
            then.status(200).json_body(json!({"candles": []}));
        });

        let client = OandaClient::new(&test_settings(server.base_url()), no_retry()).unwrap();
        client.get_candles("EUR_USD", "D", 50, "MBA").await.unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_error_status_is_surfaced() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path_contains("/instruments");
            then.status(401);
        });

        let client = OandaClient::new(&test_settings(server.base_url()), no_retry()).unwrap();
        let err = client.get_instruments().await.unwrap_err();

        match err {
            QuanterraError::ApiStatusError { status, .. } => assert_eq!(status, 401),
            other => panic!("unexpected error: {other}"),
        }
    }
}
