//! Thin HTTP client for the public Yahoo Finance endpoints.
//!
//! Yahoo serves these without credentials but rejects the default reqwest
//! user agent, so every request identifies itself as `quanterra/1.0`.

use std::time::Duration;

use serde_json::Value;

use crate::config::YahooFinanceSettings;
use crate::utils::retry::{retry_request, RetryConfig};
use crate::utils::{QuanterraError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = "quanterra/1.0";

/// Modules requested from the quoteSummary endpoint: profile, headline
/// numbers and the three financial statements.
const SUMMARY_MODULES: &str = "assetProfile,summaryDetail,price,defaultKeyStatistics,\
financialData,balanceSheetHistory,cashflowStatementHistory,incomeStatementHistory";

#[derive(Debug, Clone)]
pub struct YahooFinanceClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryConfig,
}

impl YahooFinanceClient {
    pub fn new(settings: &YahooFinanceSettings, retry: RetryConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    async fn get_json(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, endpoint);
        retry_request(&self.retry, || async {
            let response = self.http.get(&url).query(params).send().await?;
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

    /// Raw quoteSummary response for one ticker.
    pub async fn get_ticker_summary(&self, ticker: &str) -> Result<Value> {
        self.get_json(
            &format!("v10/finance/quoteSummary/{ticker}"),
            &[("modules", SUMMARY_MODULES)],
        )
        .await
    }

    /// Raw chart response for one ticker over the given window.
    pub async fn get_chart(&self, ticker: &str, range: &str, interval: &str) -> Result<Value> {
        self.get_json(
            &format!("v8/finance/chart/{ticker}"),
            &[
                ("range", range),
                ("interval", interval),
                ("events", "div,split"),
            ],
        )
        .await
    }
}
