//! Typed containers for Yahoo Finance payloads.

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

use crate::utils::{QuanterraError, Result};

fn date_partition(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y/%m/%d").to_string()
}

fn storage_path(data_type: &str, timestamp: &DateTime<Utc>, ticker: &str) -> String {
    format!(
        "yahoo_finance/{}/{}/{}.json.gz",
        data_type,
        date_partition(timestamp),
        ticker
    )
}

fn envelope(data: &Value, data_type: &str, timestamp: &DateTime<Utc>) -> Value {
    json!({
        "data": data,
        "metadata": {
            "data_type": data_type,
            "timestamp": timestamp.to_rfc3339(),
        },
    })
}

/// Company summary modules for one ticker, from the quoteSummary endpoint.
#[derive(Debug, Clone)]
pub struct TickerData {
    pub ticker: String,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl TickerData {
    /// Extracts the module payload from a raw quoteSummary response.
    pub fn from_summary(ticker: impl Into<String>, response: Value) -> Result<Self> {
        let ticker = ticker.into();
        let data = response
            .pointer("/quoteSummary/result/0")
            .cloned()
            .ok_or_else(|| QuanterraError::ProcessingError {
                message: format!("Quote summary response for {ticker} has no result"),
            })?;
        Ok(Self {
            ticker,
            data,
            timestamp: Utc::now(),
        })
    }

    pub fn to_json(&self) -> Value {
        envelope(&self.data, "tickers", &self.timestamp)
    }

    pub fn storage_path(&self) -> String {
        storage_path("tickers", &self.timestamp, &self.ticker)
    }
}

/// Daily price history for one ticker, as field series keyed by epoch
/// seconds.
#[derive(Debug, Clone)]
pub struct MarketData {
    pub ticker: String,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl MarketData {
    /// Reshapes a raw chart response into `{Open, High, Low, Close, Volume}`
    /// maps keyed by the bar's epoch-second timestamp. Bars with a null
    /// value are dropped from that field's series.
    pub fn from_chart(ticker: impl Into<String>, response: Value) -> Result<Self> {
        let ticker = ticker.into();
        let result = response
            .pointer("/chart/result/0")
            .ok_or_else(|| QuanterraError::ProcessingError {
                message: format!("Chart response for {ticker} has no result"),
            })?;

        let timestamps: Vec<i64> = result
            .get("timestamp")
            .and_then(Value::as_array)
            .map(|ts| ts.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default();
        let quote = result
            .pointer("/indicators/quote/0")
            .cloned()
            .unwrap_or(Value::Null);

        let fields = [
            ("Open", "open"),
            ("High", "high"),
            ("Low", "low"),
            ("Close", "close"),
            ("Volume", "volume"),
        ];
        let mut series = Map::new();
        for (label, key) in fields {
            let mut points = Map::new();
            if let Some(values) = quote.get(key).and_then(Value::as_array) {
                for (ts, value) in timestamps.iter().zip(values) {
                    if !value.is_null() {
                        points.insert(ts.to_string(), value.clone());
                    }
                }
            }
            series.insert(label.to_string(), Value::Object(points));
        }

        Ok(Self {
            ticker,
            data: Value::Object(series),
            timestamp: Utc::now(),
        })
    }

    pub fn to_json(&self) -> Value {
        envelope(&self.data, "market", &self.timestamp)
    }

    pub fn storage_path(&self) -> String {
        storage_path("market", &self.timestamp, &self.ticker)
    }
}
