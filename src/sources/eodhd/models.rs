//! Typed containers for EODHD API payloads.
//!
//! Every container wraps the raw JSON returned by the API together with the
//! capture timestamp, and knows how to render its own storage envelope and
//! bronze-layer path. Paths are partitioned by capture date so that daily
//! runs never overwrite each other.

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::utils::{QuanterraError, Result};

/// Instrument-level endpoints, in the order they are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstrumentDataType {
    Eod,
    Dividends,
    Splits,
    Fundamentals,
    News,
}

impl InstrumentDataType {
    pub const ALL: [InstrumentDataType; 5] = [
        InstrumentDataType::Eod,
        InstrumentDataType::Dividends,
        InstrumentDataType::Splits,
        InstrumentDataType::Fundamentals,
        InstrumentDataType::News,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InstrumentDataType::Eod => "eod",
            InstrumentDataType::Dividends => "dividends",
            InstrumentDataType::Splits => "splits",
            InstrumentDataType::Fundamentals => "fundamentals",
            InstrumentDataType::News => "news",
        }
    }
}

impl fmt::Display for InstrumentDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whole-exchange bulk endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BulkDataType {
    Eod,
    Dividends,
    Splits,
}

impl BulkDataType {
    pub const ALL: [BulkDataType; 3] = [
        BulkDataType::Eod,
        BulkDataType::Dividends,
        BulkDataType::Splits,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BulkDataType::Eod => "bulk_eod",
            BulkDataType::Dividends => "bulk_dividends",
            BulkDataType::Splits => "bulk_splits",
        }
    }
}

impl fmt::Display for BulkDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn date_partition(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y/%m/%d").to_string()
}

fn envelope(data: &Value, metadata: Value) -> Value {
    json!({
        "data": data,
        "metadata": metadata,
    })
}

fn string_codes<'a>(data: &'a Value, context: &str) -> Result<Vec<&'a str>> {
    let records = data
        .as_array()
        .ok_or_else(|| QuanterraError::ProcessingError {
            message: format!("{context} payload is not an array of records"),
        })?;
    Ok(records
        .iter()
        .filter_map(|record| record.get("Code").and_then(Value::as_str))
        .collect())
}

/// Response of the `exchanges-list` endpoint.
#[derive(Debug, Clone)]
pub struct ExchangeData {
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl ExchangeData {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Value {
        envelope(
            &self.data,
            json!({
                "data_type": "exchanges-list",
                "timestamp": self.timestamp.to_rfc3339(),
            }),
        )
    }

    pub fn storage_path(&self) -> String {
        format!("eodhd/exchanges-list/{}.json.gz", date_partition(&self.timestamp))
    }

    /// Exchange codes present in the payload, used to seed downstream
    /// symbol discovery.
    pub fn exchange_codes(&self) -> Result<Vec<String>> {
        Ok(string_codes(&self.data, "Exchange list")?
            .into_iter()
            .map(str::to_string)
            .collect())
    }
}

/// Response of the `exchange-symbol-list/{exchange}` endpoint.
#[derive(Debug, Clone)]
pub struct ExchangeSymbolData {
    pub exchange: String,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl ExchangeSymbolData {
    pub fn new(exchange: impl Into<String>, data: Value) -> Self {
        Self {
            exchange: exchange.into(),
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Value {
        envelope(
            &self.data,
            json!({
                "data_type": "exchange-symbol-list",
                "timestamp": self.timestamp.to_rfc3339(),
                "exchange": self.exchange,
            }),
        )
    }

    pub fn storage_path(&self) -> String {
        format!(
            "eodhd/exchange-symbol-list/{}/{}.json.gz",
            date_partition(&self.timestamp),
            self.exchange
        )
    }

    /// Fully qualified `CODE.EXCHANGE` symbols present in the payload.
    pub fn symbol_codes(&self) -> Result<Vec<String>> {
        Ok(string_codes(&self.data, "Exchange symbol list")?
            .into_iter()
            .map(|code| format!("{}.{}", code, self.exchange))
            .collect())
    }
}

/// Response of the `eod-bulk-last-day/{exchange}` endpoint.
#[derive(Debug, Clone)]
pub struct ExchangeBulkData {
    pub exchange: String,
    pub data_type: BulkDataType,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl ExchangeBulkData {
    pub fn new(exchange: impl Into<String>, data_type: BulkDataType, data: Value) -> Self {
        Self {
            exchange: exchange.into(),
            data_type,
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Value {
        envelope(
            &self.data,
            json!({
                "data_type": self.data_type.as_str(),
                "timestamp": self.timestamp.to_rfc3339(),
                "exchange": self.exchange,
            }),
        )
    }

    pub fn storage_path(&self) -> String {
        format!(
            "eodhd/{}/{}/{}.json.gz",
            self.data_type,
            date_partition(&self.timestamp),
            self.exchange
        )
    }
}

/// Response of an instrument-level endpoint for one `CODE.EXCHANGE` pair.
#[derive(Debug, Clone)]
pub struct InstrumentData {
    pub code: String,
    pub exchange: String,
    pub data_type: InstrumentDataType,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl InstrumentData {
    pub fn new(
        code: impl Into<String>,
        exchange: impl Into<String>,
        data_type: InstrumentDataType,
        data: Value,
    ) -> Self {
        Self {
            code: code.into(),
            exchange: exchange.into(),
            data_type,
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Value {
        envelope(
            &self.data,
            json!({
                "data_type": self.data_type.as_str(),
                "timestamp": self.timestamp.to_rfc3339(),
                "code": self.code,
                "exchange": self.exchange,
            }),
        )
    }

    pub fn storage_path(&self) -> String {
        format!(
            "eodhd/{}/{}/{}/{}.json.gz",
            self.data_type,
            date_partition(&self.timestamp),
            self.exchange,
            self.code
        )
    }
}

/// Response of the `macro-indicator/{iso_code}` endpoint.
#[derive(Debug, Clone)]
pub struct MacroData {
    pub iso_code: String,
    pub indicator: String,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl MacroData {
    pub fn new(iso_code: impl Into<String>, indicator: impl Into<String>, data: Value) -> Self {
        Self {
            iso_code: iso_code.into(),
            indicator: indicator.into(),
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Value {
        envelope(
            &self.data,
            json!({
                "data_type": "macro-indicators",
                "timestamp": self.timestamp.to_rfc3339(),
                "iso_code": self.iso_code,
                "indicator": self.indicator,
            }),
        )
    }

    pub fn storage_path(&self) -> String {
        format!(
            "eodhd/macro-indicators/{}/{}/{}.json.gz",
            date_partition(&self.timestamp),
            self.iso_code,
            self.indicator
        )
    }
}

/// Response of the `economic-events` endpoint.
#[derive(Debug, Clone)]
pub struct EconomicEventData {
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl EconomicEventData {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Value {
        envelope(
            &self.data,
            json!({
                "data_type": "economic-events",
                "timestamp": self.timestamp.to_rfc3339(),
            }),
        )
    }

    pub fn storage_path(&self) -> String {
        format!(
            "eodhd/economic-events/{}.json.gz",
            date_partition(&self.timestamp)
        )
    }
}
