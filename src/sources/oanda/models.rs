//! Typed containers for OANDA API payloads.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::utils::{QuanterraError, Result};

fn date_partition(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y/%m/%d").to_string()
}

/// Response of the account instruments endpoint.
#[derive(Debug, Clone)]
pub struct InstrumentsData {
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl InstrumentsData {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "data": self.data,
            "metadata": {
                "data_type": "instruments-list",
                "timestamp": self.timestamp.to_rfc3339(),
            },
        })
    }

    pub fn storage_path(&self) -> String {
        format!(
            "oanda/instruments-list/{}.json.gz",
            date_partition(&self.timestamp)
        )
    }

    /// Instrument names present in the payload, used to seed candle
    /// ingestion.
    pub fn instrument_names(&self) -> Result<Vec<String>> {
        if !self.data.is_object() {
            return Err(QuanterraError::ProcessingError {
                message: "Instruments payload is not an object".to_string(),
            });
        }
        Ok(self
            .data
            .get("instruments")
            .and_then(Value::as_array)
            .map(|instruments| {
                instruments
                    .iter()
                    .filter_map(|inst| inst.get("name").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Response of the candles endpoint for one instrument.
#[derive(Debug, Clone)]
pub struct CandlesData {
    pub instrument: String,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl CandlesData {
    pub fn new(instrument: impl Into<String>, data: Value) -> Self {
        Self {
            instrument: instrument.into(),
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "data": self.data,
            "metadata": {
                "data_type": "candles",
                "timestamp": self.timestamp.to_rfc3339(),
                "instrument": self.instrument,
            },
        })
    }

    pub fn storage_path(&self) -> String {
        format!(
            "oanda/candles/{}/{}.json.gz",
            date_partition(&self.timestamp),
            self.instrument
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_instrument_names_extracted_from_payload() {
        let data = InstrumentsData::new(json!({
            "instruments": [
                {"name": "EUR_USD", "type": "CURRENCY"},
                {"name": "GBP_USD", "type": "CURRENCY"},
                {"type": "CURRENCY"}
            ]
        }));
        assert_eq!(data.instrument_names().unwrap(), vec!["EUR_USD", "GBP_USD"]);
    }

    #[test]
    fn test_instrument_names_rejects_non_object_payload() {
        let data = InstrumentsData::new(json!(["EUR_USD"]));
        assert!(data.instrument_names().is_err());
    }

    #[test]
    fn test_instrument_names_tolerates_missing_key() {
        let data = InstrumentsData::new(json!({"account": "001"}));
        assert!(data.instrument_names().unwrap().is_empty());
    }

    #[test]
    fn test_instruments_storage_path() {
        let mut data = InstrumentsData::new(json!({}));
        data.timestamp = fixed_timestamp();
        assert_eq!(
            data.storage_path(),
            "oanda/instruments-list/2024/01/15.json.gz"
        );
    }

    #[test]
    fn test_candles_storage_path_and_metadata() {
        let mut data = CandlesData::new("EUR_USD", json!({"candles": []}));
        data.timestamp = fixed_timestamp();

        assert_eq!(data.storage_path(), "oanda/candles/2024/01/15/EUR_USD.json.gz");

        let envelope = data.to_json();
        assert_eq!(envelope["metadata"]["instrument"], "EUR_USD");
        assert_eq!(envelope["metadata"]["data_type"], "candles");
    }
}
