use crate::utils::error::{QuanterraError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Processor implementations a pipeline manifest can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorKind {
    EodhdExchange,
    EodhdExchangeSymbol,
    EodhdInstrument,
    EodhdBulk,
    EodhdMacro,
    EodhdEconomicEvent,
    OandaInstruments,
    OandaCandles,
    YfTickers,
    YfMarket,
}

impl ProcessorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessorKind::EodhdExchange => "eodhd_exchange",
            ProcessorKind::EodhdExchangeSymbol => "eodhd_exchange_symbol",
            ProcessorKind::EodhdInstrument => "eodhd_instrument",
            ProcessorKind::EodhdBulk => "eodhd_bulk",
            ProcessorKind::EodhdMacro => "eodhd_macro",
            ProcessorKind::EodhdEconomicEvent => "eodhd_economic_event",
            ProcessorKind::OandaInstruments => "oanda_instruments",
            ProcessorKind::OandaCandles => "oanda_candles",
            ProcessorKind::YfTickers => "yf_tickers",
            ProcessorKind::YfMarket => "yf_market",
        }
    }
}

impl std::fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One processor entry in a pipeline manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorManifest {
    pub kind: ProcessorKind,
    #[serde(default)]
    pub depends_on: Option<ProcessorKind>,
}

impl ProcessorManifest {
    pub fn new(kind: ProcessorKind) -> Self {
        Self {
            kind,
            depends_on: None,
        }
    }

    pub fn depends_on(mut self, kind: ProcessorKind) -> Self {
        self.depends_on = Some(kind);
        self
    }
}

/// Declarative description of an ingestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineManifest {
    pub name: String,
    pub processors: Vec<ProcessorManifest>,
}

impl PipelineManifest {
    pub fn new(name: impl Into<String>, processors: Vec<ProcessorManifest>) -> Self {
        Self {
            name: name.into(),
            processors,
        }
    }

    /// Checks structural invariants before any processor is built: the
    /// manifest is named, non-empty, free of duplicate kinds, and every
    /// `depends_on` points at an earlier entry.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(QuanterraError::ValidationError {
                message: "Pipeline manifest requires a name".to_string(),
            });
        }

        if self.processors.is_empty() {
            return Err(QuanterraError::ValidationError {
                message: format!("Pipeline '{}' has no processors", self.name),
            });
        }

        let mut seen: HashSet<ProcessorKind> = HashSet::new();
        for processor in &self.processors {
            if !seen.insert(processor.kind) {
                return Err(QuanterraError::ValidationError {
                    message: format!(
                        "Pipeline '{}' lists processor '{}' more than once",
                        self.name, processor.kind
                    ),
                });
            }

            if let Some(dependency) = processor.depends_on {
                if !seen.contains(&dependency) {
                    return Err(QuanterraError::ValidationError {
                        message: format!(
                            "Processor '{}' depends on '{}' which does not run before it",
                            processor.kind, dependency
                        ),
                    });
                }
            }
        }

        Ok(())
    }
}
