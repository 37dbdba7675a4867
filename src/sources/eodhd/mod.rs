//! EODHD market data ingestion.

pub mod client;
pub mod models;
pub mod processors;

pub use client::EodhdClient;
pub use processors::{
    EconomicEventProcessor, ExchangeBulkProcessor, ExchangeProcessor, ExchangeSymbolProcessor,
    InstrumentProcessor, MacroProcessor, AVAILABLE_EXCHANGES_KEY, AVAILABLE_EXCHANGE_SYMBOLS_KEY,
};

use crate::config::EodhdSettings;
use crate::core::{Processor, ProcessorKind};
use crate::lake::LakeClient;
use crate::utils::retry::RetryConfig;
use crate::utils::{QuanterraError, Result};

/// Builds the processor backing one EODHD manifest entry.
pub fn build_processor(
    kind: ProcessorKind,
    settings: &EodhdSettings,
    retry: &RetryConfig,
    lake: &LakeClient,
) -> Result<Box<dyn Processor>> {
    let client = EodhdClient::new(settings, retry.clone())?;
    match kind {
        ProcessorKind::EodhdExchange => Ok(Box::new(ExchangeProcessor::new(client, lake.clone()))),
        ProcessorKind::EodhdExchangeSymbol => Ok(Box::new(ExchangeSymbolProcessor::new(
            settings.clone(),
            client,
            lake.clone(),
        ))),
        ProcessorKind::EodhdInstrument => Ok(Box::new(InstrumentProcessor::new(
            settings.clone(),
            client,
            lake.clone(),
        ))),
        ProcessorKind::EodhdBulk => Ok(Box::new(ExchangeBulkProcessor::new(
            settings.clone(),
            client,
            lake.clone(),
        ))),
        ProcessorKind::EodhdMacro => Ok(Box::new(MacroProcessor::new(
            settings.clone(),
            client,
            lake.clone(),
        ))),
        ProcessorKind::EodhdEconomicEvent => Ok(Box::new(EconomicEventProcessor::new(
            client,
            lake.clone(),
        ))),
        other => Err(QuanterraError::ProcessingError {
            message: format!("{other} is not an EODHD processor"),
        }),
    }
}
