//! Yahoo Finance market data ingestion.

pub mod client;
pub mod models;
pub mod processors;

pub use client::YahooFinanceClient;
pub use processors::{MarketProcessor, TickersProcessor};

use crate::config::YahooFinanceSettings;
use crate::core::{Processor, ProcessorKind};
use crate::lake::LakeClient;
use crate::utils::retry::RetryConfig;
use crate::utils::{QuanterraError, Result};

/// Builds the processor backing one Yahoo Finance manifest entry.
pub fn build_processor(
    kind: ProcessorKind,
    settings: &YahooFinanceSettings,
    retry: &RetryConfig,
    lake: &LakeClient,
) -> Result<Box<dyn Processor>> {
    let client = YahooFinanceClient::new(settings, retry.clone())?;
    match kind {
        ProcessorKind::YfTickers => Ok(Box::new(TickersProcessor::new(
            settings.clone(),
            client,
            lake.clone(),
        ))),
        ProcessorKind::YfMarket => Ok(Box::new(MarketProcessor::new(
            settings.clone(),
            client,
            lake.clone(),
        ))),
        other => Err(QuanterraError::ProcessingError {
            message: format!("{other} is not a Yahoo Finance processor"),
        }),
    }
}
