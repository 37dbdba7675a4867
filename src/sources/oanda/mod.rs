//! OANDA market data ingestion.

pub mod client;
pub mod models;
pub mod processors;

pub use client::OandaClient;
pub use processors::{CandlesProcessor, InstrumentsProcessor, AVAILABLE_INSTRUMENTS_KEY};

use crate::config::OandaSettings;
use crate::core::{Processor, ProcessorKind};
use crate::lake::LakeClient;
use crate::utils::retry::RetryConfig;
use crate::utils::{QuanterraError, Result};

/// Builds the processor backing one OANDA manifest entry.
pub fn build_processor(
    kind: ProcessorKind,
    settings: &OandaSettings,
    retry: &RetryConfig,
    lake: &LakeClient,
) -> Result<Box<dyn Processor>> {
    let client = OandaClient::new(settings, retry.clone())?;
    match kind {
        ProcessorKind::OandaInstruments => {
            Ok(Box::new(InstrumentsProcessor::new(client, lake.clone())))
        }
        ProcessorKind::OandaCandles => Ok(Box::new(CandlesProcessor::new(
            settings.clone(),
            client,
            lake.clone(),
        ))),
        other => Err(QuanterraError::ProcessingError {
            message: format!("{other} is not an OANDA processor"),
        }),
    }
}
