//! EODHD market data flow.

use tracing::info;

use crate::config::Settings;
use crate::core::{PipelineContext, PipelineManifest, ProcessorKind, ProcessorManifest};
use crate::lake::LakeClient;
use crate::utils::Result;

pub const FLOW_NAME: &str = "eodhd_market_data";

/// Dataset switches for one run. Scheduled runs keep everything on; the
/// switches exist for ad-hoc backfills of a single dataset.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub exchanges: bool,
    pub exchange_symbols: bool,
    pub exchange_bulk: bool,
    pub instruments: bool,
    pub macro_indicators: bool,
    pub economic_events: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            exchanges: true,
            exchange_symbols: true,
            exchange_bulk: true,
            instruments: true,
            macro_indicators: true,
            economic_events: true,
        }
    }
}

/// Manifest for the datasets a run includes. Discovery processors come
/// first; the dependency edges are dropped when the upstream dataset is
/// switched off, leaving downstream processors on their configured lists.
pub fn manifest(options: &RunOptions) -> PipelineManifest {
    let mut processors = Vec::new();

    if options.exchanges {
        processors.push(ProcessorManifest::new(ProcessorKind::EodhdExchange));
    }
    if options.exchange_symbols {
        let mut entry = ProcessorManifest::new(ProcessorKind::EodhdExchangeSymbol);
        if options.exchanges {
            entry = entry.depends_on(ProcessorKind::EodhdExchange);
        }
        processors.push(entry);
    }
    if options.exchange_bulk {
        processors.push(ProcessorManifest::new(ProcessorKind::EodhdBulk));
    }
    if options.instruments {
        let mut entry = ProcessorManifest::new(ProcessorKind::EodhdInstrument);
        if options.exchange_symbols {
            entry = entry.depends_on(ProcessorKind::EodhdExchangeSymbol);
        }
        processors.push(entry);
    }
    if options.macro_indicators {
        processors.push(ProcessorManifest::new(ProcessorKind::EodhdMacro));
    }
    if options.economic_events {
        processors.push(ProcessorManifest::new(ProcessorKind::EodhdEconomicEvent));
    }

    PipelineManifest::new(FLOW_NAME, processors)
}

pub async fn run(
    settings: &Settings,
    lake: &LakeClient,
    options: RunOptions,
) -> Result<PipelineContext> {
    info!(
        "🚀 Starting {FLOW_NAME} flow in {} environment",
        settings.environment
    );
    super::run_manifest(manifest(&options), settings, lake).await
}
