//! Yahoo Finance market data flow.

use tracing::info;

use crate::config::Settings;
use crate::core::{PipelineContext, PipelineManifest, ProcessorKind, ProcessorManifest};
use crate::lake::LakeClient;
use crate::utils::Result;

pub const FLOW_NAME: &str = "yahoo_finance_market_data";

pub fn manifest() -> PipelineManifest {
    PipelineManifest::new(
        FLOW_NAME,
        vec![
            ProcessorManifest::new(ProcessorKind::YfTickers),
            ProcessorManifest::new(ProcessorKind::YfMarket),
        ],
    )
}

pub async fn run(settings: &Settings, lake: &LakeClient) -> Result<PipelineContext> {
    info!(
        "🚀 Starting {FLOW_NAME} flow in {} environment",
        settings.environment
    );
    super::run_manifest(manifest(), settings, lake).await
}
