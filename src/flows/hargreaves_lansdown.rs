//! Hargreaves Lansdown transactions flow.

use tracing::info;

use crate::config::Settings;
use crate::core::{Pipeline, PipelineContext};
use crate::lake::LakeClient;
use crate::sources::csv_file::TransactionSource;
use crate::sources::hargreaves_lansdown::HargreavesLansdownProcessor;
use crate::utils::{QuanterraError, Result};

pub const FLOW_NAME: &str = "hargreaves_lansdown_transactions";

/// The export files one run carries. HL produces three separate downloads,
/// so any subset may be present.
#[derive(Debug, Clone, Default)]
pub struct Exports {
    pub transactions: Option<TransactionSource>,
    pub positions: Option<TransactionSource>,
    pub closed_positions: Option<TransactionSource>,
}

impl Exports {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_none() && self.positions.is_none() && self.closed_positions.is_none()
    }
}

pub async fn run(
    settings: &Settings,
    lake: &LakeClient,
    exports: Exports,
    portfolio_name: &str,
) -> Result<PipelineContext> {
    info!(
        "🚀 Starting {FLOW_NAME} flow in {} environment",
        settings.environment
    );

    if exports.is_empty() {
        return Err(QuanterraError::ValidationError {
            message: "No Hargreaves Lansdown export files provided".to_string(),
        });
    }

    let processor = HargreavesLansdownProcessor::new(
        exports.transactions,
        exports.positions,
        exports.closed_positions,
        portfolio_name,
        lake.clone(),
    );
    let pipeline = Pipeline::new(FLOW_NAME, vec![Box::new(processor)]);
    super::finish(pipeline.execute().await)
}
