//! Interactive Investor transactions flow.

use tracing::info;

use crate::config::Settings;
use crate::core::{Pipeline, PipelineContext};
use crate::lake::LakeClient;
use crate::sources::csv_file::TransactionSource;
use crate::sources::interactive_investor::InteractiveInvestorProcessor;
use crate::utils::Result;

pub const FLOW_NAME: &str = "interactive_investor_transactions";

pub async fn run(
    settings: &Settings,
    lake: &LakeClient,
    source: TransactionSource,
    portfolio_name: &str,
) -> Result<PipelineContext> {
    info!(
        "🚀 Starting {FLOW_NAME} flow in {} environment",
        settings.environment
    );

    let processor = InteractiveInvestorProcessor::new(source, portfolio_name, lake.clone());
    let pipeline = Pipeline::new(FLOW_NAME, vec![Box::new(processor)]);
    super::finish(pipeline.execute().await)
}
