//! Master market data ingestion flow.
//!
//! Runs the three scheduled market data flows in sequence, retrying each
//! one before giving up so a single provider hiccup does not lose the
//! whole nightly run. Brokerage flows are excluded: they need an export
//! file and run on demand.

use std::future::Future;
use std::time::Duration;

use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;
use tracing::{error, info};

use crate::config::Settings;
use crate::core::PipelineContext;
use crate::flows::{eodhd, oanda, yahoo_finance};
use crate::lake::LakeClient;
use crate::utils::Result;

pub const FLOW_NAME: &str = "market_data_ingestion";

/// Retry policy applied to each sub-flow.
#[derive(Debug, Clone)]
pub struct FlowRetryPolicy {
    pub retries: usize,
    pub delay: Duration,
}

impl Default for FlowRetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            delay: Duration::from_secs(60),
        }
    }
}

async fn run_with_retries<F, Fut>(
    flow_name: &str,
    policy: &FlowRetryPolicy,
    flow: F,
) -> Result<usize>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PipelineContext>>,
{
    let strategy = FixedInterval::new(policy.delay).take(policy.retries);
    match Retry::spawn(strategy, flow).await {
        Ok(context) => Ok(context.total_records_processed()),
        Err(e) => {
            error!("❌ {flow_name} ingestion failed: {e}");
            Err(e)
        }
    }
}

pub async fn run_all(settings: &Settings, lake: &LakeClient) -> Result<()> {
    run_all_with_policy(settings, lake, FlowRetryPolicy::default()).await
}

pub async fn run_all_with_policy(
    settings: &Settings,
    lake: &LakeClient,
    policy: FlowRetryPolicy,
) -> Result<()> {
    info!(
        "🚀 Starting {FLOW_NAME} flow in {} environment",
        settings.environment
    );

    let mut stored = 0;
    stored += run_with_retries(eodhd::FLOW_NAME, &policy, || {
        eodhd::run(settings, lake, eodhd::RunOptions::default())
    })
    .await?;
    stored += run_with_retries(oanda::FLOW_NAME, &policy, || oanda::run(settings, lake)).await?;
    stored += run_with_retries(yahoo_finance::FLOW_NAME, &policy, || {
        yahoo_finance::run(settings, lake)
    })
    .await?;

    info!("📊 {FLOW_NAME} stored {stored} objects across 3 flows");
    Ok(())
}
