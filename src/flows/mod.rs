//! Deployable ingestion flows.
//!
//! Each flow is the body behind one deployment entry: it assembles its
//! pipeline, executes it, and turns any processor failure into a flow
//! failure the orchestrator can see. Scheduling and dispatch stay with
//! the orchestrator; a flow run here is one container invocation.

pub mod eodhd;
pub mod hargreaves_lansdown;
pub mod ingestion;
pub mod interactive_investor;
pub mod oanda;
pub mod yahoo_finance;

use tracing::info;

use crate::config::Settings;
use crate::core::{Pipeline, PipelineContext, PipelineManifest};
use crate::lake::LakeClient;
use crate::sources;
use crate::utils::{QuanterraError, Result};

/// Assembles a manifest's processors and executes them as one pipeline.
async fn run_manifest(
    manifest: PipelineManifest,
    settings: &Settings,
    lake: &LakeClient,
) -> Result<PipelineContext> {
    manifest.validate()?;

    let mut processors = Vec::with_capacity(manifest.processors.len());
    for entry in &manifest.processors {
        processors.push(sources::build_processor(entry.kind, settings, lake)?);
    }

    finish(Pipeline::new(&manifest.name, processors).execute().await)
}

/// Converts a completed context into the flow result: any failed processor
/// fails the run.
fn finish(context: PipelineContext) -> Result<PipelineContext> {
    info!(
        "📊 Execution summary: {}",
        serde_json::json!(context.execution_summary())
    );

    if context.all_succeeded() {
        Ok(context)
    } else {
        Err(QuanterraError::ProcessingError {
            message: format!(
                "Pipeline '{}' failed processors: {}",
                context.pipeline_id,
                context.failed_processors().join(", ")
            ),
        })
    }
}
