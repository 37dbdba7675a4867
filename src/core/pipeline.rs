use crate::core::context::{PipelineContext, ProcessorMetrics};
use crate::core::processor::Processor;
use chrono::Utc;

/// Ordered sequence of processors executed against a shared context.
///
/// Execution is fail-fast: the first processor error aborts the run, with the
/// failure recorded in that processor's metrics. `execute` always returns the
/// context so callers can inspect metrics for partial runs.
pub struct Pipeline {
    name: String,
    processors: Vec<Box<dyn Processor>>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>, processors: Vec<Box<dyn Processor>>) -> Self {
        Self {
            name: name.into(),
            processors,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn execute(&self) -> PipelineContext {
        let mut context = PipelineContext::new(&self.name);
        tracing::info!("🚀 Starting pipeline: {}", context.pipeline_id);

        for processor in &self.processors {
            let mut metrics = ProcessorMetrics::started_now();
            tracing::info!("🔄 Running processor: {}", processor.name());

            match processor.process(&mut context).await {
                Ok(result) => {
                    metrics.end_time = Some(Utc::now());
                    metrics.success = true;
                    metrics.records_processed = result.as_ref().map_or(0, Vec::len);
                    tracing::info!(
                        "✅ Processor completed: {} ({} records)",
                        processor.name(),
                        metrics.records_processed
                    );
                    context.record_metrics(processor.name(), metrics);
                }
                Err(e) => {
                    tracing::error!("❌ Processor failed: {}: {}", processor.name(), e);
                    metrics.end_time = Some(Utc::now());
                    metrics.error_message = Some(e.to_string());
                    context.record_metrics(processor.name(), metrics);
                    break;
                }
            }
        }

        let end_time = Utc::now();
        context.end_time = Some(end_time);
        let elapsed = (end_time - context.start_time).num_milliseconds() as f64 / 1000.0;
        tracing::info!("✅ Pipeline completed in {:.2}s", elapsed);

        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lake::StorageLocation;
    use crate::utils::error::{QuanterraError, Result};
    use async_trait::async_trait;

    struct StubProcessor {
        name: &'static str,
        locations: usize,
        fail: bool,
    }

    #[async_trait]
    impl Processor for StubProcessor {
        fn name(&self) -> &str {
            self.name
        }

        async fn process(
            &self,
            context: &mut PipelineContext,
        ) -> Result<Option<Vec<StorageLocation>>> {
            context.add_shared_state(format!("ran_{}", self.name), serde_json::json!(true));
            if self.fail {
                return Err(QuanterraError::ProcessingError {
                    message: format!("{} exploded", self.name),
                });
            }
            let locations = (0..self.locations)
                .map(|i| StorageLocation::new("bucket", format!("{}/{}.json.gz", self.name, i)))
                .collect();
            Ok(Some(locations))
        }
    }

    #[tokio::test]
    async fn test_execute_records_metrics() {
        let pipeline = Pipeline::new(
            "test_pipeline",
            vec![
                Box::new(StubProcessor {
                    name: "first",
                    locations: 2,
                    fail: false,
                }),
                Box::new(StubProcessor {
                    name: "second",
                    locations: 1,
                    fail: false,
                }),
            ],
        );

        let context = pipeline.execute().await;
        assert!(context.end_time.is_some());
        assert!(context.all_succeeded());
        assert_eq!(context.total_records_processed(), 3);
        assert_eq!(context.processor_metrics["first"].records_processed, 2);
    }

    #[tokio::test]
    async fn test_execute_aborts_on_first_failure() {
        let pipeline = Pipeline::new(
            "test_pipeline",
            vec![
                Box::new(StubProcessor {
                    name: "first",
                    locations: 1,
                    fail: false,
                }),
                Box::new(StubProcessor {
                    name: "failing",
                    locations: 0,
                    fail: true,
                }),
                Box::new(StubProcessor {
                    name: "never_runs",
                    locations: 1,
                    fail: false,
                }),
            ],
        );

        let context = pipeline.execute().await;
        assert!(context.end_time.is_some());
        assert!(!context.all_succeeded());
        assert_eq!(context.failed_processors(), vec!["failing"]);
        assert!(context.processor_metrics["failing"]
            .error_message
            .as_deref()
            .is_some_and(|m| m.contains("failing exploded")));

        // The third processor never started.
        assert!(!context.processor_metrics.contains_key("never_runs"));
        assert!(context.get_shared_state("ran_never_runs").is_none());
    }
}
