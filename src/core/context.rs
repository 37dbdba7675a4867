use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Per-processor execution record.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessorMetrics {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub success: bool,
    pub error_message: Option<String>,
    pub records_processed: usize,
}

impl ProcessorMetrics {
    pub fn started_now() -> Self {
        Self {
            start_time: Utc::now(),
            end_time: None,
            success: false,
            error_message: None,
            records_processed: 0,
        }
    }

    pub fn duration_seconds(&self) -> Option<f64> {
        self.end_time
            .map(|end| (end - self.start_time).num_milliseconds() as f64 / 1000.0)
    }
}

/// Execution context shared by the processors of one pipeline run.
///
/// Processors chain through `shared_state`: an upstream processor stashes the
/// identifiers it discovered and downstream processors pick them up when their
/// own configuration leaves the selection open.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub pipeline_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub shared_state: HashMap<String, serde_json::Value>,
    pub processor_metrics: HashMap<String, ProcessorMetrics>,
}

impl PipelineContext {
    pub fn new(pipeline_name: &str) -> Self {
        Self {
            pipeline_id: format!("{}-{}", pipeline_name, Uuid::new_v4()),
            start_time: Utc::now(),
            end_time: None,
            shared_state: HashMap::new(),
            processor_metrics: HashMap::new(),
        }
    }

    pub fn add_shared_state(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.shared_state.insert(key.into(), value);
    }

    pub fn get_shared_state(&self, key: &str) -> Option<&serde_json::Value> {
        self.shared_state.get(key)
    }

    /// Reads a shared-state entry as a list of strings, ignoring non-string
    /// elements. Returns None when the key is absent.
    pub fn shared_string_list(&self, key: &str) -> Option<Vec<String>> {
        self.shared_state.get(key).and_then(|value| {
            value.as_array().map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
        })
    }

    pub fn record_metrics(&mut self, processor_name: &str, metrics: ProcessorMetrics) {
        self.processor_metrics
            .insert(processor_name.to_string(), metrics);
    }

    pub fn all_succeeded(&self) -> bool {
        self.processor_metrics.values().all(|m| m.success)
    }

    pub fn failed_processors(&self) -> Vec<&str> {
        let mut failed: Vec<&str> = self
            .processor_metrics
            .iter()
            .filter(|(_, m)| !m.success)
            .map(|(name, _)| name.as_str())
            .collect();
        failed.sort_unstable();
        failed
    }

    pub fn total_records_processed(&self) -> usize {
        self.processor_metrics
            .values()
            .map(|m| m.records_processed)
            .sum()
    }

    pub fn duration_seconds(&self) -> Option<f64> {
        self.end_time
            .map(|end| (end - self.start_time).num_milliseconds() as f64 / 1000.0)
    }

    pub fn execution_summary(&self) -> HashMap<String, serde_json::Value> {
        let mut summary = HashMap::new();

        let total = self.processor_metrics.len();
        let failed = self
            .processor_metrics
            .values()
            .filter(|m| !m.success)
            .count();

        summary.insert(
            "pipeline_id".to_string(),
            serde_json::Value::String(self.pipeline_id.clone()),
        );
        summary.insert("total_processors".to_string(), serde_json::json!(total));
        summary.insert(
            "succeeded_processors".to_string(),
            serde_json::json!(total - failed),
        );
        summary.insert("failed_processors".to_string(), serde_json::json!(failed));
        summary.insert(
            "total_records_processed".to_string(),
            serde_json::json!(self.total_records_processed()),
        );
        if let Some(seconds) = self.duration_seconds() {
            summary.insert(
                "duration_seconds".to_string(),
                serde_json::json!((seconds * 100.0).round() / 100.0),
            );
        }

        summary
    }
}
