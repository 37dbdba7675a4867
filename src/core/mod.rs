pub mod context;
pub mod manifest;
pub mod pipeline;
pub mod processor;

pub use context::{PipelineContext, ProcessorMetrics};
pub use manifest::{PipelineManifest, ProcessorKind, ProcessorManifest};
pub use pipeline::Pipeline;
pub use processor::Processor;
