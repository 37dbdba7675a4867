use crate::core::context::PipelineContext;
use crate::lake::StorageLocation;
use crate::utils::error::Result;
use async_trait::async_trait;

/// One step of an ingestion pipeline.
///
/// A processor fetches from an upstream source and lands objects in the
/// bronze lake, returning the locations it wrote. `None` means the processor
/// ran but had nothing to store.
#[async_trait]
pub trait Processor: Send + Sync {
    fn name(&self) -> &str;

    async fn process(&self, context: &mut PipelineContext)
        -> Result<Option<Vec<StorageLocation>>>;
}
