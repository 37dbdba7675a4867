//! Processor for Interactive Investor transaction exports.

use async_trait::async_trait;
use tracing::info;

use crate::core::{PipelineContext, Processor};
use crate::lake::{LakeClient, StorageLocation};
use crate::sources::csv_file::TransactionSource;
use crate::sources::interactive_investor::models::TransactionData;
use crate::utils::error::{QuanterraError, Result};

/// Validates an Interactive Investor transaction export and archives it
/// in the lake under the portfolio it belongs to.
pub struct InteractiveInvestorProcessor {
    source: TransactionSource,
    portfolio_name: String,
    lake: LakeClient,
}

impl InteractiveInvestorProcessor {
    pub fn new(source: TransactionSource, portfolio_name: &str, lake: LakeClient) -> Self {
        Self {
            source,
            portfolio_name: portfolio_name.to_string(),
            lake,
        }
    }
}

#[async_trait]
impl Processor for InteractiveInvestorProcessor {
    fn name(&self) -> &str {
        "interactive_investor"
    }

    async fn process(
        &self,
        _context: &mut PipelineContext,
    ) -> Result<Option<Vec<StorageLocation>>> {
        info!("📥 Processing Interactive Investor transactions from {}", self.source);

        if !self.source.validate_file_type() {
            return Err(QuanterraError::ValidationError {
                message: "Invalid Interactive Investor CSV file format".to_string(),
            });
        }

        let preview = self.source.preview(&self.lake).await?;
        let data = TransactionData::new(preview, &self.portfolio_name)?;

        let location = self.source.store(&self.lake, &data.storage_path()).await?;
        info!("✅ Stored Interactive Investor transaction data at: {location}");

        Ok(Some(vec![location]))
    }
}
