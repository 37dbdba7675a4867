//! Processor for Hargreaves Lansdown account exports.

use async_trait::async_trait;
use tracing::info;

use crate::core::{PipelineContext, Processor};
use crate::lake::{LakeClient, StorageLocation};
use crate::sources::csv_file::TransactionSource;
use crate::sources::hargreaves_lansdown::models::{
    ClosedPositionData, PositionData, TransactionData,
};
use crate::utils::error::{QuanterraError, Result};

/// Validates and archives whichever HL exports were provided. Transactions,
/// positions and closed positions are separate downloads, so any subset can
/// be ingested in one run; each provided file must validate or the run
/// fails.
pub struct HargreavesLansdownProcessor {
    transactions: Option<TransactionSource>,
    positions: Option<TransactionSource>,
    closed_positions: Option<TransactionSource>,
    portfolio_name: String,
    lake: LakeClient,
}

impl HargreavesLansdownProcessor {
    pub fn new(
        transactions: Option<TransactionSource>,
        positions: Option<TransactionSource>,
        closed_positions: Option<TransactionSource>,
        portfolio_name: &str,
        lake: LakeClient,
    ) -> Self {
        Self {
            transactions,
            positions,
            closed_positions,
            portfolio_name: portfolio_name.to_string(),
            lake,
        }
    }

    async fn checked_preview(&self, source: &TransactionSource) -> Result<Vec<Vec<String>>> {
        if !source.validate_file_type() {
            return Err(QuanterraError::ValidationError {
                message: format!("Invalid file format for {source}"),
            });
        }
        source.preview(&self.lake).await
    }
}

#[async_trait]
impl Processor for HargreavesLansdownProcessor {
    fn name(&self) -> &str {
        "hargreaves_lansdown"
    }

    async fn process(
        &self,
        _context: &mut PipelineContext,
    ) -> Result<Option<Vec<StorageLocation>>> {
        let mut locations = Vec::new();

        if let Some(source) = &self.transactions {
            info!("📥 Processing Hargreaves Lansdown transactions from {source}");
            let preview = self.checked_preview(source).await?;
            let data = TransactionData::new(preview, &self.portfolio_name)?;
            locations.push(source.store(&self.lake, &data.storage_path()).await?);
        }

        if let Some(source) = &self.positions {
            info!("📥 Processing Hargreaves Lansdown positions from {source}");
            let preview = self.checked_preview(source).await?;
            let data = PositionData::new(preview, &self.portfolio_name)?;
            locations.push(source.store(&self.lake, &data.storage_path()).await?);
        }

        if let Some(source) = &self.closed_positions {
            info!("📥 Processing Hargreaves Lansdown closed positions from {source}");
            let preview = self.checked_preview(source).await?;
            let data = ClosedPositionData::new(preview, &self.portfolio_name)?;
            locations.push(source.store(&self.lake, &data.storage_path()).await?);
        }

        info!(
            "✅ Stored {} Hargreaves Lansdown export(s) for portfolio {}",
            locations.len(),
            self.portfolio_name
        );
        Ok(Some(locations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PREAMBLE_5: &str = "Client name:,A Client\n\
                              Client number:,123456\n\
                              Account:,ISA\n\
                              ,\n\
                              ,\n";

    fn transactions_export() -> String {
        format!(
            "{PREAMBLE_5}Trade date,Settle date,Reference,Description,Unit cost (p),\
             Quantity,Value (\u{a3})\n\
             01/08/2026,03/08/2026,B12345,VODAFONE GROUP,74.50,10,745.00\n"
        )
    }

    fn closed_positions_export() -> String {
        format!("{PREAMBLE_5}Code,Stock,Disposal type,Disposal date\nVOD,VODAFONE GROUP,Sale,01/08/2026\n")
    }

    fn positions_export() -> String {
        let mut preamble = String::new();
        for i in 0..10 {
            preamble.push_str(&format!("preamble {i},\n"));
        }
        format!(
            "{preamble}Stock,Units held,Price (pence),Value (\u{a3}),Cost (\u{a3}),\
             Gain/loss (\u{a3}),Gain/loss (%),Code\n\
             VODAFONE GROUP,10,74.50,7.45,7.00,0.45,6.4,VOD\n"
        )
    }

    fn write_export(dir: &TempDir, name: &str, contents: &str) -> TransactionSource {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        TransactionSource::File(path)
    }

    #[tokio::test]
    async fn test_archives_all_three_exports() {
        let dir = TempDir::new().unwrap();
        let lake = LakeClient::in_memory("datalake-dev-bronze");

        let processor = HargreavesLansdownProcessor::new(
            Some(write_export(&dir, "transactions.csv", &transactions_export())),
            Some(write_export(&dir, "positions.csv", &positions_export())),
            Some(write_export(
                &dir,
                "closed_positions.csv",
                &closed_positions_export(),
            )),
            "isa",
            lake.clone(),
        );

        let mut context = PipelineContext::new("hargreaves_lansdown_transactions");
        let locations = processor.process(&mut context).await.unwrap().unwrap();

        assert_eq!(locations.len(), 3);
        assert!(locations[0].path.ends_with("/transactions.csv.gz"));
        assert!(locations[1].path.ends_with("/positions.csv.gz"));
        assert!(locations[2].path.ends_with("/closed_positions.csv.gz"));
        for location in &locations {
            assert!(location.path.starts_with("transactions/hargreaves_lansdown/isa/"));
            let stored = lake.fetch(&location.path).await.unwrap();
            assert_eq!(&stored[..2], &[0x1f, 0x8b]);
        }
    }

    #[tokio::test]
    async fn test_processes_provided_subset_only() {
        let dir = TempDir::new().unwrap();
        let lake = LakeClient::in_memory("datalake-dev-bronze");

        let processor = HargreavesLansdownProcessor::new(
            Some(write_export(&dir, "transactions.csv", &transactions_export())),
            None,
            None,
            "isa",
            lake,
        );

        let mut context = PipelineContext::new("hargreaves_lansdown_transactions");
        let locations = processor.process(&mut context).await.unwrap().unwrap();
        assert_eq!(locations.len(), 1);
        assert!(locations[0].path.ends_with("/transactions.csv.gz"));
    }

    #[tokio::test]
    async fn test_invalid_extension_names_the_file() {
        let lake = LakeClient::in_memory("datalake-dev-bronze");
        let processor = HargreavesLansdownProcessor::new(
            Some(TransactionSource::LakeObject(
                "temp_uploads/positions.xlsx".to_string(),
            )),
            None,
            None,
            "isa",
            lake,
        );

        let mut context = PipelineContext::new("hargreaves_lansdown_transactions");
        let err = processor.process(&mut context).await.unwrap_err();
        assert!(err
            .to_string()
            .contains("Invalid file format for temp_uploads/positions.xlsx"));
    }

    #[tokio::test]
    async fn test_bad_export_fails_the_run() {
        let dir = TempDir::new().unwrap();
        let lake = LakeClient::in_memory("datalake-dev-bronze");

        // Positions export with the transactions preamble depth: header
        // lands on the wrong row.
        let processor = HargreavesLansdownProcessor::new(
            Some(write_export(&dir, "transactions.csv", &transactions_export())),
            Some(write_export(&dir, "positions.csv", &transactions_export())),
            None,
            "isa",
            lake,
        );

        let mut context = PipelineContext::new("hargreaves_lansdown_transactions");
        assert!(processor.process(&mut context).await.is_err());
    }
}
