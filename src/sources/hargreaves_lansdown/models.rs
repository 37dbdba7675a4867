//! Export models for Hargreaves Lansdown account files.
//!
//! HL exports open with free-text preamble (account holder, capital at
//! risk warnings) before the real header row, and the preamble depth
//! differs by export type. Each model pins the header row its export
//! uses and the columns that must appear there.

use chrono::{DateTime, Utc};

use crate::sources::csv_file::check_required_columns;
use crate::utils::error::Result;

/// Transaction and closed position exports carry five preamble rows.
const TRANSACTION_HEADER_ROW: usize = 5;

/// The positions export carries ten.
const POSITION_HEADER_ROW: usize = 10;

const TRANSACTION_COLUMNS: [&str; 7] = [
    "Trade date",
    "Settle date",
    "Reference",
    "Description",
    "Unit cost (p)",
    "Quantity",
    "Value (£)",
];

const POSITION_COLUMNS: [&str; 8] = [
    "Stock",
    "Units held",
    "Price (pence)",
    "Value (£)",
    "Cost (£)",
    "Gain/loss (£)",
    "Gain/loss (%)",
    "Code",
];

const CLOSED_POSITION_COLUMNS: [&str; 4] = ["Code", "Stock", "Disposal type", "Disposal date"];

fn storage_path(portfolio_name: &str, timestamp: &DateTime<Utc>, file_name: &str) -> String {
    format!(
        "transactions/hargreaves_lansdown/{}/{}/{}.csv.gz",
        portfolio_name,
        timestamp.format("%Y%m%d"),
        file_name
    )
}

/// Validated preview of an HL transaction history export.
#[derive(Debug, Clone)]
pub struct TransactionData {
    pub data: Vec<Vec<String>>,
    pub portfolio_name: String,
    pub timestamp: DateTime<Utc>,
}

impl TransactionData {
    pub fn new(data: Vec<Vec<String>>, portfolio_name: &str) -> Result<Self> {
        check_required_columns(&data, TRANSACTION_HEADER_ROW, &TRANSACTION_COLUMNS)?;
        Ok(Self {
            data,
            portfolio_name: portfolio_name.to_string(),
            timestamp: Utc::now(),
        })
    }

    pub fn storage_path(&self) -> String {
        storage_path(&self.portfolio_name, &self.timestamp, "transactions")
    }
}

/// Validated preview of an HL current positions export.
#[derive(Debug, Clone)]
pub struct PositionData {
    pub data: Vec<Vec<String>>,
    pub portfolio_name: String,
    pub timestamp: DateTime<Utc>,
}

impl PositionData {
    pub fn new(data: Vec<Vec<String>>, portfolio_name: &str) -> Result<Self> {
        check_required_columns(&data, POSITION_HEADER_ROW, &POSITION_COLUMNS)?;
        Ok(Self {
            data,
            portfolio_name: portfolio_name.to_string(),
            timestamp: Utc::now(),
        })
    }

    pub fn storage_path(&self) -> String {
        storage_path(&self.portfolio_name, &self.timestamp, "positions")
    }
}

/// Validated preview of an HL closed positions export.
#[derive(Debug, Clone)]
pub struct ClosedPositionData {
    pub data: Vec<Vec<String>>,
    pub portfolio_name: String,
    pub timestamp: DateTime<Utc>,
}

impl ClosedPositionData {
    pub fn new(data: Vec<Vec<String>>, portfolio_name: &str) -> Result<Self> {
        check_required_columns(&data, TRANSACTION_HEADER_ROW, &CLOSED_POSITION_COLUMNS)?;
        Ok(Self {
            data,
            portfolio_name: portfolio_name.to_string(),
            timestamp: Utc::now(),
        })
    }

    pub fn storage_path(&self) -> String {
        storage_path(&self.portfolio_name, &self.timestamp, "closed_positions")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn preamble(rows: usize) -> Vec<Vec<String>> {
        (0..rows)
            .map(|i| vec![format!("preamble line {i}")])
            .collect()
    }

    fn with_header(preamble_rows: usize, columns: &[&str]) -> Vec<Vec<String>> {
        let mut rows = preamble(preamble_rows);
        rows.push(columns.iter().map(|c| c.to_string()).collect());
        rows
    }

    #[test]
    fn test_transaction_header_row() {
        let rows = with_header(5, &TRANSACTION_COLUMNS);
        assert!(TransactionData::new(rows, "isa").is_ok());

        // Header in the wrong row fails validation.
        let rows = with_header(4, &TRANSACTION_COLUMNS);
        assert!(TransactionData::new(rows, "isa").is_err());
    }

    #[test]
    fn test_position_header_row() {
        let rows = with_header(10, &POSITION_COLUMNS);
        assert!(PositionData::new(rows, "isa").is_ok());
    }

    #[test]
    fn test_closed_position_header_row() {
        let rows = with_header(5, &CLOSED_POSITION_COLUMNS);
        assert!(ClosedPositionData::new(rows, "isa").is_ok());
    }

    #[test]
    fn test_short_preview_reads_as_no_data() {
        let err = PositionData::new(preamble(3), "isa").unwrap_err();
        assert!(err.to_string().contains("No data provided"));
    }

    #[test]
    fn test_missing_columns_reported() {
        let mut rows = preamble(5);
        rows.push(vec!["Trade date".to_string(), "Quantity".to_string()]);
        let err = TransactionData::new(rows, "isa").unwrap_err();
        assert!(err.to_string().contains("Missing required columns"));
        assert!(err.to_string().contains("Value (£)"));
    }

    #[test]
    fn test_storage_paths() {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 15, 12, 30, 0).unwrap();

        let mut transactions =
            TransactionData::new(with_header(5, &TRANSACTION_COLUMNS), "sipp").unwrap();
        transactions.timestamp = timestamp;
        assert_eq!(
            transactions.storage_path(),
            "transactions/hargreaves_lansdown/sipp/20240115/transactions.csv.gz"
        );

        let mut positions = PositionData::new(with_header(10, &POSITION_COLUMNS), "sipp").unwrap();
        positions.timestamp = timestamp;
        assert_eq!(
            positions.storage_path(),
            "transactions/hargreaves_lansdown/sipp/20240115/positions.csv.gz"
        );

        let mut closed =
            ClosedPositionData::new(with_header(5, &CLOSED_POSITION_COLUMNS), "sipp").unwrap();
        closed.timestamp = timestamp;
        assert_eq!(
            closed.storage_path(),
            "transactions/hargreaves_lansdown/sipp/20240115/closed_positions.csv.gz"
        );
    }
}
