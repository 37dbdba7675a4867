//! Export model for Interactive Investor transaction files.

use chrono::{DateTime, Utc};

use crate::sources::csv_file::check_required_columns;
use crate::utils::error::Result;

/// Columns the first row of a transaction export must carry.
const REQUIRED_COLUMNS: [&str; 11] = [
    "Date",
    "Settlement Date",
    "Symbol",
    "Sedol",
    "Quantity",
    "Price",
    "Description",
    "Reference",
    "Debit",
    "Credit",
    "Running Balance",
];

/// Validated preview of an Interactive Investor transaction export.
#[derive(Debug, Clone)]
pub struct TransactionData {
    pub data: Vec<Vec<String>>,
    pub portfolio_name: String,
    pub timestamp: DateTime<Utc>,
}

impl TransactionData {
    pub fn new(data: Vec<Vec<String>>, portfolio_name: &str) -> Result<Self> {
        check_required_columns(&data, 0, &REQUIRED_COLUMNS)?;
        Ok(Self {
            data,
            portfolio_name: portfolio_name.to_string(),
            timestamp: Utc::now(),
        })
    }

    pub fn storage_path(&self) -> String {
        format!(
            "transactions/interactive_investor/{}/{}/transactions.csv.gz",
            self.portfolio_name,
            self.timestamp.format("%Y%m%d")
        )
    }
}
