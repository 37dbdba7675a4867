//! Interactive Investor transaction ingestion.
//!
//! Exports arrive as CSV files, either on disk for local runs or staged
//! in the lake by the transaction upload CLI. The processor validates the
//! export header before archiving the file, so a malformed upload fails
//! the flow instead of landing in the lake.

pub mod models;
pub mod processor;

pub use models::TransactionData;
pub use processor::InteractiveInvestorProcessor;
