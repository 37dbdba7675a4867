//! Hargreaves Lansdown account export ingestion.
//!
//! HL accounts produce three separate CSV downloads (transaction history,
//! current positions, closed positions); a run may carry any subset. Each
//! export type hides its header behind a different preamble depth, which
//! is what the models in here pin down.

pub mod models;
pub mod processor;

pub use models::{ClosedPositionData, PositionData, TransactionData};
pub use processor::HargreavesLansdownProcessor;
