pub mod error;
pub mod logger;
pub mod retry;
pub mod validation;

pub use error::{QuanterraError, Result};
