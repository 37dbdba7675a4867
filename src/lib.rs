//! Market data and brokerage transaction ingestion into the bronze data
//! lake.
//!
//! The crate is organised around deployable flows: each flow assembles a
//! [`core::Pipeline`] of source processors and archives what they fetch in
//! the lake. `sources` holds the per-provider clients and processors,
//! `flows` the deployment entry points, and `deploy` the manifest the
//! orchestrator applies.

pub mod config;
pub mod core;
pub mod deploy;
pub mod flows;
pub mod lake;
pub mod sources;
pub mod utils;

pub use config::{Environment, Settings};
pub use core::{Pipeline, PipelineContext, Processor};
pub use lake::{LakeClient, StorageLocation};
pub use utils::error::{QuanterraError, Result};
