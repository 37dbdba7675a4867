//! Data source implementations.
//!
//! Market data sources (EODHD, OANDA, Yahoo Finance) are API-driven and
//! assembled from pipeline manifests. Brokerage sources (Interactive
//! Investor, Hargreaves Lansdown) ingest CSV exports handed to their flows
//! directly, so they have no manifest kind.

pub mod csv_file;
pub mod eodhd;
pub mod hargreaves_lansdown;
pub mod interactive_investor;
pub mod oanda;
pub mod yahoo_finance;

use crate::config::Settings;
use crate::core::{Processor, ProcessorKind};
use crate::lake::LakeClient;
use crate::utils::Result;

/// Builds the processor backing one manifest entry, routing to the source
/// that owns the kind. Source settings validate on access, so a manifest
/// can only reference sources the configuration actually carries.
pub fn build_processor(
    kind: ProcessorKind,
    settings: &Settings,
    lake: &LakeClient,
) -> Result<Box<dyn Processor>> {
    match kind {
        ProcessorKind::EodhdExchange
        | ProcessorKind::EodhdExchangeSymbol
        | ProcessorKind::EodhdInstrument
        | ProcessorKind::EodhdBulk
        | ProcessorKind::EodhdMacro
        | ProcessorKind::EodhdEconomicEvent => {
            eodhd::build_processor(kind, settings.eodhd()?, &settings.retry, lake)
        }
        ProcessorKind::OandaInstruments | ProcessorKind::OandaCandles => {
            oanda::build_processor(kind, settings.oanda()?, &settings.retry, lake)
        }
        ProcessorKind::YfTickers | ProcessorKind::YfMarket => {
            yahoo_finance::build_processor(kind, settings.yahoo_finance()?, &settings.retry, lake)
        }
    }
}
