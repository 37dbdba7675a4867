//! Pipeline processors for the EODHD market data source.
//!
//! Exchange discovery feeds symbol discovery which feeds instrument
//! ingestion: each processor publishes what it found to the pipeline
//! shared state, and the next one falls back to that state whenever its
//! own configuration list is empty.
//!
//! Error handling differs by fan-out. The exchange, symbol and economic
//! event processors fail the pipeline on the first error. The instrument,
//! bulk and macro processors cover wide request grids where single
//! failures (delisted symbols, entitlement gaps) are routine, so they log
//! and keep going.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::EodhdSettings;
use crate::core::{PipelineContext, Processor, ProcessorKind};
use crate::lake::{LakeClient, StorageLocation};
use crate::sources::eodhd::client::EodhdClient;
use crate::sources::eodhd::models::{
    BulkDataType, EconomicEventData, ExchangeBulkData, ExchangeData, ExchangeSymbolData,
    InstrumentData, InstrumentDataType, MacroData,
};
use crate::utils::Result;

/// Shared-state key holding exchange codes discovered by [`ExchangeProcessor`].
pub const AVAILABLE_EXCHANGES_KEY: &str = "available_exchanges";

/// Shared-state key holding `CODE.EXCHANGE` symbols discovered by
/// [`ExchangeSymbolProcessor`].
pub const AVAILABLE_EXCHANGE_SYMBOLS_KEY: &str = "available_exchange_symbols";

const BULK_CONCURRENT_REQUESTS: usize = 8;

/// Fetches the exchange list and publishes the discovered codes.
pub struct ExchangeProcessor {
    client: EodhdClient,
    lake: LakeClient,
}

impl ExchangeProcessor {
    pub fn new(client: EodhdClient, lake: LakeClient) -> Self {
        Self { client, lake }
    }
}

#[async_trait]
impl Processor for ExchangeProcessor {
    fn name(&self) -> &str {
        ProcessorKind::EodhdExchange.as_str()
    }

    async fn process(
        &self,
        context: &mut PipelineContext,
    ) -> Result<Option<Vec<StorageLocation>>> {
        info!("📥 Fetching EODHD exchange list");
        let raw = self.client.get_exchanges().await?;
        let data = ExchangeData::new(raw);

        let location = self
            .lake
            .store_json(&data.storage_path(), &data.to_json(), true)
            .await?;
        info!("✅ Stored exchange list at: {location}");

        let codes = data.exchange_codes()?;
        context.add_shared_state(AVAILABLE_EXCHANGES_KEY, json!(codes));

        Ok(Some(vec![location]))
    }
}

/// Fetches the symbol list of each exchange and publishes the qualified
/// symbols. Uses the configured exchange list when present, otherwise the
/// exchanges discovered upstream.
pub struct ExchangeSymbolProcessor {
    settings: EodhdSettings,
    client: EodhdClient,
    lake: LakeClient,
}

impl ExchangeSymbolProcessor {
    pub fn new(settings: EodhdSettings, client: EodhdClient, lake: LakeClient) -> Self {
        Self {
            settings,
            client,
            lake,
        }
    }
}

#[async_trait]
impl Processor for ExchangeSymbolProcessor {
    fn name(&self) -> &str {
        ProcessorKind::EodhdExchangeSymbol.as_str()
    }

    async fn process(
        &self,
        context: &mut PipelineContext,
    ) -> Result<Option<Vec<StorageLocation>>> {
        let exchanges = if self.settings.exchanges.is_empty() {
            context
                .shared_string_list(AVAILABLE_EXCHANGES_KEY)
                .unwrap_or_default()
        } else {
            self.settings.exchanges.clone()
        };
        if exchanges.is_empty() {
            warn!("⏭️ No exchanges configured or discovered, skipping symbol ingestion");
            return Ok(Some(Vec::new()));
        }

        let mut locations = Vec::new();
        let mut symbols = Vec::new();
        for exchange in &exchanges {
            info!("📥 Fetching symbol list for {exchange}");
            let raw = self.client.get_exchange_symbols(exchange).await?;
            let data = ExchangeSymbolData::new(exchange.clone(), raw);

            let location = self
                .lake
                .store_json(&data.storage_path(), &data.to_json(), true)
                .await?;
            info!("✅ Stored symbol list at: {location}");

            symbols.extend(data.symbol_codes()?);
            locations.push(location);
        }
        context.add_shared_state(AVAILABLE_EXCHANGE_SYMBOLS_KEY, json!(symbols));

        Ok(Some(locations))
    }
}

/// Fetches per-instrument data across every instrument endpoint.
///
/// The request grid is instruments x endpoints, bounded by the configured
/// concurrency. Individual failures are logged and skipped.
pub struct InstrumentProcessor {
    settings: EodhdSettings,
    client: EodhdClient,
    lake: LakeClient,
}

impl InstrumentProcessor {
    pub fn new(settings: EodhdSettings, client: EodhdClient, lake: LakeClient) -> Self {
        Self {
            settings,
            client,
            lake,
        }
    }

    async fn ingest_instrument(
        client: &EodhdClient,
        lake: &LakeClient,
        code: &str,
        exchange: &str,
        data_type: InstrumentDataType,
    ) -> Result<StorageLocation> {
        let raw = match data_type {
            InstrumentDataType::Eod => client.get_eod_data(code, exchange).await?,
            InstrumentDataType::Dividends => client.get_dividends(code, exchange).await?,
            InstrumentDataType::Splits => client.get_splits(code, exchange).await?,
            InstrumentDataType::Fundamentals => client.get_fundamentals(code, exchange).await?,
            InstrumentDataType::News => client.get_news(code, exchange).await?,
        };
        let data = InstrumentData::new(code, exchange, data_type, raw);
        lake.store_json(&data.storage_path(), &data.to_json(), true)
            .await
    }

    async fn fetch_one(
        client: EodhdClient,
        lake: LakeClient,
        instrument: String,
        data_type: InstrumentDataType,
    ) -> Option<StorageLocation> {
        // Symbols are fully qualified as CODE.EXCHANGE; the code itself may
        // contain dots, so split on the last one.
        let Some((code, exchange)) = instrument.rsplit_once('.') else {
            warn!("⏭️ Skipping malformed instrument symbol: {instrument}");
            return None;
        };

        info!("📥 Fetching {data_type} data for {exchange}/{code}");
        match Self::ingest_instrument(&client, &lake, code, exchange, data_type).await {
            Ok(location) => {
                info!("✅ Stored {data_type} data at: {location}");
                Some(location)
            }
            Err(e) => {
                error!("❌ Failed to ingest {data_type} data for {instrument}: {e}");
                None
            }
        }
    }
}

#[async_trait]
impl Processor for InstrumentProcessor {
    fn name(&self) -> &str {
        ProcessorKind::EodhdInstrument.as_str()
    }

    async fn process(
        &self,
        context: &mut PipelineContext,
    ) -> Result<Option<Vec<StorageLocation>>> {
        let instruments = if self.settings.instruments.is_empty() {
            context
                .shared_string_list(AVAILABLE_EXCHANGE_SYMBOLS_KEY)
                .unwrap_or_default()
        } else {
            self.settings.instruments.clone()
        };
        if instruments.is_empty() {
            warn!("⏭️ No instruments configured or discovered, skipping instrument ingestion");
            return Ok(Some(Vec::new()));
        }

        info!(
            "🔄 Ingesting {} endpoints for {} instruments",
            InstrumentDataType::ALL.len(),
            instruments.len()
        );
        let semaphore = Arc::new(Semaphore::new(self.settings.concurrent_requests.max(1)));
        let mut tasks = JoinSet::new();
        for instrument in instruments {
            for data_type in InstrumentDataType::ALL {
                let semaphore = Arc::clone(&semaphore);
                let client = self.client.clone();
                let lake = self.lake.clone();
                let instrument = instrument.clone();
                tasks.spawn(async move {
                    let Ok(_permit) = semaphore.acquire_owned().await else {
                        return None;
                    };
                    Self::fetch_one(client, lake, instrument, data_type).await
                });
            }
        }

        let mut locations = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(location)) => locations.push(location),
                Ok(None) => {}
                Err(e) => error!("❌ Instrument ingestion task failed: {e}"),
            }
        }

        Ok(Some(locations))
    }
}

/// Fetches whole-exchange bulk files for end-of-day prices, dividends and
/// splits. Individual failures are logged and skipped.
pub struct ExchangeBulkProcessor {
    settings: EodhdSettings,
    client: EodhdClient,
    lake: LakeClient,
}

impl ExchangeBulkProcessor {
    pub fn new(settings: EodhdSettings, client: EodhdClient, lake: LakeClient) -> Self {
        Self {
            settings,
            client,
            lake,
        }
    }

    async fn ingest_bulk(
        client: &EodhdClient,
        lake: &LakeClient,
        exchange: &str,
        data_type: BulkDataType,
    ) -> Result<StorageLocation> {
        let raw = match data_type {
            BulkDataType::Eod => client.get_bulk_eod(exchange).await?,
            BulkDataType::Dividends => client.get_bulk_dividends(exchange).await?,
            BulkDataType::Splits => client.get_bulk_splits(exchange).await?,
        };
        let data = ExchangeBulkData::new(exchange, data_type, raw);
        lake.store_json(&data.storage_path(), &data.to_json(), true)
            .await
    }

    async fn fetch_one(
        client: EodhdClient,
        lake: LakeClient,
        exchange: String,
        data_type: BulkDataType,
    ) -> Option<StorageLocation> {
        info!("📥 Fetching {data_type} data for {exchange}");
        match Self::ingest_bulk(&client, &lake, &exchange, data_type).await {
            Ok(location) => {
                info!("✅ Stored {data_type} data at: {location}");
                Some(location)
            }
            Err(e) => {
                error!("❌ Failed to ingest {data_type} data for {exchange}: {e}");
                None
            }
        }
    }
}

#[async_trait]
impl Processor for ExchangeBulkProcessor {
    fn name(&self) -> &str {
        ProcessorKind::EodhdBulk.as_str()
    }

    async fn process(
        &self,
        _context: &mut PipelineContext,
    ) -> Result<Option<Vec<StorageLocation>>> {
        if self.settings.exchanges_bulk.is_empty() {
            warn!("⏭️ No bulk exchanges configured, skipping bulk ingestion");
            return Ok(Some(Vec::new()));
        }

        let semaphore = Arc::new(Semaphore::new(BULK_CONCURRENT_REQUESTS));
        let mut tasks = JoinSet::new();
        for exchange in &self.settings.exchanges_bulk {
            for data_type in BulkDataType::ALL {
                let semaphore = Arc::clone(&semaphore);
                let client = self.client.clone();
                let lake = self.lake.clone();
                let exchange = exchange.clone();
                tasks.spawn(async move {
                    let Ok(_permit) = semaphore.acquire_owned().await else {
                        return None;
                    };
                    Self::fetch_one(client, lake, exchange, data_type).await
                });
            }
        }

        let mut locations = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(location)) => locations.push(location),
                Ok(None) => {}
                Err(e) => error!("❌ Bulk ingestion task failed: {e}"),
            }
        }

        Ok(Some(locations))
    }
}

/// Fetches macroeconomic indicators for each configured country.
/// Individual failures are logged and skipped.
pub struct MacroProcessor {
    settings: EodhdSettings,
    client: EodhdClient,
    lake: LakeClient,
}

impl MacroProcessor {
    pub fn new(settings: EodhdSettings, client: EodhdClient, lake: LakeClient) -> Self {
        Self {
            settings,
            client,
            lake,
        }
    }

    async fn ingest_indicator(&self, iso_code: &str, indicator: &str) -> Result<StorageLocation> {
        let raw = self.client.get_macro_indicator(iso_code, indicator).await?;
        let data = MacroData::new(iso_code, indicator, raw);
        self.lake
            .store_json(&data.storage_path(), &data.to_json(), true)
            .await
    }
}

#[async_trait]
impl Processor for MacroProcessor {
    fn name(&self) -> &str {
        ProcessorKind::EodhdMacro.as_str()
    }

    async fn process(
        &self,
        _context: &mut PipelineContext,
    ) -> Result<Option<Vec<StorageLocation>>> {
        let mut locations = Vec::new();
        for indicator in &self.settings.macro_indicators {
            for iso_code in &self.settings.macro_countries {
                info!("📥 Fetching macro indicator {indicator} for {iso_code}");
                match self.ingest_indicator(iso_code, indicator).await {
                    Ok(location) => {
                        info!("✅ Stored macro indicator data at: {location}");
                        locations.push(location);
                    }
                    Err(e) => {
                        error!("❌ Failed to ingest {indicator} for {iso_code}: {e}");
                    }
                }
            }
        }
        Ok(Some(locations))
    }
}

/// Fetches the economic event calendar.
pub struct EconomicEventProcessor {
    client: EodhdClient,
    lake: LakeClient,
}

impl EconomicEventProcessor {
    pub fn new(client: EodhdClient, lake: LakeClient) -> Self {
        Self { client, lake }
    }
}

#[async_trait]
impl Processor for EconomicEventProcessor {
    fn name(&self) -> &str {
        ProcessorKind::EodhdEconomicEvent.as_str()
    }

    async fn process(
        &self,
        _context: &mut PipelineContext,
    ) -> Result<Option<Vec<StorageLocation>>> {
        info!("📥 Fetching economic events");
        let raw = self.client.get_economic_events().await?;
        let data = EconomicEventData::new(raw);

        let location = self
            .lake
            .store_json(&data.storage_path(), &data.to_json(), true)
            .await?;
        info!("✅ Stored economic events at: {location}");

        Ok(Some(vec![location]))
    }
}
