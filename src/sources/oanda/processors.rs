//! Pipeline processors for the OANDA market data source.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::OandaSettings;
use crate::core::{PipelineContext, Processor, ProcessorKind};
use crate::lake::{LakeClient, StorageLocation};
use crate::sources::oanda::client::OandaClient;
use crate::sources::oanda::models::{CandlesData, InstrumentsData};
use crate::utils::Result;

/// Shared-state key holding instrument names discovered by
/// [`InstrumentsProcessor`].
pub const AVAILABLE_INSTRUMENTS_KEY: &str = "available_instruments";

/// Fetches the tradeable instruments of the account and publishes their
/// names.
pub struct InstrumentsProcessor {
    client: OandaClient,
    lake: LakeClient,
}

impl InstrumentsProcessor {
    pub fn new(client: OandaClient, lake: LakeClient) -> Self {
        Self { client, lake }
    }
}

#[async_trait]
impl Processor for InstrumentsProcessor {
    fn name(&self) -> &str {
        ProcessorKind::OandaInstruments.as_str()
    }

    async fn process(
        &self,
        context: &mut PipelineContext,
    ) -> Result<Option<Vec<StorageLocation>>> {
        info!("📥 Fetching OANDA instrument list");
        let raw = self.client.get_instruments().await?;
        let data = InstrumentsData::new(raw);

        let location = self
            .lake
            .store_json(&data.storage_path(), &data.to_json(), true)
            .await?;
        info!("✅ Stored instrument list at: {location}");

        let names = data.instrument_names()?;
        context.add_shared_state(AVAILABLE_INSTRUMENTS_KEY, json!(names));

        Ok(Some(vec![location]))
    }
}

/// Fetches recent candles for each instrument. Uses the configured
/// instrument list when present, otherwise the instruments discovered
/// upstream. Any failed instrument fails the pipeline.
pub struct CandlesProcessor {
    settings: OandaSettings,
    client: OandaClient,
    lake: LakeClient,
}

impl CandlesProcessor {
    pub fn new(settings: OandaSettings, client: OandaClient, lake: LakeClient) -> Self {
        Self {
            settings,
            client,
            lake,
        }
    }

    async fn ingest_candles(
        client: &OandaClient,
        lake: &LakeClient,
        settings: &OandaSettings,
        instrument: &str,
    ) -> Result<StorageLocation> {
        let raw = client
            .get_candles(
                instrument,
                &settings.granularity,
                settings.count,
                &settings.price,
            )
            .await?;
        let data = CandlesData::new(instrument, raw);
        lake.store_json(&data.storage_path(), &data.to_json(), true)
            .await
    }
}

#[async_trait]
impl Processor for CandlesProcessor {
    fn name(&self) -> &str {
        ProcessorKind::OandaCandles.as_str()
    }

    async fn process(
        &self,
        context: &mut PipelineContext,
    ) -> Result<Option<Vec<StorageLocation>>> {
        let instruments = if self.settings.instruments.is_empty() {
            context
                .shared_string_list(AVAILABLE_INSTRUMENTS_KEY)
                .unwrap_or_default()
        } else {
            self.settings.instruments.clone()
        };
        if instruments.is_empty() {
            warn!("⏭️ No instruments configured or discovered, skipping candle ingestion");
            return Ok(Some(Vec::new()));
        }

        info!("🔄 Ingesting candles for {} instruments", instruments.len());
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrent_fetches.max(1)));
        let mut tasks = JoinSet::new();
        for instrument in instruments {
            let semaphore = Arc::clone(&semaphore);
            let client = self.client.clone();
            let lake = self.lake.clone();
            let settings = self.settings.clone();
            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (
                        instrument,
                        Err(crate::utils::QuanterraError::ProcessingError {
                            message: "Candle ingestion was cancelled".to_string(),
                        }),
                    );
                };
                info!("📥 Fetching candles for {instrument}");
                let result = Self::ingest_candles(&client, &lake, &settings, &instrument).await;
                (instrument, result)
            });
        }

        let mut locations = Vec::new();
        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((instrument, Ok(location))) => {
                    info!("✅ Stored candles for {instrument} at: {location}");
                    locations.push(location);
                }
                Ok((instrument, Err(e))) => {
                    error!("❌ Failed to ingest candles for {instrument}: {e}");
                    first_error.get_or_insert(e);
                }
                Err(e) => error!("❌ Candle ingestion task failed: {e}"),
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(Some(locations)),
        }
    }
}
