//! Pipeline processors for the Yahoo Finance data source.
//!
//! Both processors walk the configured ticker list sequentially and fail
//! the pipeline on the first error. Yahoo throttles aggressively, so there
//! is no request fan-out here.

use async_trait::async_trait;
use tracing::info;

use crate::config::YahooFinanceSettings;
use crate::core::{PipelineContext, Processor, ProcessorKind};
use crate::lake::{LakeClient, StorageLocation};
use crate::sources::yahoo_finance::client::YahooFinanceClient;
use crate::sources::yahoo_finance::models::{MarketData, TickerData};
use crate::utils::Result;

/// Fetches company summary data for each configured ticker.
pub struct TickersProcessor {
    settings: YahooFinanceSettings,
    client: YahooFinanceClient,
    lake: LakeClient,
}

impl TickersProcessor {
    pub fn new(settings: YahooFinanceSettings, client: YahooFinanceClient, lake: LakeClient) -> Self {
        Self {
            settings,
            client,
            lake,
        }
    }
}

#[async_trait]
impl Processor for TickersProcessor {
    fn name(&self) -> &str {
        ProcessorKind::YfTickers.as_str()
    }

    async fn process(
        &self,
        _context: &mut PipelineContext,
    ) -> Result<Option<Vec<StorageLocation>>> {
        let mut locations = Vec::new();
        for ticker in &self.settings.tickers {
            info!("📥 Fetching ticker data for {ticker}");
            let response = self.client.get_ticker_summary(ticker).await?;
            let data = TickerData::from_summary(ticker.clone(), response)?;

            let location = self
                .lake
                .store_json(&data.storage_path(), &data.to_json(), true)
                .await?;
            info!("✅ Stored ticker data for {ticker} at: {location}");
            locations.push(location);
        }
        Ok(Some(locations))
    }
}

/// Fetches price history for each configured ticker.
pub struct MarketProcessor {
    settings: YahooFinanceSettings,
    client: YahooFinanceClient,
    lake: LakeClient,
}

impl MarketProcessor {
    pub fn new(settings: YahooFinanceSettings, client: YahooFinanceClient, lake: LakeClient) -> Self {
        Self {
            settings,
            client,
            lake,
        }
    }
}

#[async_trait]
impl Processor for MarketProcessor {
    fn name(&self) -> &str {
        ProcessorKind::YfMarket.as_str()
    }

    async fn process(
        &self,
        _context: &mut PipelineContext,
    ) -> Result<Option<Vec<StorageLocation>>> {
        let mut locations = Vec::new();
        for ticker in &self.settings.tickers {
            info!("📥 Fetching market data for {ticker}");
            let response = self
                .client
                .get_chart(ticker, &self.settings.range, &self.settings.interval)
                .await?;
            let data = MarketData::from_chart(ticker.clone(), response)?;

            let location = self
                .lake
                .store_json(&data.storage_path(), &data.to_json(), true)
                .await?;
            info!("✅ Stored market data for {ticker} at: {location}");
            locations.push(location);
        }
        Ok(Some(locations))
    }
}
