//! Market-data boundary used by the report pipeline

use crate::api::{AlphaVantageClient, HISTORY_RANGE, YahooFinanceClient};
use crate::config::ReportConfig;
use crate::error::{Result, StockError};
use crate::fundamentals::FundamentalSnapshot;
use crate::market::Market;
use crate::series::PriceSeries;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Source of price history and fundamentals
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Trailing two months of daily bars
    ///
    /// Fails with [`StockError::DataUnavailable`] when the provider errors or
    /// returns no rows. Callers bound the call with their own timeout.
    async fn fetch_history(&self, market: Market, ticker: &str) -> Result<PriceSeries>;

    /// Fundamentals for the ticker; never fails, unavailable data is `None`
    async fn fetch_fundamentals(&self, market: Market, ticker: &str) -> FundamentalSnapshot;
}

/// Yahoo Finance price history plus optional Alpha Vantage fundamentals
#[derive(Debug, Clone)]
pub struct YahooMarketData {
    yahoo: YahooFinanceClient,
    alpha_vantage: Option<AlphaVantageClient>,
    /// Bounds the whole fundamentals lookup, rate-limiter wait included
    fundamentals_timeout: Duration,
}

impl YahooMarketData {
    pub fn new(config: &ReportConfig) -> Result<Self> {
        let alpha_vantage = config
            .alpha_vantage_api_key
            .as_ref()
            .map(|key| {
                AlphaVantageClient::new(
                    key.clone(),
                    config.alpha_vantage_rate_limit,
                    config.request_timeout,
                )
            })
            .transpose()?;

        if alpha_vantage.is_none() {
            info!("ALPHA_VANTAGE_API_KEY not set, fundamentals will be unavailable");
        }

        Ok(Self {
            yahoo: YahooFinanceClient::new(),
            alpha_vantage,
            fundamentals_timeout: config.request_timeout,
        })
    }

    async fn try_fundamentals(&self, market: Market, ticker: &str) -> Result<FundamentalSnapshot> {
        let Some(client) = &self.alpha_vantage else {
            return Ok(FundamentalSnapshot::unavailable());
        };

        // No provider covers Taiwan listings
        if market != Market::Us {
            return Ok(FundamentalSnapshot::unavailable());
        }

        tokio::time::timeout(self.fundamentals_timeout, client.get_fundamentals(ticker))
            .await
            .map_err(|_| StockError::Timeout {
                operation: "fundamentals lookup".to_string(),
                after: self.fundamentals_timeout,
            })?
    }
}

#[async_trait]
impl MarketDataProvider for YahooMarketData {
    async fn fetch_history(&self, market: Market, ticker: &str) -> Result<PriceSeries> {
        if market == Market::Unknown {
            return Err(StockError::UnrecognizedTicker(ticker.to_string()));
        }

        let symbol = market.provider_symbol(ticker);
        let series = self
            .yahoo
            .get_daily_history(&symbol, HISTORY_RANGE)
            .await
            .map_err(|e| StockError::DataUnavailable {
                symbol: symbol.clone(),
                reason: e.to_string(),
            })?;

        if series.is_empty() {
            return Err(StockError::DataUnavailable {
                symbol,
                reason: "no rows returned".to_string(),
            });
        }

        debug!(%symbol, rows = series.len(), "History fetched");
        Ok(series)
    }

    async fn fetch_fundamentals(&self, market: Market, ticker: &str) -> FundamentalSnapshot {
        match self.try_fundamentals(market, ticker).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(%market, ticker, error = %e, "Fundamentals lookup failed");
                FundamentalSnapshot::unavailable()
            }
        }
    }
}
