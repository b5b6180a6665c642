//! Yahoo Finance API client

use crate::error::{Result, StockError};
use crate::series::{PriceBar, PriceSeries};
use chrono::DateTime;
use tracing::debug;
use yahoo_finance_api as yahoo;

/// Window of daily history every report is built from
pub const HISTORY_RANGE: &str = "2mo";

const DAILY_INTERVAL: &str = "1d";

/// Yahoo Finance API client
#[derive(Debug, Clone, Default)]
pub struct YahooFinanceClient {}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new() -> Self {
        Self {}
    }

    /// Daily bars for `symbol` over `range` (e.g. "1mo", "2mo", "1y")
    pub async fn get_daily_history(&self, symbol: &str, range: &str) -> Result<PriceSeries> {
        let provider = yahoo::YahooConnector::new()
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        let response = provider
            .get_quote_range(symbol, DAILY_INTERVAL, range)
            .await
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        let bars: Vec<PriceBar> = quotes
            .iter()
            .filter_map(|q| {
                let date = DateTime::from_timestamp(q.timestamp as i64, 0)?.date_naive();
                Some(PriceBar {
                    date,
                    open: q.open,
                    high: q.high,
                    low: q.low,
                    close: q.close,
                    volume: q.volume,
                })
            })
            .collect();

        debug!(symbol, range, rows = bars.len(), "Fetched daily history");
        Ok(PriceSeries::new(bars))
    }
}
