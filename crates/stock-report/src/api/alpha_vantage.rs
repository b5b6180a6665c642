//! Alpha Vantage API client

use crate::error::{Result, StockError};
use crate::fundamentals::{FundamentalSnapshot, parse_label, parse_metric};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const BASE_URL: &str = "https://www.alphavantage.co/query";

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Alpha Vantage API client
#[derive(Clone)]
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
    rate_limiter: SharedRateLimiter,
}

impl std::fmt::Debug for AlphaVantageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlphaVantageClient")
            .field("api_key", &"***")
            .finish_non_exhaustive()
    }
}

/// Company overview as returned by the `OVERVIEW` function
///
/// Alpha Vantage encodes every value as a string and uses `"None"` or `"-"`
/// for missing data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyOverview {
    #[serde(rename = "Symbol")]
    pub symbol: Option<String>,
    #[serde(rename = "Sector")]
    pub sector: Option<String>,
    #[serde(rename = "Industry")]
    pub industry: Option<String>,
    #[serde(rename = "MarketCapitalization")]
    pub market_cap: Option<String>,
    #[serde(rename = "PERatio")]
    pub pe_ratio: Option<String>,
    #[serde(rename = "DividendYield")]
    pub dividend_yield: Option<String>,
    #[serde(rename = "QuarterlyRevenueGrowthYOY")]
    pub revenue_growth: Option<String>,
    #[serde(rename = "ProfitMargin")]
    pub profit_margin: Option<String>,
    #[serde(rename = "BookValue")]
    pub book_value: Option<String>,
    #[serde(rename = "PriceToBookRatio")]
    pub price_to_book: Option<String>,
}

impl From<CompanyOverview> for FundamentalSnapshot {
    fn from(overview: CompanyOverview) -> Self {
        Self {
            pe_ratio: parse_metric(overview.pe_ratio.as_deref()),
            market_cap: parse_metric(overview.market_cap.as_deref()),
            dividend_yield: parse_metric(overview.dividend_yield.as_deref()),
            revenue_growth: parse_metric(overview.revenue_growth.as_deref()),
            profit_margin: parse_metric(overview.profit_margin.as_deref()),
            // OVERVIEW carries no debt-to-equity figure
            debt_to_equity: None,
            book_value: parse_metric(overview.book_value.as_deref()),
            price_to_book: parse_metric(overview.price_to_book.as_deref()),
            sector: parse_label(overview.sector.as_deref()),
            industry: parse_label(overview.industry.as_deref()),
        }
    }
}

impl AlphaVantageClient {
    /// Create a new Alpha Vantage client
    ///
    /// # Arguments
    /// * `api_key` - Alpha Vantage API key
    /// * `rate_limit` - Maximum requests per minute (5 on the free tier)
    /// * `timeout` - Per-request timeout
    pub fn new(api_key: impl Into<String>, rate_limit: u32, timeout: Duration) -> Result<Self> {
        let quota = Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::MIN));
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            rate_limiter,
        })
    }

    /// Get the company overview for a symbol
    pub async fn get_company_overview(&self, symbol: &str) -> Result<CompanyOverview> {
        // Wait for rate limiter
        self.rate_limiter.until_ready().await;

        let params = [
            ("function", "OVERVIEW"),
            ("symbol", symbol),
            ("apikey", self.api_key.as_str()),
        ];

        let response = self.client.get(BASE_URL).query(&params).send().await?;

        if !response.status().is_success() {
            return Err(StockError::AlphaVantageError(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let data: serde_json::Value = response.json().await?;
        debug!(symbol, "Received Alpha Vantage overview");
        parse_overview(symbol, data)
    }

    /// Fundamentals for a symbol
    pub async fn get_fundamentals(&self, symbol: &str) -> Result<FundamentalSnapshot> {
        self.get_company_overview(symbol).await.map(Into::into)
    }
}

fn parse_overview(symbol: &str, data: serde_json::Value) -> Result<CompanyOverview> {
    // Check for API error messages
    if let Some(error) = data.get("Error Message") {
        return Err(StockError::AlphaVantageError(error.to_string()));
    }

    if data.get("Note").is_some() || data.get("Information").is_some() {
        return Err(StockError::RateLimitExceeded {
            provider: "Alpha Vantage".to_string(),
        });
    }

    // An empty object means the symbol is not covered
    if data.as_object().is_none_or(|o| o.is_empty()) {
        return Err(StockError::InvalidSymbol(symbol.to_string()));
    }

    Ok(serde_json::from_value(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_creation() {
        let client = AlphaVantageClient::new("demo", 5, Duration::from_secs(10));
        assert!(client.is_ok());

        // a zero limit is clamped rather than rejected
        assert!(AlphaVantageClient::new("demo", 0, Duration::from_secs(10)).is_ok());
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = AlphaVantageClient::new("AV-SECRET-KEY", 5, Duration::from_secs(10)).unwrap();
        assert!(!format!("{client:?}").contains("AV-SECRET-KEY"));
    }

    #[test]
    fn test_overview_to_snapshot() {
        let data = json!({
            "Symbol": "IBM",
            "Sector": "TECHNOLOGY",
            "Industry": "COMPUTER & OFFICE EQUIPMENT",
            "MarketCapitalization": "178000000000",
            "PERatio": "22.4",
            "DividendYield": "0.0367",
            "QuarterlyRevenueGrowthYOY": "0.015",
            "ProfitMargin": "None",
            "BookValue": "-",
            "PriceToBookRatio": "7.1"
        });

        let snapshot: FundamentalSnapshot = parse_overview("IBM", data).unwrap().into();

        assert_eq!(snapshot.pe_ratio, Some(22.4));
        assert_eq!(snapshot.market_cap, Some(178e9));
        assert_eq!(snapshot.dividend_yield, Some(0.0367));
        assert_eq!(snapshot.revenue_growth, Some(0.015));
        assert_eq!(snapshot.profit_margin, None);
        assert_eq!(snapshot.book_value, None);
        assert_eq!(snapshot.price_to_book, Some(7.1));
        assert_eq!(snapshot.debt_to_equity, None);
        assert_eq!(snapshot.sector.as_deref(), Some("TECHNOLOGY"));
    }

    #[test]
    fn test_overview_errors() {
        let err = parse_overview("X", json!({"Error Message": "Invalid API call"})).unwrap_err();
        assert!(matches!(err, StockError::AlphaVantageError(_)));

        let err = parse_overview("X", json!({"Note": "Thank you for using Alpha Vantage!"}))
            .unwrap_err();
        assert!(matches!(err, StockError::RateLimitExceeded { .. }));

        let err = parse_overview("ZZZZ", json!({})).unwrap_err();
        assert!(matches!(err, StockError::InvalidSymbol(_)));
    }

    #[tokio::test]
    #[ignore] // Requires API key and network access
    async fn test_get_company_overview() {
        let api_key = std::env::var("ALPHA_VANTAGE_API_KEY").expect("API key not set");
        let client = AlphaVantageClient::new(api_key, 5, Duration::from_secs(30)).unwrap();

        let snapshot = client.get_fundamentals("AAPL").await.unwrap();
        assert!(snapshot.has_any());
    }
}
