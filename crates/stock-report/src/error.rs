//! Error types for stock report operations

use std::time::Duration;
use thiserror::Error;

use crate::engine::PipelineStage;

/// Stock report specific errors
#[derive(Debug, Error)]
pub enum StockError {
    /// The classifier could not determine a market for the input
    #[error(
        "unable to recognize ticker '{0}'; enter a 4-digit Taiwan code or an alphabetic US symbol"
    )]
    UnrecognizedTicker(String),

    /// Invalid stock symbol provided
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Data not available for the requested symbol
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// A required column is missing from the price data
    #[error("Missing field: {0}")]
    MissingField(String),

    /// An operation needed at least one row
    #[error("Price series is empty")]
    EmptySeries,

    /// Technical indicator construction failed
    #[error("Indicator error: {0}")]
    IndicatorError(String),

    /// A blocking collaborator did not answer in time
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: String,
        after: Duration,
    },

    /// Rate limit exceeded for API
    #[error("Rate limit exceeded for {provider}")]
    RateLimitExceeded { provider: String },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinanceError(String),

    /// Alpha Vantage API error
    #[error("Alpha Vantage error: {0}")]
    AlphaVantageError(String),

    /// Prompt template error
    #[error("Prompt error: {0}")]
    PromptError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for stock operations
pub type Result<T> = std::result::Result<T, StockError>;

impl From<minijinja::Error> for StockError {
    fn from(err: minijinja::Error) -> Self {
        StockError::PromptError(err.to_string())
    }
}

impl From<report_utils::ConfigError> for StockError {
    fn from(err: report_utils::ConfigError) -> Self {
        StockError::ConfigError(err.to_string())
    }
}

/// A failure trapped by one pipeline stage
///
/// The `Display` output is the user-facing message the response stage turns
/// into an apology.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The query did not resolve to a supported market
    #[error("{0}")]
    Classification(#[source] StockError),

    /// Price history could not be retrieved
    #[error("failed to fetch stock data: {0}")]
    Fetch(#[source] StockError),

    /// Indicator computation failed
    #[error("analysis failed: {0}")]
    Analysis(#[source] StockError),
}

impl PipelineError {
    /// The stage that trapped the failure
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::Classification(_) => PipelineStage::Classified,
            Self::Fetch(_) => PipelineStage::Fetched,
            Self::Analysis(_) => PipelineStage::Analyzed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StockError::InvalidSymbol("INVALID".to_string());
        assert_eq!(err.to_string(), "Invalid symbol: INVALID");

        let err = StockError::DataUnavailable {
            symbol: "AAPL".to_string(),
            reason: "No data found".to_string(),
        };
        assert_eq!(err.to_string(), "Data not available for AAPL: No data found");

        let err = StockError::Timeout {
            operation: "price history fetch".to_string(),
            after: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "price history fetch timed out after 30s");
    }

    #[test]
    fn test_pipeline_error_messages() {
        let err = PipelineError::Fetch(StockError::DataUnavailable {
            symbol: "2330.TW".to_string(),
            reason: "no rows returned".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "failed to fetch stock data: Data not available for 2330.TW: no rows returned"
        );
        assert_eq!(err.stage(), PipelineStage::Fetched);

        let err = PipelineError::Classification(StockError::UnrecognizedTicker("??".to_string()));
        assert!(err.to_string().starts_with("unable to recognize ticker '??'"));
        assert!(matches!(
            err,
            PipelineError::Classification(StockError::UnrecognizedTicker(_))
        ));

        let err = PipelineError::Analysis(StockError::MissingField("close".to_string()));
        assert_eq!(err.to_string(), "analysis failed: Missing field: close");
    }
}
