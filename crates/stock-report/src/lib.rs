//! Stock ticker reports
//!
//! Turns a single ticker query into a natural-language market report:
//!
//! - Classification of the query into market (US or Taiwan) and ticker
//! - Two months of daily history from Yahoo Finance
//! - Moving averages (5/20/60), RSI(14) and Bollinger bands
//! - Optional fundamentals from Alpha Vantage
//! - A rule-based summary, an investment stance and an optional AI section
//!   from a local language model
//!
//! # Example
//!
//! ```rust,no_run
//! use stock_report::{ReportConfig, ReportPipeline};
//!
//! # async fn example() -> stock_report::Result<()> {
//! let pipeline = ReportPipeline::from_config(ReportConfig::from_env()?)?;
//! let text = pipeline.call("AAPL").await;
//! println!("{text}");
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod chart;
pub mod config;
pub mod engine;
pub mod error;
pub mod fundamentals;
pub mod indicators;
pub mod market;
pub mod prompts;
pub mod provider;
pub mod response;
pub mod series;
pub mod summary;

// Re-export main types for convenience
pub use chart::ChartData;
pub use config::{LlmBackend, ReportConfig};
pub use engine::{AnalysisResult, PipelineStage, Report, ReportPipeline, validate_input};
pub use error::{PipelineError, Result, StockError};
pub use fundamentals::FundamentalSnapshot;
pub use indicators::{IndicatorFrame, IndicatorRow};
pub use market::{Intent, Market, Resolution, classify};
pub use provider::{MarketDataProvider, YahooMarketData};
pub use series::{PriceBar, PriceSeries, PriceStats};
