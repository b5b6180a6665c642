//! Per-stage pipeline records
//!
//! Each stage consumes the previous record and produces a narrower or richer
//! one. Nothing is shared between queries.

use crate::fundamentals::FundamentalSnapshot;
use crate::indicators::IndicatorFrame;
use crate::market::Resolution;
use crate::series::{PriceSeries, PriceStats};
use serde::{Deserialize, Serialize};
use std::fmt;

/// States a query moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineStage {
    Classified,
    Fetched,
    Analyzed,
    Responded,
    /// Absorbing failure state; only `Responded` follows it
    Errored,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Classified => "classified",
            Self::Fetched => "fetched",
            Self::Analyzed => "analyzed",
            Self::Responded => "responded",
            Self::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Output of the classify stage
#[derive(Debug, Clone)]
pub struct Classified {
    pub resolution: Resolution,
}

/// Output of the fetch stage
#[derive(Debug, Clone)]
pub struct Fetched {
    pub resolution: Resolution,
    pub series: PriceSeries,
    pub stats: PriceStats,
}

/// Output of the analyze stage
#[derive(Debug, Clone)]
pub struct Analyzed {
    pub resolution: Resolution,
    pub stats: PriceStats,
    pub frame: IndicatorFrame,
    pub fundamentals: FundamentalSnapshot,
    pub summary: String,
}

impl Analyzed {
    /// RSI of the most recent row, if defined
    pub fn latest_rsi(&self) -> Option<f64> {
        self.frame.latest().and_then(|row| row.rsi_14)
    }
}
