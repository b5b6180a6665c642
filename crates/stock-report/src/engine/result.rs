//! Pipeline output types

use super::context::PipelineStage;
use crate::error::PipelineError;
use crate::fundamentals::FundamentalSnapshot;
use crate::indicators::IndicatorFrame;
use crate::market::Resolution;
use crate::series::PriceStats;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Final text artifact of a query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Rule-based indicator summary; empty when the query failed
    pub summary: String,
    /// Investment stance sentence; empty when the query failed
    pub suggestion: String,
    /// Full user-facing text, report or apology
    pub response_text: String,
}

impl AnalysisResult {
    pub fn apology(response_text: String) -> Self {
        Self {
            response_text,
            ..Self::default()
        }
    }
}

/// Everything a single query produced
#[derive(Debug)]
pub struct Report {
    pub query_id: Uuid,
    pub query: String,
    /// States visited, in order; always ends with `Responded`
    pub trace: Vec<PipelineStage>,
    pub resolution: Option<Resolution>,
    pub stats: Option<PriceStats>,
    pub frame: Option<IndicatorFrame>,
    pub fundamentals: Option<FundamentalSnapshot>,
    pub error: Option<PipelineError>,
    /// Whether the language model contributed a section
    pub ai_augmented: bool,
    pub result: AnalysisResult,
}

impl Report {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn response_text(&self) -> &str {
        &self.result.response_text
    }
}
