//! Report engine
//!
//! Sequences the classify, fetch, analyze and respond stages for one query.

pub mod context;
pub mod pipeline;
pub mod result;

pub use context::{Analyzed, Classified, Fetched, PipelineStage};
pub use pipeline::{MAX_INPUT_CHARS, ReportPipeline, validate_input};
pub use result::{AnalysisResult, Report};
