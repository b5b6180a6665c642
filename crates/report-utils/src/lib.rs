//! Shared utilities for stock-report
//!
//! This crate provides common functionality used across the stock-report workspace:
//! tracing setup and typed access to environment variables.

pub mod config;
pub mod logging;

pub use config::{ConfigError, ProcessEnv, VarSource, parse_var, string_var};
pub use logging::{LogFormat, init_tracing, init_tracing_with};
