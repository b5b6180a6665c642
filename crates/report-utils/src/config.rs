//! Typed access to configuration variables
//!
//! Configuration structs in the workspace read their overrides through a
//! [`VarSource`], so the process environment can be swapped for a map in tests.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while reading configuration variables
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but its value cannot be parsed
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// A source of named string variables
pub trait VarSource {
    /// Look up a variable; blank values count as unset
    fn var(&self, key: &str) -> Option<String>;
}

/// The process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl VarSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

impl VarSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).filter(|v| !v.trim().is_empty()).cloned()
    }
}

/// Read a string variable, trimmed
pub fn string_var(source: &impl VarSource, key: &str) -> Option<String> {
    source.var(key).map(|v| v.trim().to_string())
}

/// Read and parse a variable
///
/// Returns `Ok(None)` when the variable is unset.
pub fn parse_var<T>(source: &impl VarSource, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let Some(raw) = string_var(source, key) else {
        return Ok(None);
    };

    raw.parse::<T>()
        .map(Some)
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
            reason: e.to_string(),
        })
}
