//! Market and ticker classification
//!
//! Turns a free-text query into a [`Resolution`]. Classification never fails:
//! [`Market::Unknown`] is a valid outcome that the fetch stage rejects.

use crate::error::{Result, StockError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

/// Suffix Yahoo Finance uses for Taiwan Stock Exchange listings
pub const TW_EXCHANGE_SUFFIX: &str = ".TW";

static TW_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^0-9])([0-9]{4})(?:[^0-9]|$)").expect("valid TW token regex")
});

static US_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^A-Z])([A-Z]{1,5})(?:[^A-Z]|$)").expect("valid US token regex")
});

/// Market a ticker trades on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    /// US exchanges
    Us,
    /// Taiwan Stock Exchange
    Tw,
    /// Not recognised
    Unknown,
}

impl Market {
    /// Short label used in report headers
    pub fn label(self) -> &'static str {
        match self {
            Self::Us => "US",
            Self::Tw => "TW",
            Self::Unknown => "Unknown",
        }
    }

    /// Symbol to query the market-data provider with
    pub fn provider_symbol(self, ticker: &str) -> String {
        match self {
            Self::Tw => format!("{ticker}{TW_EXCHANGE_SUFFIX}"),
            Self::Us | Self::Unknown => ticker.to_string(),
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the caller wants to learn about the ticker
///
/// The classifier only ever produces [`Intent::Basic`]. The other variants
/// select alternative summary styles for callers that construct a
/// [`Resolution`] themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    #[default]
    Basic,
    Technical,
    Fundamental,
}

/// The classified form of a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub market: Market,
    pub ticker: String,
    pub intent: Intent,
}

impl Resolution {
    pub fn new(market: Market, ticker: impl Into<String>) -> Self {
        Self {
            market,
            ticker: ticker.into(),
            intent: Intent::Basic,
        }
    }

    /// Override the intent
    pub fn with_intent(mut self, intent: Intent) -> Self {
        self.intent = intent;
        self
    }

    pub fn is_known(&self) -> bool {
        self.market != Market::Unknown
    }
}

/// Resolve a query into market, ticker and intent
///
/// Rules, first match wins:
/// 1. exactly four ASCII digits: Taiwan, ticker unchanged
/// 2. ASCII letters (dots ignored), at most five characters: US, uppercased
/// 3. a four-digit run delimited by non-digits: Taiwan; otherwise a run of
///    one to five letters delimited by non-letters: US
/// 4. anything else: unknown, ticker is the uppercased input
pub fn classify(query: &str) -> Resolution {
    let input = query.trim();

    let resolution = exact_match(input)
        .or_else(|| extract_token(input))
        .unwrap_or_else(|| Resolution::new(Market::Unknown, input.to_uppercase()));

    debug!(
        market = %resolution.market,
        ticker = %resolution.ticker,
        intent = ?resolution.intent,
        "Classified query"
    );
    resolution
}

/// Resolve a query using only the exact-format rules
///
/// Used by chart front ends that must not guess. Anything that is not a
/// four-digit code or a short alphabetic symbol is rejected.
pub fn classify_strict(query: &str) -> Result<Resolution> {
    let input = query.trim();
    exact_match(input).ok_or_else(|| StockError::UnrecognizedTicker(input.to_string()))
}

fn exact_match(input: &str) -> Option<Resolution> {
    if input.len() == 4 && input.bytes().all(|b| b.is_ascii_digit()) {
        return Some(Resolution::new(Market::Tw, input));
    }

    let letters: String = input.chars().filter(|c| *c != '.').collect();
    if !letters.is_empty()
        && letters.chars().all(|c| c.is_ascii_alphabetic())
        && input.chars().count() <= 5
    {
        return Some(Resolution::new(Market::Us, input.to_ascii_uppercase()));
    }

    None
}

fn extract_token(input: &str) -> Option<Resolution> {
    if let Some(caps) = TW_TOKEN.captures(input) {
        return Some(Resolution::new(Market::Tw, &caps[1]));
    }

    let upper = input.to_uppercase();
    US_TOKEN
        .captures(&upper)
        .map(|caps| Resolution::new(Market::Us, &caps[1]))
}
