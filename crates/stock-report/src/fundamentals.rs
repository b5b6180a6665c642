//! Coarse fundamental data
//!
//! Every field is optional; `None` is the "unavailable" marker and renders as
//! `N/A`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rendered in place of an unavailable value
pub const UNAVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalSnapshot {
    pub pe_ratio: Option<f64>,
    pub market_cap: Option<f64>,
    /// Fraction, not percent (0.0044 is 0.44%)
    pub dividend_yield: Option<f64>,
    /// Year-over-year quarterly revenue growth, as a fraction
    pub revenue_growth: Option<f64>,
    /// Fraction
    pub profit_margin: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub book_value: Option<f64>,
    pub price_to_book: Option<f64>,
    pub sector: Option<String>,
    pub industry: Option<String>,
}

impl FundamentalSnapshot {
    /// All fields unavailable
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Whether at least one field carries a value
    pub fn has_any(&self) -> bool {
        self.sector.is_some()
            || self.industry.is_some()
            || [
                self.pe_ratio,
                self.market_cap,
                self.dividend_yield,
                self.revenue_growth,
                self.profit_margin,
                self.debt_to_equity,
                self.book_value,
                self.price_to_book,
            ]
            .iter()
            .any(Option::is_some)
    }
}

/// Parse a provider metric, treating placeholders and junk as unavailable
pub fn parse_metric(raw: Option<&str>) -> Option<f64> {
    let raw = raw?.trim();
    match raw {
        "" | "None" | "-" | UNAVAILABLE => None,
        value => value.parse::<f64>().ok().filter(|v| v.is_finite()),
    }
}

/// Parse a provider label, treating placeholders as unavailable
pub fn parse_label(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    match raw {
        "" | "None" | "-" | UNAVAILABLE => None,
        value => Some(value.to_string()),
    }
}

/// Market capitalisation as `$x.xB` / `$x.xM`; `None` below one million
pub fn format_market_cap(market_cap: f64) -> Option<String> {
    if market_cap > 1e9 {
        Some(format!("${:.1}B", market_cap / 1e9))
    } else if market_cap > 1e6 {
        Some(format!("${:.1}M", market_cap / 1e6))
    } else {
        None
    }
}

struct Field<'a, T>(&'a Option<T>);

impl<T: fmt::Display> fmt::Display for Field<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => value.fmt(f),
            None => f.write_str(UNAVAILABLE),
        }
    }
}

impl fmt::Display for FundamentalSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pe_ratio: {}, market_cap: {}, dividend_yield: {}, revenue_growth: {}, \
             profit_margin: {}, debt_to_equity: {}, book_value: {}, price_to_book: {}, \
             sector: {}, industry: {}",
            Field(&self.pe_ratio),
            Field(&self.market_cap),
            Field(&self.dividend_yield),
            Field(&self.revenue_growth),
            Field(&self.profit_margin),
            Field(&self.debt_to_equity),
            Field(&self.book_value),
            Field(&self.price_to_book),
            Field(&self.sector),
            Field(&self.industry),
        )
    }
}
