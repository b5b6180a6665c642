//! Chart-ready views of an indicator frame
//!
//! Three panels (price with moving averages, RSI, Bollinger bands) plus the
//! headline metrics shown above them. Serialised as JSON for front ends.

use crate::indicators::IndicatorFrame;
use crate::market::Market;
use crate::summary::{RSI_OVERBOUGHT, RSI_OVERSOLD};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub ticker: String,
    pub market: Market,
    pub price: PricePanel,
    pub rsi: RsiPanel,
    pub bollinger: BollingerPanel,
    pub metrics: ChartMetrics,
}

/// Close with the 5/20/60-day moving averages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePanel {
    pub dates: Vec<NaiveDate>,
    pub close: Vec<f64>,
    pub ma_5: Vec<f64>,
    pub ma_20: Vec<f64>,
    pub ma_60: Vec<f64>,
}

/// RSI(14) with the overbought and oversold guide lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsiPanel {
    /// False when every value is undefined (fewer than 14 rows)
    pub available: bool,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<Option<f64>>,
    pub overbought: f64,
    pub oversold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BollingerPanel {
    pub available: bool,
    pub dates: Vec<NaiveDate>,
    pub close: Vec<f64>,
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartMetrics {
    pub current_price: f64,
    /// Close-to-close change of the last day; 0 for a one-row frame
    pub daily_change: f64,
    pub period_high: f64,
    pub period_low: f64,
}

impl ChartData {
    pub fn from_frame(ticker: impl Into<String>, market: Market, frame: &IndicatorFrame) -> Self {
        let rows = frame.rows();
        let dates: Vec<NaiveDate> = rows.iter().map(|row| row.bar.date).collect();
        let close: Vec<f64> = rows.iter().map(|row| row.close()).collect();

        let current_price = close.last().copied().unwrap_or(f64::NAN);
        let daily_change = match (frame.latest(), frame.previous()) {
            (Some(latest), Some(previous)) => latest.close() - previous.close(),
            _ => 0.0,
        };

        Self {
            ticker: ticker.into(),
            market,
            price: PricePanel {
                dates: dates.clone(),
                close: close.clone(),
                ma_5: rows.iter().map(|row| row.ma_5).collect(),
                ma_20: rows.iter().map(|row| row.ma_20).collect(),
                ma_60: rows.iter().map(|row| row.ma_60).collect(),
            },
            rsi: RsiPanel {
                available: frame.has_rsi(),
                dates: dates.clone(),
                values: rows.iter().map(|row| row.rsi_14).collect(),
                overbought: RSI_OVERBOUGHT,
                oversold: RSI_OVERSOLD,
            },
            bollinger: BollingerPanel {
                available: frame.has_bands(),
                dates,
                close: close.clone(),
                upper: rows.iter().map(|row| row.bb_upper).collect(),
                middle: rows.iter().map(|row| row.bb_middle).collect(),
                lower: rows.iter().map(|row| row.bb_lower).collect(),
            },
            metrics: ChartMetrics {
                current_price,
                daily_change,
                period_high: close.iter().copied().fold(f64::NAN, f64::max),
                period_low: close.iter().copied().fold(f64::NAN, f64::min),
            },
        }
    }
}
