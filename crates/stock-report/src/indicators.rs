//! Technical indicator engine
//!
//! Every window uses minimum-period semantics: a window of size N over fewer
//! than N rows averages whatever rows exist, so the moving averages have a
//! value from the very first row. RSI and Bollinger bands are withheld
//! entirely when the series is shorter than their nominal period.

use crate::error::{Result, StockError};
use crate::series::{PriceBar, PriceSeries};
use serde::{Deserialize, Serialize};
use ta::Next;
use ta::indicators::SimpleMovingAverage;

pub const MA_SHORT: usize = 5;
pub const MA_MEDIUM: usize = 20;
pub const MA_LONG: usize = 60;
pub const RSI_PERIOD: usize = 14;
pub const BB_PERIOD: usize = 20;
pub const BB_STD_MULTIPLIER: f64 = 2.0;

/// Added to the average loss so a loss-free window does not divide by zero
const RSI_EPSILON: f64 = 1e-10;

/// A price bar with its derived indicator values
///
/// `None` marks an undefined value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    #[serde(flatten)]
    pub bar: PriceBar,
    pub ma_5: f64,
    pub ma_20: f64,
    pub ma_60: f64,
    pub rsi_14: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
}

impl IndicatorRow {
    pub fn close(&self) -> f64 {
        self.bar.close
    }
}

/// A price series with indicator columns, aligned row for row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorFrame {
    rows: Vec<IndicatorRow>,
}

impl IndicatorFrame {
    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Most recent row
    pub fn latest(&self) -> Option<&IndicatorRow> {
        self.rows.last()
    }

    /// Row before the most recent one
    pub fn previous(&self) -> Option<&IndicatorRow> {
        self.rows.len().checked_sub(2).map(|i| &self.rows[i])
    }

    /// Whether any row carries an RSI value
    pub fn has_rsi(&self) -> bool {
        self.rows.iter().any(|row| row.rsi_14.is_some())
    }

    /// Whether any row carries a Bollinger middle band
    pub fn has_bands(&self) -> bool {
        self.rows.iter().any(|row| row.bb_middle.is_some())
    }
}

/// Compute the indicator frame for `series`
///
/// Fails with [`StockError::MissingField`] when a close price is not a finite
/// number. An empty series yields an empty frame.
pub fn compute(series: &PriceSeries) -> Result<IndicatorFrame> {
    let closes: Vec<f64> = series.closes().collect();
    if let Some(i) = closes.iter().position(|c| !c.is_finite()) {
        return Err(StockError::MissingField(format!(
            "close (row {i} of {})",
            closes.len()
        )));
    }

    let ma_5 = rolling_mean(&closes, MA_SHORT)?;
    let ma_20 = rolling_mean(&closes, MA_MEDIUM)?;
    let ma_60 = rolling_mean(&closes, MA_LONG)?;

    let rsi = if closes.len() >= RSI_PERIOD {
        rsi(&closes, RSI_PERIOD)?
    } else {
        vec![None; closes.len()]
    };

    let bands = if closes.len() >= BB_PERIOD {
        bollinger(&closes, BB_PERIOD, BB_STD_MULTIPLIER)?
    } else {
        vec![Bands::default(); closes.len()]
    };

    let rows = series
        .bars()
        .iter()
        .enumerate()
        .map(|(i, bar)| IndicatorRow {
            bar: bar.clone(),
            ma_5: ma_5[i],
            ma_20: ma_20[i],
            ma_60: ma_60[i],
            rsi_14: rsi[i],
            bb_upper: bands[i].upper,
            bb_middle: bands[i].middle,
            bb_lower: bands[i].lower,
        })
        .collect();

    Ok(IndicatorFrame { rows })
}

fn sma(period: usize) -> Result<SimpleMovingAverage> {
    SimpleMovingAverage::new(period).map_err(|e| StockError::IndicatorError(e.to_string()))
}

/// Trailing mean over at most `period` values
fn rolling_mean(values: &[f64], period: usize) -> Result<Vec<f64>> {
    let mut average = sma(period)?;
    Ok(values.iter().map(|&v| average.next(v)).collect())
}

/// RSI with simple-mean smoothing
///
/// Row 0 has no price change and stays undefined; its absent delta is left
/// out of the later windows instead of counting as a zero change.
fn rsi(closes: &[f64], period: usize) -> Result<Vec<Option<f64>>> {
    let mut avg_gain = sma(period)?;
    let mut avg_loss = sma(period)?;

    let mut out = Vec::with_capacity(closes.len());
    if !closes.is_empty() {
        out.push(None);
    }

    for pair in closes.windows(2) {
        let delta = pair[1] - pair[0];
        let gain = avg_gain.next(delta.max(0.0));
        let loss = avg_loss.next((-delta).max(0.0));

        let rs = gain / (loss + RSI_EPSILON);
        out.push(Some(100.0 - 100.0 / (1.0 + rs)));
    }

    Ok(out)
}

#[derive(Debug, Clone, Copy, Default)]
struct Bands {
    upper: Option<f64>,
    middle: Option<f64>,
    lower: Option<f64>,
}

/// Bollinger bands around a trailing mean
///
/// The width uses the sample standard deviation, which needs two values, so
/// the first row has a middle band but no upper or lower band.
fn bollinger(closes: &[f64], period: usize, multiplier: f64) -> Result<Vec<Bands>> {
    let middle = rolling_mean(closes, period)?;

    Ok(middle
        .iter()
        .enumerate()
        .map(|(i, &mid)| {
            let start = (i + 1).saturating_sub(period);
            let width = sample_std(&closes[start..=i]).map(|std| multiplier * std);
            Bands {
                upper: width.map(|w| mid + w),
                middle: Some(mid),
                lower: width.map(|w| mid - w),
            }
        })
        .collect())
}

fn sample_std(window: &[f64]) -> Option<f64> {
    if window.len() < 2 {
        return None;
    }
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}
