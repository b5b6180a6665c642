//! Daily price history

use crate::error::{Result, StockError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Daily bars ordered ascending by date, at most one bar per date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series, sorting by date and keeping the last bar seen for a date
    pub fn new(mut bars: Vec<PriceBar>) -> Self {
        // stable sort keeps arrival order among equal dates
        bars.sort_by_key(|bar| bar.date);

        let mut normalized: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match normalized.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => normalized.push(bar),
            }
        }

        Self { bars: normalized }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.bars.iter().map(|bar| bar.close)
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Headline statistics; fails on an empty series
    pub fn stats(&self) -> Result<PriceStats> {
        PriceStats::from_series(self)
    }
}

impl From<Vec<PriceBar>> for PriceSeries {
    fn from(bars: Vec<PriceBar>) -> Self {
        Self::new(bars)
    }
}

/// Summary statistics over the fetched window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceStats {
    pub current_price: f64,
    /// Second-to-last close, or the current close for a one-row series
    pub previous_close: f64,
    pub period_high: f64,
    pub period_low: f64,
    pub avg_volume: f64,
    pub data_points: usize,
}

impl PriceStats {
    pub fn from_series(series: &PriceSeries) -> Result<Self> {
        let bars = series.bars();
        let last = bars.last().ok_or(StockError::EmptySeries)?;

        let previous_close = match bars.len() {
            0 | 1 => last.close,
            n => bars[n - 2].close,
        };

        let period_high = series.closes().fold(f64::NEG_INFINITY, f64::max);
        let period_low = series.closes().fold(f64::INFINITY, f64::min);
        let total_volume: f64 = bars.iter().map(|bar| bar.volume as f64).sum();

        Ok(Self {
            current_price: last.close,
            previous_close,
            period_high,
            period_low,
            avg_volume: total_volume / bars.len() as f64,
            data_points: bars.len(),
        })
    }

    /// Absolute change from the previous close
    pub fn change(&self) -> f64 {
        self.current_price - self.previous_close
    }

    /// Percent change from the previous close; 0 when the previous close is 0
    pub fn change_pct(&self) -> f64 {
        if self.previous_close == 0.0 {
            0.0
        } else {
            self.change() / self.previous_close * 100.0
        }
    }
}
