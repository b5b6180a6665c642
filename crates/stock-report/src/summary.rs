//! Rule-based analysis summary

use crate::error::{Result, StockError};
use crate::fundamentals::FundamentalSnapshot;
use crate::indicators::{IndicatorFrame, IndicatorRow};
use crate::market::Intent;

pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const RSI_OVERSOLD: f64 = 30.0;

/// Summarise the most recent row of `frame` for `intent`
///
/// Fails with [`StockError::EmptySeries`] when the frame has no rows.
pub fn summarize(
    frame: &IndicatorFrame,
    intent: Intent,
    fundamentals: &FundamentalSnapshot,
) -> Result<String> {
    let latest = frame.latest().ok_or(StockError::EmptySeries)?;
    let signals = technical_signals(latest);

    let summary = match intent {
        Intent::Technical if signals.is_empty() => "technical indicators neutral".to_string(),
        Intent::Technical => format!("Technical: {}", signals.join(", ")),
        Intent::Fundamental => fundamental_summary(fundamentals),
        Intent::Basic => {
            let rising = frame
                .previous()
                .is_some_and(|prev| latest.close() > prev.close());
            let direction = if rising { "up" } else { "down" };

            if signals.is_empty() {
                format!("Price trending {direction}")
            } else {
                format!("Price trending {direction}; {}", signals[..signals.len().min(2)].join(", "))
            }
        }
    };

    Ok(summary)
}

/// [`summarize`], degrading a failure into readable text
pub fn summarize_or_explain(
    frame: &IndicatorFrame,
    intent: Intent,
    fundamentals: &FundamentalSnapshot,
) -> String {
    summarize(frame, intent, fundamentals)
        .unwrap_or_else(|e| format!("summary generation failed: {e}"))
}

fn technical_signals(row: &IndicatorRow) -> Vec<String> {
    let close = row.close();
    let mut signals = Vec::with_capacity(3);

    signals.push(
        if close > row.ma_5 && row.ma_5 > row.ma_20 {
            "short-term uptrend"
        } else if close < row.ma_5 && row.ma_5 < row.ma_20 {
            "short-term downtrend"
        } else {
            "range-bound"
        }
        .to_string(),
    );

    if let Some(rsi) = row.rsi_14 {
        signals.push(if rsi > RSI_OVERBOUGHT {
            "RSI overbought".to_string()
        } else if rsi < RSI_OVERSOLD {
            "RSI oversold".to_string()
        } else {
            format!("RSI neutral ({rsi:.1})")
        });
    }

    if let (Some(upper), Some(lower)) = (row.bb_upper, row.bb_lower) {
        if close > upper {
            signals.push("breakout above upper band".to_string());
        } else if close < lower {
            signals.push("breakdown below lower band".to_string());
        }
    }

    signals
}

fn fundamental_summary(fundamentals: &FundamentalSnapshot) -> String {
    let mut items = Vec::new();
    if let Some(pe) = fundamentals.pe_ratio {
        items.push(format!("P/E {pe}"));
    }
    if let Some(sector) = &fundamentals.sector {
        items.push(format!("sector {sector}"));
    }

    if items.is_empty() {
        "fundamentals limited".to_string()
    } else {
        format!("Fundamentals: {}", items.join(", "))
    }
}
