//! Report text assembly

use crate::fundamentals::{FundamentalSnapshot, UNAVAILABLE, format_market_cap};
use crate::market::Resolution;
use crate::series::PriceStats;
use crate::summary::{RSI_OVERBOUGHT, RSI_OVERSOLD};
use std::fmt::Write;

/// Two decimals, or `N/A` for a non-finite value
pub fn format_price(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.2}")
    } else {
        UNAVAILABLE.to_string()
    }
}

/// Like [`format_price`] with a `+` for positive values
pub fn format_signed(value: f64) -> String {
    let formatted = format_price(value);
    if value > 0.0 && value.is_finite() {
        format!("+{formatted}")
    } else {
        formatted
    }
}

/// Investment stance keyed on percent change, plus an RSI caveat
pub fn suggestion(change_pct: f64, latest_rsi: Option<f64>) -> String {
    let mut text = if change_pct > 3.0 {
        "💡 Suggestion: strong performance, but manage risk and consider taking some profit"
    } else if change_pct < -3.0 {
        "⚠️  Suggestion: a sizeable drop; it may be a buying opportunity, but check the fundamentals first"
    } else if change_pct.abs() < 1.0 {
        "📝 Suggestion: mild movement; keep watching the trend, suited to regular fixed-amount investing"
    } else {
        "📊 Suggestion: normal volatility; weigh both technicals and fundamentals before deciding"
    }
    .to_string();

    match latest_rsi {
        Some(rsi) if rsi > RSI_OVERBOUGHT => {
            text.push_str(", RSI shows overbought conditions and a short-term pullback is possible");
        }
        Some(rsi) if rsi < RSI_OVERSOLD => {
            text.push_str(", RSI shows oversold conditions and a rebound is possible");
        }
        _ => {}
    }

    text
}

/// Detail lines for the available fundamentals; `None` when nothing is known
pub fn fundamentals_block(fundamentals: &FundamentalSnapshot) -> Option<String> {
    if !fundamentals.has_any() {
        return None;
    }

    let mut block = String::from("\n📈 Fundamentals:\n");
    if let Some(sector) = &fundamentals.sector {
        let _ = writeln!(block, "🏢 Sector: {sector}");
    }
    if let Some(pe) = fundamentals.pe_ratio {
        let _ = writeln!(block, "📊 P/E ratio: {pe}");
    }
    if let Some(cap) = fundamentals.market_cap.and_then(format_market_cap) {
        let _ = writeln!(block, "💼 Market cap: {cap}");
    }
    if let Some(dividend) = fundamentals.dividend_yield.filter(|v| *v > 0.0) {
        let _ = writeln!(block, "💰 Dividend yield: {:.2}%", dividend * 100.0);
    }
    if let Some(margin) = fundamentals.profit_margin.filter(|v| *v > 0.0) {
        let _ = writeln!(block, "📈 Profit margin: {:.2}%", margin * 100.0);
    }
    Some(block)
}

/// Price block, analysis block and suggestion, without the AI section
pub fn render_report(
    resolution: &Resolution,
    stats: &PriceStats,
    summary: &str,
    fundamentals: &FundamentalSnapshot,
    suggestion: &str,
) -> String {
    let mut text = String::new();
    let _ = writeln!(
        text,
        "📊 {} {} stock report (last two months)",
        resolution.market, resolution.ticker
    );
    text.push('\n');
    let _ = writeln!(text, "💰 Current price: {}", format_price(stats.current_price));
    let _ = writeln!(text, "📈 Previous close: {}", format_price(stats.previous_close));
    let _ = writeln!(
        text,
        "📊 Change: {} ({}%)",
        format_signed(stats.change()),
        format_signed(stats.change_pct())
    );
    let _ = writeln!(text, "📅 Data points: {} trading days", stats.data_points);
    text.push('\n');
    let _ = writeln!(text, "🔍 Analysis: {summary}");

    if let Some(block) = fundamentals_block(fundamentals) {
        text.push_str(&block);
    }

    text.push('\n');
    text.push_str(suggestion);
    text
}

/// Append the language model's answer
pub fn append_ai_section(text: &mut String, generated: &str) {
    let _ = write!(text, "\n\n🤖 AI analysis:\n {generated}");
}

/// User-facing text for a failed query
pub fn apology(message: impl std::fmt::Display) -> String {
    format!("Sorry, {message}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::Market;

    fn stats(current: f64, previous: f64) -> PriceStats {
        PriceStats {
            current_price: current,
            previous_close: previous,
            period_high: current.max(previous),
            period_low: current.min(previous),
            avg_volume: 1_000.0,
            data_points: 42,
        }
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(12.345), "12.35");
        assert_eq!(format_price(f64::NAN), "N/A");
        assert_eq!(format_signed(1.5), "+1.50");
        assert_eq!(format_signed(-1.5), "-1.50");
        assert_eq!(format_signed(0.0), "0.00");
        assert_eq!(format_signed(f64::INFINITY), "N/A");
    }

    #[test]
    fn test_suggestion_buckets() {
        assert!(suggestion(10.0, None).starts_with("💡"));
        assert!(suggestion(-3.5, None).starts_with('\u{26a0}'));
        assert!(suggestion(0.5, None).starts_with("📝"));
        assert!(suggestion(-0.99, None).starts_with("📝"));
        assert!(suggestion(2.0, None).starts_with("📊"));
        assert!(suggestion(-3.0, None).starts_with("📊"));
        assert!(suggestion(f64::NAN, None).starts_with("📊"));
    }

    #[test]
    fn test_suggestion_rsi_clause() {
        assert!(suggestion(0.0, Some(75.0)).ends_with("short-term pullback is possible"));
        assert!(suggestion(0.0, Some(25.0)).ends_with("a rebound is possible"));
        assert!(!suggestion(0.0, Some(50.0)).contains("RSI"));
        assert!(!suggestion(0.0, None).contains("RSI"));
    }

    #[test]
    fn test_render_report_layout() {
        let resolution = Resolution::new(Market::Us, "AAPL");
        let stats = stats(110.0, 100.0);
        let advice = suggestion(stats.change_pct(), None);
        let text = render_report(
            &resolution,
            &stats,
            "Price trending up; short-term uptrend",
            &FundamentalSnapshot::unavailable(),
            &advice,
        );

        let expected = "📊 US AAPL stock report (last two months)\n\
                        \n\
                        💰 Current price: 110.00\n\
                        📈 Previous close: 100.00\n\
                        📊 Change: +10.00 (+10.00%)\n\
                        📅 Data points: 42 trading days\n\
                        \n\
                        🔍 Analysis: Price trending up; short-term uptrend\n\
                        \n";
        assert!(text.starts_with(expected), "{text}");
        assert!(text.ends_with(&advice));
        assert!(!text.contains("Fundamentals"));
    }

    #[test]
    fn test_fundamentals_block() {
        let snapshot = FundamentalSnapshot {
            sector: Some("TECHNOLOGY".to_string()),
            pe_ratio: Some(28.5),
            market_cap: Some(2_500_000_000.0),
            dividend_yield: Some(0.0044),
            profit_margin: Some(0.243),
            ..Default::default()
        };

        let block = fundamentals_block(&snapshot).unwrap();
        assert_eq!(
            block,
            "\n📈 Fundamentals:\n\
             🏢 Sector: TECHNOLOGY\n\
             📊 P/E ratio: 28.5\n\
             💼 Market cap: $2.5B\n\
             💰 Dividend yield: 0.44%\n\
             📈 Profit margin: 24.30%\n"
        );

        assert!(fundamentals_block(&FundamentalSnapshot::unavailable()).is_none());
    }

    #[test]
    fn test_small_values_omitted_from_block() {
        let snapshot = FundamentalSnapshot {
            market_cap: Some(10_000.0),
            dividend_yield: Some(0.0),
            ..Default::default()
        };
        assert_eq!(fundamentals_block(&snapshot).unwrap(), "\n📈 Fundamentals:\n");
    }

    #[test]
    fn test_ai_section_and_apology() {
        let mut text = String::from("report");
        append_ai_section(&mut text, "Hold for now.");
        assert_eq!(text, "report\n\n🤖 AI analysis:\n Hold for now.");

        assert_eq!(apology("failed to fetch stock data"), "Sorry, failed to fetch stock data");
    }
}
