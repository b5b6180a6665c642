//! Prompt sent to the language model for the AI section

use crate::error::Result;
use crate::fundamentals::FundamentalSnapshot;
use minijinja::Environment;
use serde::Serialize;

const ADVICE_TEMPLATE: &str = "\
You are a professional stock analyst. Give investment advice based on the information below.
Ticker: {{ ticker }}
Current price: {{ current_price | round(2) }}
Change: {{ change_pct | round(2) }}%
Technical indicators: {{ summary }}
Fundamentals: {{ fundamentals }}
Give professional investment advice in no more than 150 words.";

/// Values interpolated into the advice prompt
#[derive(Debug, Clone, Serialize)]
pub struct AdvicePrompt<'a> {
    pub ticker: &'a str,
    pub current_price: f64,
    pub change_pct: f64,
    pub summary: &'a str,
    #[serde(serialize_with = "serialize_display")]
    pub fundamentals: &'a FundamentalSnapshot,
}

fn serialize_display<S: serde::Serializer>(
    value: &&FundamentalSnapshot,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

impl AdvicePrompt<'_> {
    pub fn render(&self) -> Result<String> {
        let env = Environment::new();
        let value = minijinja::Value::from_serialize(self);
        Ok(env.render_str(ADVICE_TEMPLATE, value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_advice_prompt() {
        let fundamentals = FundamentalSnapshot {
            pe_ratio: Some(30.1),
            ..Default::default()
        };
        let prompt = AdvicePrompt {
            ticker: "AAPL",
            current_price: 189.456,
            change_pct: 1.2345,
            summary: "Price trending up; short-term uptrend",
            fundamentals: &fundamentals,
        }
        .render()
        .unwrap();

        assert!(prompt.contains("Ticker: AAPL"));
        assert!(prompt.contains("Current price: 189.46"));
        assert!(prompt.contains("Change: 1.23%"));
        assert!(prompt.contains("Technical indicators: Price trending up; short-term uptrend"));
        assert!(prompt.contains("Fundamentals: pe_ratio: 30.1, market_cap: N/A"));
        assert!(prompt.ends_with("no more than 150 words."));
    }
}
