//! Basic stock report example
//!
//! Runs the full pipeline for one ticker and then prints the indicator rows
//! behind the report.
//!
//! To run this example:
//! ```bash
//! # Alpha Vantage is optional, fundamentals show N/A without it
//! export ALPHA_VANTAGE_API_KEY=your_key_here
//!
//! # No language model needed
//! export STOCK_REPORT_LLM_BACKEND=disabled
//!
//! cargo run --example basic_report -p stock-report AAPL
//! ```

use std::env;
use stock_report::{ReportConfig, ReportPipeline, validate_input};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    report_utils::init_tracing_with("info", report_utils::LogFormat::Pretty);

    let args: Vec<String> = env::args().collect();
    let query = args.get(1).map_or("AAPL", String::as_str);
    let query = validate_input(query)?;

    println!("=== Stock Report ===\n");
    println!("Query: {query}\n");

    let pipeline = ReportPipeline::from_config(ReportConfig::from_env()?)?;
    let report = pipeline.run(query).await;

    let trace: Vec<String> = report.trace.iter().map(ToString::to_string).collect();
    println!("Stages: {}\n", trace.join(" -> "));
    println!("{}\n", report.response_text());

    let Some(frame) = &report.frame else {
        return Ok(());
    };

    println!("=== Last 5 rows ===");
    println!(
        "{:<12}{:>10}{:>10}{:>10}{:>10}{:>8}",
        "date", "close", "ma_5", "ma_20", "ma_60", "rsi"
    );
    for row in frame.rows().iter().rev().take(5).rev() {
        let rsi = row
            .rsi_14
            .map_or_else(|| "-".to_string(), |v| format!("{v:.1}"));
        println!(
            "{:<12}{:>10.2}{:>10.2}{:>10.2}{:>10.2}{:>8}",
            row.bar.date.to_string(),
            row.close(),
            row.ma_5,
            row.ma_20,
            row.ma_60,
            rsi
        );
    }

    Ok(())
}
