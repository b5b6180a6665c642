//! Command-line front end for stock reports
//!
//! # Usage
//!
//! ```bash
//! # One report
//! stock-report AAPL
//!
//! # Taiwan listing, chart data written alongside
//! stock-report 2330 --chart-json 2330.json
//!
//! # Several tickers, one per line, without the AI section
//! stock-report --interactive --llm disabled
//! ```

use anyhow::Context;
use clap::Parser;
use report_utils::{LogFormat, ProcessEnv, init_tracing_with};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use stock_report::response::{format_price, format_signed};
use stock_report::{LlmBackend, Report, ReportConfig, ReportPipeline, validate_input};
use tracing::{info, warn};

const DEFAULT_LOG_FILTER: &str = "warn,stock_report=info,report_cli=info";

#[derive(Parser, Debug)]
#[command(name = "stock-report", version)]
#[command(about = "Two-month technical report for a US or Taiwan stock ticker", long_about = None)]
struct Args {
    /// Ticker to report on, e.g. AAPL or 2330
    #[arg(required_unless_present = "interactive")]
    ticker: Option<String>,

    /// Read tickers from stdin, one per line, until EOF or `exit`
    #[arg(short, long)]
    interactive: bool,

    /// Also write chart data as JSON to this path
    #[arg(long, value_name = "PATH")]
    chart_json: Option<PathBuf>,

    /// Language model backend: ollama, openai or disabled
    #[arg(long, value_name = "BACKEND")]
    llm: Option<LlmBackend>,

    /// Model name passed to the language model backend
    #[arg(long, value_name = "NAME")]
    model: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let format = if args.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing_with(DEFAULT_LOG_FILTER, format);

    // One query at a time
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;

    runtime.block_on(run(args))
}

async fn run(args: Args) -> anyhow::Result<()> {
    // Flags take precedence over the environment
    let mut builder = ReportConfig::builder().with_vars(&ProcessEnv)?;
    if let Some(backend) = args.llm {
        builder = builder.llm_backend(backend);
    }
    if let Some(model) = &args.model {
        builder = builder.llm_model(model.as_str());
    }
    let config = builder.build()?;

    let pipeline = ReportPipeline::from_config(config)?;
    info!(llm = pipeline.language_model().name(), "Starting stock-report");

    if args.interactive {
        return interactive(&pipeline, args.chart_json.as_deref()).await;
    }

    let Some(ticker) = args.ticker.as_deref() else {
        anyhow::bail!("a ticker is required unless --interactive is given");
    };
    let input = validate_input(ticker)?;
    report_once(&pipeline, input, args.chart_json.as_deref()).await
}

async fn interactive(pipeline: &ReportPipeline, chart_json: Option<&Path>) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("ticker> ");
        stdout.flush()?;

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                // EOF
                println!();
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {e}");
                continue;
            }
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        let outcome = match validate_input(line) {
            Ok(input) => report_once(pipeline, input, chart_json).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = outcome {
            eprintln!("❌ {e}\n");
        }
    }

    Ok(())
}

async fn report_once(
    pipeline: &ReportPipeline,
    input: &str,
    chart_json: Option<&Path>,
) -> anyhow::Result<()> {
    let report = pipeline.run(input).await;
    println!("{}\n", report.response_text());

    if report.is_success() {
        print_statistics(&report);
    }

    if let Some(path) = chart_json {
        write_chart(pipeline, &report, path).await?;
    }

    Ok(())
}

fn print_statistics(report: &Report) {
    let Some(stats) = &report.stats else {
        return;
    };

    println!("Statistics");
    println!("  Current price : {}", format_price(stats.current_price));
    println!("  Daily change  : {}", format_signed(stats.change()));
    println!("  Period high   : {}", format_price(stats.period_high));
    println!("  Period low    : {}", format_price(stats.period_low));
    println!();
}

async fn write_chart(pipeline: &ReportPipeline, report: &Report, path: &Path) -> anyhow::Result<()> {
    let chart = match pipeline.chart_for(report).await {
        Ok(chart) => chart,
        Err(e) => {
            warn!(error = %e, "Chart data unavailable");
            eprintln!("Chart not written: {e}");
            return Ok(());
        }
    };

    let json = serde_json::to_string_pretty(&chart)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write chart data to {}", path.display()))?;
    info!(path = %path.display(), rows = chart.price.dates.len(), "Chart data written");
    Ok(())
}
