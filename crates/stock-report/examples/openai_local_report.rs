//! Stock report with a local LLM behind an OpenAI-compatible API
//!
//! Works with LM Studio, llama.cpp server or vLLM.
//!
//! ```bash
//! export OPENAI_API_BASE="http://localhost:1234/v1"
//! export STOCK_REPORT_LLM_MODEL="your-model-name"
//!
//! cargo run --example openai_local_report -p stock-report 2330
//! ```

use std::env;
use stock_report::{LlmBackend, ReportConfig, ReportPipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    report_utils::init_tracing_with("info,stock_report=debug", report_utils::LogFormat::Pretty);

    let args: Vec<String> = env::args().collect();
    let query = args.get(1).map_or("2330", String::as_str);

    let mut config = ReportConfig::from_env()?;
    config.llm_backend = LlmBackend::OpenAI;

    println!("=== Stock Report with Local LLM ===\n");
    println!("Endpoint: {}", config.llm_api_base);
    println!("Model:    {}\n", config.llm_model);

    let pipeline = ReportPipeline::from_config(config)?;
    let report = pipeline.run(query).await;

    println!("{}", report.response_text());
    if report.is_success() && !report.ai_augmented {
        eprintln!("\n⚠ The language model did not respond, report shown without AI analysis");
    }

    Ok(())
}
