//! Report pipeline: classify, fetch, analyze, respond
//!
//! Every stage returns `Result<_, PipelineError>`; the respond stage matches
//! on the outcome and always produces text, a report or an apology.

use super::context::{Analyzed, Classified, Fetched, PipelineStage};
use super::result::{AnalysisResult, Report};
use crate::chart::ChartData;
use crate::config::ReportConfig;
use crate::error::{PipelineError, Result, StockError};
use crate::indicators::{self, IndicatorFrame};
use crate::market::{self, Market, Resolution};
use crate::prompts::AdvicePrompt;
use crate::provider::{MarketDataProvider, YahooMarketData};
use crate::response;
use crate::series::PriceSeries;
use crate::summary;
use futures::FutureExt;
use report_llm::LanguageModel;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

/// Longest ticker a front end accepts
pub const MAX_INPUT_CHARS: usize = 7;

/// Reject obviously malformed input before running the pipeline
pub fn validate_input(raw: &str) -> Result<&str> {
    let input = raw.trim();
    if input.is_empty() {
        return Err(StockError::InvalidSymbol("enter a stock ticker".to_string()));
    }
    if input.chars().count() > MAX_INPUT_CHARS {
        return Err(StockError::InvalidSymbol("ticker format is invalid".to_string()));
    }
    Ok(input)
}

/// Turns one ticker query into a report
///
/// Holds no per-query state, so one instance can serve any number of
/// sequential queries.
#[derive(Clone)]
pub struct ReportPipeline {
    provider: Arc<dyn MarketDataProvider>,
    language_model: LanguageModel,
    config: ReportConfig,
}

impl ReportPipeline {
    pub fn new(
        provider: impl MarketDataProvider + 'static,
        language_model: LanguageModel,
        config: ReportConfig,
    ) -> Self {
        Self {
            provider: Arc::new(provider),
            language_model,
            config,
        }
    }

    /// Yahoo Finance data and the configured language model
    pub fn from_config(config: ReportConfig) -> Result<Self> {
        config.validate()?;
        let provider = YahooMarketData::new(&config)?;
        let language_model = config.language_model()?;
        info!(
            llm = language_model.name(),
            model = %config.llm_model,
            "Report pipeline ready"
        );
        Ok(Self::new(provider, language_model, config))
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn language_model(&self) -> &LanguageModel {
        &self.language_model
    }

    /// Run a query and return only the user-facing text
    ///
    /// A panic anywhere in the run is caught and reported as
    /// `"Execution failed: <reason>"`.
    pub async fn call(&self, query: &str) -> String {
        match AssertUnwindSafe(self.run(query)).catch_unwind().await {
            Ok(report) => report.result.response_text,
            Err(payload) => {
                let reason = panic_reason(payload.as_ref());
                error!(query, %reason, "Report pipeline panicked");
                format!("Execution failed: {reason}")
            }
        }
    }

    /// Run a query through every stage
    pub async fn run(&self, query: &str) -> Report {
        let query_id = Uuid::new_v4();
        let span = info_span!("report", %query_id, query);
        self.run_stages(query_id, query).instrument(span).await
    }

    /// Indicator frame for chart front ends
    ///
    /// Only exact ticker formats are accepted. Errors propagate.
    pub async fn chart_data(&self, query: &str) -> Result<(IndicatorFrame, Market)> {
        let resolution = market::classify_strict(query)?;
        let series = self.fetch_history(&resolution).await?;
        let frame = indicators::compute(&series)?;
        Ok((frame, resolution.market))
    }

    /// Chart data for a finished report
    ///
    /// Reuses the report's indicator frame when its query is an exact ticker,
    /// so the chart shows the bars the report was built from. Falls back to
    /// [`Self::chart_data`] when the report has no frame.
    pub async fn chart_for(&self, report: &Report) -> Result<ChartData> {
        let strict = market::classify_strict(&report.query)?;

        let reusable = match (&report.frame, &report.resolution) {
            (Some(frame), Some(resolution))
                if resolution.market == strict.market && resolution.ticker == strict.ticker =>
            {
                Some(frame)
            }
            _ => None,
        };

        if let Some(frame) = reusable {
            debug!(ticker = %strict.ticker, rows = frame.len(), "Chart built from report frame");
            return Ok(ChartData::from_frame(strict.ticker, strict.market, frame));
        }

        let (frame, market) = self.chart_data(&report.query).await?;
        Ok(ChartData::from_frame(strict.ticker, market, &frame))
    }

    async fn run_stages(&self, query_id: Uuid, query: &str) -> Report {
        let mut report = Report {
            query_id,
            query: query.to_string(),
            trace: Vec::with_capacity(5),
            resolution: None,
            stats: None,
            frame: None,
            fundamentals: None,
            error: None,
            ai_augmented: false,
            result: AnalysisResult::default(),
        };

        match self.advance(query, &mut report).await {
            Ok(analyzed) => {
                let (result, ai_augmented) = self.respond(&analyzed).await;
                report.result = result;
                report.ai_augmented = ai_augmented;
                report.frame = Some(analyzed.frame);
                report.fundamentals = Some(analyzed.fundamentals);
            }
            Err(e) => {
                warn!(stage = %e.stage(), error = %e, "Query failed");
                report.trace.push(PipelineStage::Errored);
                report.result = AnalysisResult::apology(response::apology(&e));
                report.error = Some(e);
            }
        }

        report.trace.push(PipelineStage::Responded);
        report
    }

    async fn advance(
        &self,
        query: &str,
        report: &mut Report,
    ) -> std::result::Result<Analyzed, PipelineError> {
        let classified = classify(query);
        report.resolution = Some(classified.resolution.clone());
        report.trace.push(PipelineStage::Classified);

        let fetched = self.fetch(classified).await?;
        report.stats = Some(fetched.stats);
        report.trace.push(PipelineStage::Fetched);

        let analyzed = self.analyze(fetched).await?;
        report.trace.push(PipelineStage::Analyzed);
        Ok(analyzed)
    }

    async fn fetch(&self, classified: Classified) -> std::result::Result<Fetched, PipelineError> {
        let Classified { resolution } = classified;
        if !resolution.is_known() {
            return Err(PipelineError::Classification(
                StockError::UnrecognizedTicker(resolution.ticker),
            ));
        }

        let series = self
            .fetch_history(&resolution)
            .await
            .map_err(PipelineError::Fetch)?;
        let stats = series.stats().map_err(PipelineError::Fetch)?;

        info!(rows = series.len(), current_price = stats.current_price, "Fetched price history");
        Ok(Fetched {
            resolution,
            series,
            stats,
        })
    }

    async fn analyze(&self, fetched: Fetched) -> std::result::Result<Analyzed, PipelineError> {
        let Fetched {
            resolution,
            series,
            stats,
        } = fetched;

        let frame = indicators::compute(&series).map_err(PipelineError::Analysis)?;
        let fundamentals = self
            .provider
            .fetch_fundamentals(resolution.market, &resolution.ticker)
            .await;
        let summary = summary::summarize_or_explain(&frame, resolution.intent, &fundamentals);

        debug!(%summary, fundamentals = fundamentals.has_any(), "Analysis complete");
        Ok(Analyzed {
            resolution,
            stats,
            frame,
            fundamentals,
            summary,
        })
    }

    async fn respond(&self, analyzed: &Analyzed) -> (AnalysisResult, bool) {
        let stats = &analyzed.stats;
        let suggestion = response::suggestion(stats.change_pct(), analyzed.latest_rsi());
        let mut text = response::render_report(
            &analyzed.resolution,
            stats,
            &analyzed.summary,
            &analyzed.fundamentals,
            &suggestion,
        );

        let ai_augmented = match self.augment(analyzed).await {
            Some(generated) => {
                response::append_ai_section(&mut text, &generated);
                true
            }
            None => false,
        };

        let result = AnalysisResult {
            summary: analyzed.summary.clone(),
            suggestion,
            response_text: text,
        };
        (result, ai_augmented)
    }

    /// Language-model commentary, or `None` when it cannot be had
    async fn augment(&self, analyzed: &Analyzed) -> Option<String> {
        if !self.language_model.is_enabled() {
            debug!("No language model configured, skipping AI section");
            return None;
        }

        let prompt = AdvicePrompt {
            ticker: &analyzed.resolution.ticker,
            current_price: analyzed.stats.current_price,
            change_pct: analyzed.stats.change_pct(),
            summary: &analyzed.summary,
            fundamentals: &analyzed.fundamentals,
        }
        .render();

        let prompt = match prompt {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(error = %e, "Prompt rendering failed, skipping AI section");
                return None;
            }
        };

        match self
            .language_model
            .generate(&prompt, self.config.llm_timeout)
            .await
        {
            Ok(generated) => Some(generated),
            Err(e) => {
                warn!(
                    llm = self.language_model.name(),
                    error = %e,
                    "Language model failed, skipping AI section"
                );
                None
            }
        }
    }

    async fn fetch_history(&self, resolution: &Resolution) -> Result<PriceSeries> {
        let timeout = self.config.request_timeout;
        let series = tokio::time::timeout(
            timeout,
            self.provider
                .fetch_history(resolution.market, &resolution.ticker),
        )
        .await
        .map_err(|_| StockError::Timeout {
            operation: format!("price history fetch for {}", resolution.ticker),
            after: timeout,
        })??;

        if series.is_empty() {
            return Err(StockError::DataUnavailable {
                symbol: resolution.market.provider_symbol(&resolution.ticker),
                reason: "no rows returned".to_string(),
            });
        }
        Ok(series)
    }
}

impl std::fmt::Debug for ReportPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportPipeline")
            .field("language_model", &self.language_model)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn classify(query: &str) -> Classified {
    let resolution = market::classify(query);
    info!(
        market = %resolution.market,
        ticker = %resolution.ticker,
        intent = ?resolution.intent,
        "Query classified"
    );
    Classified { resolution }
}

fn panic_reason(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fundamentals::FundamentalSnapshot;
    use crate::provider::MockMarketDataProvider;
    use crate::series::fixtures::series_from_closes;
    use async_trait::async_trait;
    use report_llm::{LLMError, LLMProvider};
    use std::time::Duration;

    struct CannedModel(&'static str);

    #[async_trait]
    impl LLMProvider for CannedModel {
        async fn generate(&self, prompt: &str) -> report_llm::Result<String> {
            assert!(prompt.contains("150 words"));
            Ok(self.0.to_string())
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    struct OfflineModel;

    #[async_trait]
    impl LLMProvider for OfflineModel {
        async fn generate(&self, _prompt: &str) -> report_llm::Result<String> {
            Err(LLMError::Unavailable("connection refused".to_string()))
        }

        fn name(&self) -> &str {
            "offline"
        }
    }

    struct SlowMarketData;

    #[async_trait]
    impl MarketDataProvider for SlowMarketData {
        async fn fetch_history(&self, _market: Market, _ticker: &str) -> Result<PriceSeries> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(series_from_closes(&[1.0]))
        }

        async fn fetch_fundamentals(&self, _market: Market, _ticker: &str) -> FundamentalSnapshot {
            FundamentalSnapshot::unavailable()
        }
    }

    struct PanickingMarketData;

    #[async_trait]
    impl MarketDataProvider for PanickingMarketData {
        async fn fetch_history(&self, _market: Market, _ticker: &str) -> Result<PriceSeries> {
            panic!("provider exploded")
        }

        async fn fetch_fundamentals(&self, _market: Market, _ticker: &str) -> FundamentalSnapshot {
            FundamentalSnapshot::unavailable()
        }
    }

    /// 29 flat closes at 100, then a jump to 110
    fn rally() -> PriceSeries {
        let mut closes = vec![100.0; 29];
        closes.push(110.0);
        series_from_closes(&closes)
    }

    fn mock_with(series: PriceSeries) -> MockMarketDataProvider {
        let mut mock = MockMarketDataProvider::new();
        mock.expect_fetch_history()
            .returning(move |_, _| Ok(series.clone()));
        mock.expect_fetch_fundamentals()
            .returning(|_, _| FundamentalSnapshot::unavailable());
        mock
    }

    fn pipeline(provider: impl MarketDataProvider + 'static, model: LanguageModel) -> ReportPipeline {
        ReportPipeline::new(provider, model, ReportConfig::default())
    }

    #[tokio::test]
    async fn test_uptrend_report() {
        let mut mock = MockMarketDataProvider::new();
        let series = rally();
        mock.expect_fetch_history()
            .withf(|market, ticker| *market == Market::Us && ticker.to_string() == "AAPL")
            .times(1)
            .returning(move |_, _| Ok(series.clone()));
        mock.expect_fetch_fundamentals()
            .times(1)
            .returning(|_, _| FundamentalSnapshot::unavailable());

        let report = pipeline(mock, LanguageModel::Unavailable).run("aapl").await;

        assert!(report.is_success());
        assert_eq!(
            report.trace,
            vec![
                PipelineStage::Classified,
                PipelineStage::Fetched,
                PipelineStage::Analyzed,
                PipelineStage::Responded,
            ]
        );

        let text = report.response_text();
        assert!(text.starts_with("📊 US AAPL stock report (last two months)"));
        assert!(text.contains("📊 Change: +10.00 (+10.00%)"));
        assert!(text.contains("📅 Data points: 30 trading days"));
        assert!(report.result.suggestion.starts_with("💡"));
        assert!(text.contains("🔍 Analysis: Price trending up; short-term uptrend"));
        assert!(!text.contains("AI analysis"));
        assert!(!report.ai_augmented);
        assert_eq!(report.frame.as_ref().map(IndicatorFrame::len), Some(30));
    }

    #[tokio::test]
    async fn test_taiwan_ticker_passed_through() {
        let mut mock = MockMarketDataProvider::new();
        mock.expect_fetch_history()
            .withf(|market, ticker| *market == Market::Tw && ticker.to_string() == "2330")
            .returning(|_, _| Ok(series_from_closes(&[500.0, 505.0])));
        mock.expect_fetch_fundamentals()
            .returning(|_, _| FundamentalSnapshot::unavailable());

        let text = pipeline(mock, LanguageModel::Unavailable).call("2330").await;
        assert!(text.starts_with("📊 TW 2330 stock report"));
        assert!(text.contains("+1.00%"));
    }

    #[tokio::test]
    async fn test_fetch_failure_produces_apology() {
        let mut mock = MockMarketDataProvider::new();
        mock.expect_fetch_history().returning(|_, _| {
            Err(StockError::DataUnavailable {
                symbol: "MSFT".to_string(),
                reason: "provider raised".to_string(),
            })
        });
        mock.expect_fetch_fundamentals().never();

        let report = pipeline(mock, LanguageModel::Unavailable).run("MSFT").await;

        assert_eq!(
            report.response_text(),
            "Sorry, failed to fetch stock data: Data not available for MSFT: provider raised"
        );
        assert_eq!(
            report.trace,
            vec![
                PipelineStage::Classified,
                PipelineStage::Errored,
                PipelineStage::Responded,
            ]
        );
        assert_eq!(
            report.error.as_ref().map(PipelineError::stage),
            Some(PipelineStage::Fetched)
        );
        assert!(report.result.summary.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_ticker_never_fetches() {
        let mut mock = MockMarketDataProvider::new();
        mock.expect_fetch_history().never();
        mock.expect_fetch_fundamentals().never();

        let report = pipeline(mock, LanguageModel::Unavailable).run("$$$").await;

        assert!(
            report
                .response_text()
                .starts_with("Sorry, unable to recognize ticker '$$$'")
        );
        assert!(matches!(
            report.error,
            Some(PipelineError::Classification(StockError::UnrecognizedTicker(_)))
        ));
        assert_eq!(report.resolution.map(|r| r.market), Some(Market::Unknown));
    }

    #[tokio::test]
    async fn test_empty_history_is_fetch_error() {
        let report = pipeline(mock_with(PriceSeries::default()), LanguageModel::Unavailable)
            .run("IBM")
            .await;
        assert!(
            report
                .response_text()
                .starts_with("Sorry, failed to fetch stock data: Data not available for IBM")
        );
    }

    #[tokio::test]
    async fn test_analysis_failure() {
        let series = series_from_closes(&[10.0, f64::NAN, 12.0]);
        let report = pipeline(mock_with(series), LanguageModel::Unavailable)
            .run("NVDA")
            .await;

        assert!(
            report
                .response_text()
                .starts_with("Sorry, analysis failed: Missing field: close")
        );
        assert_eq!(
            report.trace,
            vec![
                PipelineStage::Classified,
                PipelineStage::Fetched,
                PipelineStage::Errored,
                PipelineStage::Responded,
            ]
        );
        assert!(report.stats.is_some());
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let config = ReportConfig::builder()
            .request_timeout(Duration::from_millis(20))
            .build()
            .unwrap();
        let pipeline = ReportPipeline::new(SlowMarketData, LanguageModel::Unavailable, config);

        let report = pipeline.run("AMD").await;
        assert!(matches!(
            report.error,
            Some(PipelineError::Fetch(StockError::Timeout { .. }))
        ));
        assert_eq!(
            report.response_text(),
            "Sorry, failed to fetch stock data: price history fetch for AMD timed out after 20ms"
        );
    }

    #[tokio::test]
    async fn test_ai_section_appended() {
        let model = LanguageModel::enabled(CannedModel("Momentum is strong; trim on strength."));
        let report = pipeline(mock_with(rally()), model).run("AAPL").await;

        assert!(report.ai_augmented);
        assert!(
            report
                .response_text()
                .ends_with("\n\n🤖 AI analysis:\n Momentum is strong; trim on strength.")
        );
    }

    #[tokio::test]
    async fn test_llm_failure_is_silent() {
        let with_offline = pipeline(mock_with(rally()), LanguageModel::enabled(OfflineModel))
            .call("AAPL")
            .await;
        let without = pipeline(mock_with(rally()), LanguageModel::Unavailable)
            .call("AAPL")
            .await;

        assert_eq!(with_offline, without);
    }

    #[tokio::test]
    async fn test_panic_becomes_execution_failed() {
        let text = pipeline(PanickingMarketData, LanguageModel::Unavailable)
            .call("AAPL")
            .await;
        assert_eq!(text, "Execution failed: provider exploded");
    }

    #[tokio::test]
    async fn test_pipeline_reusable_across_queries() {
        let pipeline = pipeline(mock_with(rally()), LanguageModel::Unavailable);

        let first = pipeline.run("AAPL").await;
        let second = pipeline.run("MSFT").await;

        assert_ne!(first.query_id, second.query_id);
        assert!(second.response_text().contains("US MSFT"));
    }

    #[tokio::test]
    async fn test_chart_data_is_strict() {
        let mut mock = MockMarketDataProvider::new();
        mock.expect_fetch_history().never();
        let pipeline = pipeline(mock, LanguageModel::Unavailable);

        let err = pipeline.chart_data("XYZ123").await.unwrap_err();
        assert!(matches!(err, StockError::UnrecognizedTicker(_)));
    }

    #[tokio::test]
    async fn test_chart_data() {
        let pipeline = pipeline(mock_with(rally()), LanguageModel::Unavailable);
        let (frame, market) = pipeline.chart_data("2330").await.unwrap();

        assert_eq!(market, Market::Tw);
        assert_eq!(frame.len(), 30);
        assert!(frame.has_rsi());
    }

    #[tokio::test]
    async fn test_chart_for_reuses_report_frame() {
        let mut mock = MockMarketDataProvider::new();
        let series = rally();
        mock.expect_fetch_history()
            .times(1)
            .returning(move |_, _| Ok(series.clone()));
        mock.expect_fetch_fundamentals()
            .returning(|_, _| FundamentalSnapshot::unavailable());
        let pipeline = pipeline(mock, LanguageModel::Unavailable);

        let report = pipeline.run("2330").await;
        let chart = pipeline.chart_for(&report).await.unwrap();

        assert_eq!(chart.ticker, "2330");
        assert_eq!(chart.market, Market::Tw);
        assert_eq!(chart.price.dates.len(), 30);
        assert_eq!(chart.metrics.current_price, 110.0);
    }

    #[tokio::test]
    async fn test_chart_for_failed_report_refetches() {
        let mut mock = MockMarketDataProvider::new();
        let mut calls = 0;
        let series = rally();
        mock.expect_fetch_history()
            .times(2)
            .returning(move |_, _| {
                calls += 1;
                if calls == 1 {
                    Err(StockError::RateLimitExceeded {
                        provider: "yahoo".to_string(),
                    })
                } else {
                    Ok(series.clone())
                }
            });
        let pipeline = pipeline(mock, LanguageModel::Unavailable);

        let report = pipeline.run("AAPL").await;
        assert!(!report.is_success());

        let chart = pipeline.chart_for(&report).await.unwrap();
        assert_eq!(chart.ticker, "AAPL");
        assert_eq!(chart.market, Market::Us);
    }

    #[tokio::test]
    async fn test_chart_for_loose_query_rejected() {
        let pipeline = pipeline(mock_with(rally()), LanguageModel::Unavailable);

        let report = pipeline.run("XYZ123").await;
        assert!(report.is_success());

        let err = pipeline.chart_for(&report).await.unwrap_err();
        assert!(matches!(err, StockError::UnrecognizedTicker(_)));
    }

    #[test]
    fn test_validate_input() {
        assert_eq!(validate_input(" aapl ").unwrap(), "aapl");
        assert_eq!(validate_input("BRK.B").unwrap(), "BRK.B");
        assert!(matches!(
            validate_input("   "),
            Err(StockError::InvalidSymbol(msg)) if msg == "enter a stock ticker"
        ));
        assert!(matches!(
            validate_input("TOOLONG1"),
            Err(StockError::InvalidSymbol(msg)) if msg == "ticker format is invalid"
        ));
    }
}
