use analysis_core::{
    AnalysisError, Bar, CompanyProfile, FundamentalsRecord, FundamentalsSource, Recommendation,
    RecommendationScorer, TickerSummary,
};

/// Everything the panels need for one symbol
#[derive(Debug)]
pub struct Dashboard {
    pub symbol: String,
    pub profile: Option<CompanyProfile>,
    pub fundamentals: Option<FundamentalsRecord>,
    pub history: Vec<Bar>,
    pub recommendation: Result<Recommendation, AnalysisError>,
}

/// Trim and upper-case a user-typed ticker. `None` for blank input.
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        None
    } else {
        Some(symbol)
    }
}

/// Fetch everything for `symbol` and score it.
///
/// One quote lookup feeds both the fundamentals and the company panel. Fetch failures
/// never abort the dashboard: a failed quote lookup becomes a `MissingData`
/// recommendation with an empty company panel, a failed history fetch an empty chart panel.
pub async fn analyze_symbol(
    source: &dyn FundamentalsSource,
    scorer: &dyn RecommendationScorer,
    symbol: &str,
    history_days: i64,
) -> Dashboard {
    let (summary, history) = tokio::join!(
        source.fetch_summary(symbol),
        source.fetch_history(symbol, history_days),
    );

    let (profile, fundamentals) = match summary {
        Ok(Some(TickerSummary { profile, fundamentals })) => {
            if let Err(e) = &fundamentals {
                tracing::warn!("Fundamentals for {} are malformed: {}", symbol, e);
            }
            (Some(profile), fundamentals)
        }
        Ok(None) => (
            None,
            Err(AnalysisError::MissingData(format!("No fundamentals found for {}", symbol))),
        ),
        Err(e) => {
            tracing::warn!("Failed to fetch quote summary for {}: {}", symbol, e);
            (
                None,
                Err(AnalysisError::MissingData(format!(
                    "Could not fetch fundamentals for {}: {}",
                    symbol, e
                ))),
            )
        }
    };

    let history = history.unwrap_or_else(|e| {
        tracing::warn!("Failed to fetch price history for {}: {}", symbol, e);
        Vec::new()
    });

    let recommendation = match &fundamentals {
        Ok(record) => scorer.score(Some(record)),
        Err(e) => Err(e.clone()),
    };

    match &recommendation {
        Ok(rec) => tracing::info!("{}: {} (score {})", symbol, rec.rating, rec.total_score),
        Err(e) => tracing::info!("{}: no recommendation ({})", symbol, e),
    }

    Dashboard {
        symbol: symbol.to_string(),
        profile,
        fundamentals: fundamentals.ok(),
        history,
        recommendation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::Rating;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use fundamental_analysis::RecommendationEngine;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory source returning canned answers and counting quote lookups
    struct StubSource {
        summary: Result<Option<TickerSummary>, AnalysisError>,
        history: Result<Vec<Bar>, AnalysisError>,
        summary_calls: AtomicUsize,
    }

    impl StubSource {
        fn new(
            summary: Result<Option<TickerSummary>, AnalysisError>,
            history: Result<Vec<Bar>, AnalysisError>,
        ) -> Self {
            Self { summary, history, summary_calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl FundamentalsSource for StubSource {
        async fn fetch_summary(&self, _symbol: &str) -> Result<Option<TickerSummary>, AnalysisError> {
            self.summary_calls.fetch_add(1, Ordering::SeqCst);
            self.summary.clone()
        }

        async fn fetch_history(&self, _symbol: &str, days: i64) -> Result<Vec<Bar>, AnalysisError> {
            self.history.clone().map(|bars| bars.into_iter().take(days as usize).collect())
        }
    }

    fn sample_bars(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let close = 100.0 + i as f64;
                Bar {
                    timestamp: Utc::now() - Duration::days((n - i) as i64),
                    open: close - 0.5,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1_000_000.0,
                }
            })
            .collect()
    }

    fn healthy_record() -> FundamentalsRecord {
        FundamentalsRecord {
            trailing_pe: Some(15.0),
            forward_pe: Some(14.0),
            price_to_book: Some(2.0),
            price_to_sales: Some(3.0),
            ..Default::default()
        }
    }

    fn summary_of(fundamentals: Result<FundamentalsRecord, AnalysisError>) -> TickerSummary {
        TickerSummary {
            profile: CompanyProfile { symbol: "TEST".into(), ..Default::default() },
            fundamentals,
        }
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("  aapl "), Some("AAPL".to_string()));
        assert_eq!(normalize_symbol("brk.b"), Some("BRK.B".to_string()));
        assert_eq!(normalize_symbol("   "), None);
    }

    #[tokio::test]
    async fn test_analyze_symbol_scores_fetched_record() {
        let source = StubSource::new(Ok(Some(summary_of(Ok(healthy_record())))), Ok(sample_bars(30)));

        let dashboard = analyze_symbol(&source, &RecommendationEngine::new(), "TEST", 10).await;

        let rec = dashboard.recommendation.unwrap();
        assert_eq!(rec.category_scores.valuation, 20);
        assert_eq!(rec.rating, Rating::Hold);
        assert!(dashboard.profile.is_some());
        assert_eq!(dashboard.history.len(), 10);
        assert!(dashboard.fundamentals.is_some());
    }

    #[tokio::test]
    async fn test_one_quote_lookup_per_analysis() {
        let source = StubSource::new(Ok(Some(summary_of(Ok(healthy_record())))), Ok(sample_bars(3)));

        let dashboard = analyze_symbol(&source, &RecommendationEngine::new(), "TEST", 365).await;

        assert_eq!(source.summary_calls.load(Ordering::SeqCst), 1);
        assert!(dashboard.profile.is_some());
        assert!(dashboard.recommendation.is_ok());
    }

    #[tokio::test]
    async fn test_default_fetchers_read_the_summary() {
        let source = StubSource::new(Ok(Some(summary_of(Ok(healthy_record())))), Ok(Vec::new()));

        assert_eq!(source.fetch_fundamentals("TEST").await.unwrap(), Some(healthy_record()));
        assert_eq!(source.fetch_profile("TEST").await.unwrap().map(|p| p.symbol), Some("TEST".to_string()));

        let malformed = StubSource::new(
            Ok(Some(summary_of(Err(AnalysisError::ComputationFailure("beta".into()))))),
            Ok(Vec::new()),
        );
        assert!(matches!(
            malformed.fetch_fundamentals("TEST").await,
            Err(AnalysisError::ComputationFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_ticker_is_missing_data() {
        let source = StubSource::new(Ok(None), Ok(Vec::new()));

        let dashboard = analyze_symbol(&source, &RecommendationEngine::new(), "NOPE", 365).await;

        assert!(matches!(dashboard.recommendation, Err(AnalysisError::MissingData(_))));
        assert!(dashboard.fundamentals.is_none());
        assert!(dashboard.profile.is_none());
    }

    #[tokio::test]
    async fn test_fetch_errors_degrade_to_empty_panels() {
        let source = StubSource::new(
            Err(AnalysisError::ApiError("HTTP 500".into())),
            Err(AnalysisError::ApiError("HTTP 500".into())),
        );

        let dashboard = analyze_symbol(&source, &RecommendationEngine::new(), "AAPL", 365).await;

        match dashboard.recommendation {
            Err(AnalysisError::MissingData(msg)) => assert!(msg.contains("HTTP 500")),
            other => panic!("expected MissingData, got {other:?}"),
        }
        assert!(dashboard.profile.is_none());
        assert!(dashboard.history.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_fundamentals_stay_computation_failure() {
        let source = StubSource::new(
            Ok(Some(summary_of(Err(AnalysisError::ComputationFailure(
                "field beta is not numeric".into(),
            ))))),
            Ok(sample_bars(5)),
        );

        let dashboard = analyze_symbol(&source, &RecommendationEngine::new(), "AAPL", 365).await;

        assert!(matches!(dashboard.recommendation, Err(AnalysisError::ComputationFailure(_))));
        assert!(dashboard.profile.is_some());
        assert_eq!(dashboard.history.len(), 5);
    }
}
