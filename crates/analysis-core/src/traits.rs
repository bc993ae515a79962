use async_trait::async_trait;
use crate::{AnalysisError, Bar, CompanyProfile, FundamentalsRecord, Recommendation, TickerSummary};

/// Trait for fundamentals scoring engines
pub trait RecommendationScorer: Send + Sync {
    fn score(&self, fundamentals: Option<&FundamentalsRecord>) -> Result<Recommendation, AnalysisError>;
}

/// Trait for ticker data providers.
///
/// `Ok(None)` means the provider answered but knows nothing about the symbol.
#[async_trait]
pub trait FundamentalsSource: Send + Sync {
    /// Fundamentals and company snapshot from a single provider lookup
    async fn fetch_summary(&self, symbol: &str) -> Result<Option<TickerSummary>, AnalysisError>;

    async fn fetch_fundamentals(&self, symbol: &str) -> Result<Option<FundamentalsRecord>, AnalysisError> {
        self.fetch_summary(symbol).await?.map(|s| s.fundamentals).transpose()
    }

    async fn fetch_profile(&self, symbol: &str) -> Result<Option<CompanyProfile>, AnalysisError> {
        Ok(self.fetch_summary(symbol).await?.map(|s| s.profile))
    }

    async fn fetch_history(&self, symbol: &str, days: i64) -> Result<Vec<Bar>, AnalysisError>;
}
