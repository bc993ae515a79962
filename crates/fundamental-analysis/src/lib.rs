pub mod bands;


use analysis_core::{
    AnalysisError, CategoryScores, FundamentalsRecord, Rating, Recommendation, RecommendationScorer,
};

use crate::bands::{metric_points, RULES};

/// Score a fundamentals record into a rating.
///
/// Every metric is scored independently against its bands and added to its category;
/// the total is the plain sum of the five categories. Absent metrics are scored as zero,
/// which can push a metric into its "poor" band (a missing current ratio costs points).
pub fn score(fundamentals: Option<&FundamentalsRecord>) -> Result<Recommendation, AnalysisError> {
    let record = fundamentals.ok_or_else(|| {
        AnalysisError::MissingData("No fundamentals record available".to_string())
    })?;

    let mut category_scores = CategoryScores::default();
    for (category, metric) in RULES {
        category_scores.add(category, metric_points(metric, record));
    }

    let total_score = category_scores.total();
    let rating = Rating::from_total(total_score);

    let details = category_scores
        .iter()
        .filter_map(|(category, points)| category.annotation(points))
        .collect();

    tracing::debug!(
        valuation = category_scores.valuation,
        profitability = category_scores.profitability,
        growth = category_scores.growth,
        financial_health = category_scores.financial_health,
        market_sentiment = category_scores.market_sentiment,
        total_score,
        "Scored fundamentals: {}",
        rating
    );

    Ok(Recommendation {
        total_score,
        rating,
        category_scores,
        details,
    })
}

/// Score a provider's raw info map. Fields that cannot be compared numerically fail the
/// whole call with `ComputationFailure`; nothing is scored from a partially valid map.
pub fn score_json(info: Option<&serde_json::Value>) -> Result<Recommendation, AnalysisError> {
    let info = info.ok_or_else(|| {
        AnalysisError::MissingData("No fundamentals record available".to_string())
    })?;
    let record = FundamentalsRecord::from_json(info)?;
    score(Some(&record))
}

pub struct RecommendationEngine;

impl RecommendationEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn score_json(&self, info: Option<&serde_json::Value>) -> Result<Recommendation, AnalysisError> {
        score_json(info)
    }
}

impl RecommendationScorer for RecommendationEngine {
    fn score(&self, fundamentals: Option<&FundamentalsRecord>) -> Result<Recommendation, AnalysisError> {
        score(fundamentals)
    }
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new()
    }
}
