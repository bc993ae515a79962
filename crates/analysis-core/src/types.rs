use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AnalysisError;

/// OHLCV bar data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Company snapshot shown next to the recommendation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub symbol: String,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub volume: Option<u64>,
    pub trailing_pe: Option<f64>,
    pub dividend_yield: Option<f64>,
}

/// Every metric the recommendation scorer reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    TrailingPe,
    ForwardPe,
    PriceToBook,
    PriceToSales,
    ProfitMargin,
    OperatingMargin,
    ReturnOnEquity,
    ReturnOnAssets,
    RevenueGrowth,
    EarningsGrowth,
    EarningsQuarterlyGrowth,
    CurrentRatio,
    DebtToEquity,
    QuickRatio,
    Beta,
    DividendYield,
    ShortRatio,
}

impl Metric {
    pub const ALL: [Metric; 17] = [
        Metric::TrailingPe,
        Metric::ForwardPe,
        Metric::PriceToBook,
        Metric::PriceToSales,
        Metric::ProfitMargin,
        Metric::OperatingMargin,
        Metric::ReturnOnEquity,
        Metric::ReturnOnAssets,
        Metric::RevenueGrowth,
        Metric::EarningsGrowth,
        Metric::EarningsQuarterlyGrowth,
        Metric::CurrentRatio,
        Metric::DebtToEquity,
        Metric::QuickRatio,
        Metric::Beta,
        Metric::DividendYield,
        Metric::ShortRatio,
    ];

    /// Key used by quote providers (and by the record's JSON form)
    pub fn key(&self) -> &'static str {
        match self {
            Metric::TrailingPe => "trailingPE",
            Metric::ForwardPe => "forwardPE",
            Metric::PriceToBook => "priceToBook",
            Metric::PriceToSales => "priceToSalesTrailing12Months",
            Metric::ProfitMargin => "profitMargins",
            Metric::OperatingMargin => "operatingMargins",
            Metric::ReturnOnEquity => "returnOnEquity",
            Metric::ReturnOnAssets => "returnOnAssets",
            Metric::RevenueGrowth => "revenueGrowth",
            Metric::EarningsGrowth => "earningsGrowth",
            Metric::EarningsQuarterlyGrowth => "earningsQuarterlyGrowth",
            Metric::CurrentRatio => "currentRatio",
            Metric::DebtToEquity => "debtToEquity",
            Metric::QuickRatio => "quickRatio",
            Metric::Beta => "beta",
            Metric::DividendYield => "dividendYield",
            Metric::ShortRatio => "shortRatio",
        }
    }
}

/// Fundamental ratios for one ticker, as supplied by a data source.
///
/// Every field is optional. Scoring reads fields through [`FundamentalsRecord::value`],
/// which treats an absent value exactly like `0.0`. A missing debt/equity therefore
/// scores as "no debt" and a missing current ratio as "illiquid"; callers that need to
/// tell the two apart should look at [`FundamentalsRecord::get`] instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalsRecord {
    #[serde(rename = "trailingPE", default)]
    pub trailing_pe: Option<f64>,
    #[serde(rename = "forwardPE", default)]
    pub forward_pe: Option<f64>,
    #[serde(rename = "priceToBook", default)]
    pub price_to_book: Option<f64>,
    #[serde(rename = "priceToSalesTrailing12Months", default)]
    pub price_to_sales: Option<f64>,
    #[serde(rename = "profitMargins", default)]
    pub profit_margin: Option<f64>,
    #[serde(rename = "operatingMargins", default)]
    pub operating_margin: Option<f64>,
    #[serde(rename = "returnOnEquity", default)]
    pub return_on_equity: Option<f64>,
    #[serde(rename = "returnOnAssets", default)]
    pub return_on_assets: Option<f64>,
    #[serde(rename = "revenueGrowth", default)]
    pub revenue_growth: Option<f64>,
    #[serde(rename = "earningsGrowth", default)]
    pub earnings_growth: Option<f64>,
    #[serde(rename = "earningsQuarterlyGrowth", default)]
    pub earnings_quarterly_growth: Option<f64>,
    #[serde(rename = "currentRatio", default)]
    pub current_ratio: Option<f64>,
    #[serde(rename = "debtToEquity", default)]
    pub debt_to_equity: Option<f64>,
    #[serde(rename = "quickRatio", default)]
    pub quick_ratio: Option<f64>,
    #[serde(default)]
    pub beta: Option<f64>,
    #[serde(rename = "dividendYield", default)]
    pub dividend_yield: Option<f64>,
    #[serde(rename = "shortRatio", default)]
    pub short_ratio: Option<f64>,
}

impl FundamentalsRecord {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::TrailingPe => self.trailing_pe,
            Metric::ForwardPe => self.forward_pe,
            Metric::PriceToBook => self.price_to_book,
            Metric::PriceToSales => self.price_to_sales,
            Metric::ProfitMargin => self.profit_margin,
            Metric::OperatingMargin => self.operating_margin,
            Metric::ReturnOnEquity => self.return_on_equity,
            Metric::ReturnOnAssets => self.return_on_assets,
            Metric::RevenueGrowth => self.revenue_growth,
            Metric::EarningsGrowth => self.earnings_growth,
            Metric::EarningsQuarterlyGrowth => self.earnings_quarterly_growth,
            Metric::CurrentRatio => self.current_ratio,
            Metric::DebtToEquity => self.debt_to_equity,
            Metric::QuickRatio => self.quick_ratio,
            Metric::Beta => self.beta,
            Metric::DividendYield => self.dividend_yield,
            Metric::ShortRatio => self.short_ratio,
        }
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        let slot = match metric {
            Metric::TrailingPe => &mut self.trailing_pe,
            Metric::ForwardPe => &mut self.forward_pe,
            Metric::PriceToBook => &mut self.price_to_book,
            Metric::PriceToSales => &mut self.price_to_sales,
            Metric::ProfitMargin => &mut self.profit_margin,
            Metric::OperatingMargin => &mut self.operating_margin,
            Metric::ReturnOnEquity => &mut self.return_on_equity,
            Metric::ReturnOnAssets => &mut self.return_on_assets,
            Metric::RevenueGrowth => &mut self.revenue_growth,
            Metric::EarningsGrowth => &mut self.earnings_growth,
            Metric::EarningsQuarterlyGrowth => &mut self.earnings_quarterly_growth,
            Metric::CurrentRatio => &mut self.current_ratio,
            Metric::DebtToEquity => &mut self.debt_to_equity,
            Metric::QuickRatio => &mut self.quick_ratio,
            Metric::Beta => &mut self.beta,
            Metric::DividendYield => &mut self.dividend_yield,
            Metric::ShortRatio => &mut self.short_ratio,
        };
        *slot = value;
    }

    /// Value used for threshold comparisons: absent reads as zero.
    pub fn value(&self, metric: Metric) -> f64 {
        self.get(metric).unwrap_or(0.0)
    }

    /// Build a record from a provider's loosely typed info map.
    ///
    /// Accepts plain numbers, booleans (as 1/0) and Yahoo-style `{"raw": n, "fmt": ".."}`
    /// wrappers. `null` and missing keys become `None`. Anything else cannot be compared
    /// numerically and fails the whole record.
    pub fn from_json(info: &serde_json::Value) -> Result<Self, AnalysisError> {
        let map = info.as_object().ok_or_else(|| {
            AnalysisError::ComputationFailure(format!(
                "fundamentals must be a JSON object, got {}",
                json_kind(info)
            ))
        })?;

        let mut record = Self::default();
        for metric in Metric::ALL {
            let key = metric.key();
            let value = match map.get(key) {
                None => None,
                Some(v) => numeric_field(key, v)?,
            };
            record.set(metric, value);
        }
        Ok(record)
    }
}

fn numeric_field(key: &str, value: &serde_json::Value) -> Result<Option<f64>, AnalysisError> {
    use serde_json::Value;

    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_f64().map(Some).ok_or_else(|| {
            AnalysisError::ComputationFailure(format!("field {} is out of f64 range", key))
        }),
        Value::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
        Value::Object(obj) if obj.contains_key("raw") => match obj.get("raw") {
            Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            _ => Err(AnalysisError::ComputationFailure(format!(
                "field {} has a non-numeric raw value",
                key
            ))),
        },
        // An empty object is how quoteSummary reports "no value"
        Value::Object(obj) if obj.is_empty() => Ok(None),
        other => Err(AnalysisError::ComputationFailure(format!(
            "field {} is not numeric: {}",
            key, other
        ))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;

    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Everything one quote lookup yields for a ticker.
///
/// The profile survives even when the provider's map cannot be read as fundamentals.
#[derive(Debug, Clone)]
pub struct TickerSummary {
    pub profile: CompanyProfile,
    pub fundamentals: Result<FundamentalsRecord, AnalysisError>,
}

/// The five independently scored buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    Valuation,
    Profitability,
    Growth,
    FinancialHealth,
    MarketSentiment,
}

impl ScoreCategory {
    pub const ALL: [ScoreCategory; 5] = [
        ScoreCategory::Valuation,
        ScoreCategory::Profitability,
        ScoreCategory::Growth,
        ScoreCategory::FinancialHealth,
        ScoreCategory::MarketSentiment,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ScoreCategory::Valuation => "valuation",
            ScoreCategory::Profitability => "profitability",
            ScoreCategory::Growth => "growth",
            ScoreCategory::FinancialHealth => "financial_health",
            ScoreCategory::MarketSentiment => "market_sentiment",
        }
    }

    /// Key with underscores replaced by spaces, each word capitalized
    pub fn display_name(&self) -> String {
        self.key()
            .split('_')
            .map(capitalize_first)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Strength/weakness note for a category score, if the score earns one.
    pub fn annotation(&self, score: i32) -> Option<String> {
        let prefix = if score >= 15 {
            "Strong"
        } else if score >= 10 {
            "Good"
        } else if score < 0 {
            "Poor"
        } else {
            return None;
        };
        Some(format!("{} {}", prefix, self.display_name()))
    }
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

/// Per-category point totals. Not clamped: a category can land above 20 or below zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub valuation: i32,
    pub profitability: i32,
    pub growth: i32,
    pub financial_health: i32,
    pub market_sentiment: i32,
}

impl CategoryScores {
    pub fn get(&self, category: ScoreCategory) -> i32 {
        match category {
            ScoreCategory::Valuation => self.valuation,
            ScoreCategory::Profitability => self.profitability,
            ScoreCategory::Growth => self.growth,
            ScoreCategory::FinancialHealth => self.financial_health,
            ScoreCategory::MarketSentiment => self.market_sentiment,
        }
    }

    pub fn add(&mut self, category: ScoreCategory, points: i32) {
        match category {
            ScoreCategory::Valuation => self.valuation += points,
            ScoreCategory::Profitability => self.profitability += points,
            ScoreCategory::Growth => self.growth += points,
            ScoreCategory::FinancialHealth => self.financial_health += points,
            ScoreCategory::MarketSentiment => self.market_sentiment += points,
        }
    }

    pub fn total(&self) -> i32 {
        ScoreCategory::ALL.iter().map(|c| self.get(*c)).sum()
    }

    /// (category, score) pairs in display order
    pub fn iter(&self) -> impl Iterator<Item = (ScoreCategory, i32)> + '_ {
        ScoreCategory::ALL.iter().map(move |c| (*c, self.get(*c)))
    }
}

/// Discrete recommendation, ordered from most bearish to most bullish
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rating {
    StrongSell,
    Sell,
    Hold,
    Buy,
    StrongBuy,
}

impl Rating {
    pub fn from_total(total: i32) -> Self {
        match total {
            s if s >= 60 => Rating::StrongBuy,
            s if s >= 40 => Rating::Buy,
            s if s >= 20 => Rating::Hold,
            s if s >= 0 => Rating::Sell,
            _ => Rating::StrongSell,
        }
    }

    /// Human-readable label for the rating
    pub fn to_label(&self) -> &'static str {
        match self {
            Rating::StrongBuy => "Strong Buy",
            Rating::Buy => "Buy",
            Rating::Hold => "Hold",
            Rating::Sell => "Sell",
            Rating::StrongSell => "Strong Sell",
        }
    }

    pub fn is_bullish(&self) -> bool {
        matches!(self, Rating::Buy | Rating::StrongBuy)
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_label())
    }
}

/// Scorer output for one fundamentals record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub total_score: i32,
    pub rating: Rating,
    pub category_scores: CategoryScores,
    /// Strength/weakness notes, in category order
    pub details: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_name_title_cases_words() {
        assert_eq!(ScoreCategory::FinancialHealth.display_name(), "Financial Health");
        assert_eq!(ScoreCategory::MarketSentiment.display_name(), "Market Sentiment");
        assert_eq!(ScoreCategory::Growth.display_name(), "Growth");
    }

    #[test]
    fn test_annotation_tiers() {
        let c = ScoreCategory::Profitability;
        assert_eq!(c.annotation(20).as_deref(), Some("Strong Profitability"));
        assert_eq!(c.annotation(15).as_deref(), Some("Strong Profitability"));
        assert_eq!(c.annotation(14).as_deref(), Some("Good Profitability"));
        assert_eq!(c.annotation(10).as_deref(), Some("Good Profitability"));
        assert_eq!(c.annotation(9), None);
        assert_eq!(c.annotation(0), None);
        assert_eq!(c.annotation(-1).as_deref(), Some("Poor Profitability"));
    }

    #[test]
    fn test_rating_ladder() {
        assert_eq!(Rating::from_total(60), Rating::StrongBuy);
        assert_eq!(Rating::from_total(59), Rating::Buy);
        assert_eq!(Rating::from_total(40), Rating::Buy);
        assert_eq!(Rating::from_total(39), Rating::Hold);
        assert_eq!(Rating::from_total(20), Rating::Hold);
        assert_eq!(Rating::from_total(19), Rating::Sell);
        assert_eq!(Rating::from_total(0), Rating::Sell);
        assert_eq!(Rating::from_total(-1), Rating::StrongSell);
        assert_eq!(Rating::StrongBuy.to_string(), "Strong Buy");
    }

    #[test]
    fn test_record_json_uses_provider_keys() {
        let record = FundamentalsRecord {
            trailing_pe: Some(15.0),
            price_to_sales: Some(3.0),
            ..Default::default()
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["trailingPE"], json!(15.0));
        assert_eq!(value["priceToSalesTrailing12Months"], json!(3.0));

        let back: FundamentalsRecord = serde_json::from_value(json!({"beta": 1.1})).unwrap();
        assert_eq!(back.beta, Some(1.1));
        assert_eq!(back.trailing_pe, None);
    }

    #[test]
    fn test_from_json_accepts_numbers_raw_wrappers_and_null() {
        let info = json!({
            "trailingPE": 18.5,
            "forwardPE": {"raw": 16.2, "fmt": "16.20"},
            "priceToBook": null,
            "beta": {},
            "dividendYield": true,
            "longName": "Ignored Corp",
        });
        let record = FundamentalsRecord::from_json(&info).unwrap();
        assert_eq!(record.trailing_pe, Some(18.5));
        assert_eq!(record.forward_pe, Some(16.2));
        assert_eq!(record.price_to_book, None);
        assert_eq!(record.beta, None);
        assert_eq!(record.dividend_yield, Some(1.0));
        assert_eq!(record.value(Metric::PriceToBook), 0.0);
    }

    #[test]
    fn test_from_json_rejects_non_numeric_field() {
        let err = FundamentalsRecord::from_json(&json!({"trailingPE": "abc"})).unwrap_err();
        match err {
            AnalysisError::ComputationFailure(msg) => assert!(msg.contains("trailingPE")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = FundamentalsRecord::from_json(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, AnalysisError::ComputationFailure(_)));
    }

    #[test]
    fn test_category_scores_total() {
        let mut scores = CategoryScores::default();
        scores.add(ScoreCategory::Valuation, 7);
        scores.add(ScoreCategory::Growth, -2);
        scores.add(ScoreCategory::Valuation, 4);
        assert_eq!(scores.valuation, 11);
        assert_eq!(scores.total(), 9);
        assert_eq!(scores.iter().count(), 5);
    }
}
