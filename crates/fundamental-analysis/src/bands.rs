//! Threshold bands for every scored metric.
//!
//! Each metric owns an ordered list of bands. Bands are tried top-down and the first
//! one whose test passes decides the metric's points; when none passes the metric
//! contributes nothing. Comparisons are plain IEEE comparisons, so a NaN never matches.

use std::borrow::Cow;

use analysis_core::{FundamentalsRecord, Metric, ScoreCategory};

/// Numeric test a value must pass to land in a band
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Test {
    /// value > x
    Above(f64),
    /// value < x
    Below(f64),
    /// low < value < high
    Open(f64, f64),
    /// low <= value < high
    HalfOpen(f64, f64),
    /// low <= value <= high
    Closed(f64, f64),
}

impl Test {
    pub fn passes(&self, value: f64) -> bool {
        match *self {
            Test::Above(x) => value > x,
            Test::Below(x) => value < x,
            Test::Open(low, high) => low < value && value < high,
            Test::HalfOpen(low, high) => low <= value && value < high,
            Test::Closed(low, high) => low <= value && value <= high,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub test: Test,
    pub points: i32,
}

const fn band(test: Test, points: i32) -> Band {
    Band { test, points }
}

/// Which category each metric feeds, in evaluation order.
pub const RULES: [(ScoreCategory, Metric); 17] = [
    (ScoreCategory::Valuation, Metric::TrailingPe),
    (ScoreCategory::Valuation, Metric::ForwardPe),
    (ScoreCategory::Valuation, Metric::PriceToBook),
    (ScoreCategory::Valuation, Metric::PriceToSales),
    (ScoreCategory::Profitability, Metric::ProfitMargin),
    (ScoreCategory::Profitability, Metric::OperatingMargin),
    (ScoreCategory::Profitability, Metric::ReturnOnEquity),
    (ScoreCategory::Profitability, Metric::ReturnOnAssets),
    (ScoreCategory::Growth, Metric::RevenueGrowth),
    (ScoreCategory::Growth, Metric::EarningsGrowth),
    (ScoreCategory::Growth, Metric::EarningsQuarterlyGrowth),
    (ScoreCategory::FinancialHealth, Metric::CurrentRatio),
    (ScoreCategory::FinancialHealth, Metric::DebtToEquity),
    (ScoreCategory::FinancialHealth, Metric::QuickRatio),
    (ScoreCategory::MarketSentiment, Metric::Beta),
    (ScoreCategory::MarketSentiment, Metric::DividendYield),
    (ScoreCategory::MarketSentiment, Metric::ShortRatio),
];

const TRAILING_PE: &[Band] = &[
    band(Test::Open(0.0, 20.0), 7),
    band(Test::HalfOpen(20.0, 30.0), 4),
    band(Test::Above(30.0), -2),
];

const PRICE_TO_BOOK: &[Band] = &[
    band(Test::Open(0.0, 3.0), 5),
    band(Test::HalfOpen(3.0, 5.0), 2),
    band(Test::Above(8.0), -2),
];

const PRICE_TO_SALES: &[Band] = &[
    band(Test::Open(0.0, 4.0), 4),
    band(Test::HalfOpen(4.0, 6.0), 2),
    band(Test::Above(10.0), -2),
];

// Profit margin, operating margin and ROE share one ladder.
const MARGIN: &[Band] = &[
    band(Test::Above(0.15), 5),
    band(Test::Above(0.08), 3),
    band(Test::Below(0.0), -2),
];

const RETURN_ON_ASSETS: &[Band] = &[
    band(Test::Above(0.08), 5),
    band(Test::Above(0.04), 3),
    band(Test::Below(0.0), -2),
];

const ANNUAL_GROWTH: &[Band] = &[
    band(Test::Above(0.15), 7),
    band(Test::Above(0.08), 4),
    band(Test::Below(-0.1), -2),
];

const QUARTERLY_GROWTH: &[Band] = &[
    band(Test::Above(0.15), 6),
    band(Test::Above(0.08), 3),
    band(Test::Below(-0.1), -2),
];

const CURRENT_RATIO: &[Band] = &[
    band(Test::Above(1.5), 7),
    band(Test::Above(1.0), 4),
    band(Test::Below(0.8), -2),
];

const DEBT_TO_EQUITY: &[Band] = &[
    band(Test::Below(1.0), 7),
    band(Test::Below(1.5), 4),
    band(Test::Above(2.5), -2),
];

const QUICK_RATIO: &[Band] = &[
    band(Test::Above(1.2), 6),
    band(Test::Above(0.8), 3),
    band(Test::Below(0.5), -2),
];

const BETA: &[Band] = &[
    band(Test::Closed(0.8, 1.2), 7),
    band(Test::Closed(0.5, 1.5), 4),
    band(Test::Above(2.0), -2),
];

const DIVIDEND_YIELD: &[Band] = &[
    band(Test::Above(0.03), 7),
    band(Test::Above(0.015), 4),
    band(Test::Above(0.0), 2),
];

const SHORT_RATIO: &[Band] = &[
    band(Test::Below(3.0), 6),
    band(Test::Below(5.0), 3),
    band(Test::Above(10.0), -2),
];

/// Forward P/E is judged against the trailing P/E of the same record.
pub fn forward_pe_bands(trailing_pe: f64) -> [Band; 2] {
    [
        band(Test::Open(0.0, trailing_pe * 1.1), 4),
        band(Test::Above(trailing_pe * 1.5), -2),
    ]
}

pub fn bands_for(metric: Metric, record: &FundamentalsRecord) -> Cow<'static, [Band]> {
    let table = match metric {
        Metric::ForwardPe => {
            return Cow::Owned(forward_pe_bands(record.value(Metric::TrailingPe)).to_vec())
        }
        Metric::TrailingPe => TRAILING_PE,
        Metric::PriceToBook => PRICE_TO_BOOK,
        Metric::PriceToSales => PRICE_TO_SALES,
        Metric::ProfitMargin | Metric::OperatingMargin | Metric::ReturnOnEquity => MARGIN,
        Metric::ReturnOnAssets => RETURN_ON_ASSETS,
        Metric::RevenueGrowth | Metric::EarningsGrowth => ANNUAL_GROWTH,
        Metric::EarningsQuarterlyGrowth => QUARTERLY_GROWTH,
        Metric::CurrentRatio => CURRENT_RATIO,
        Metric::DebtToEquity => DEBT_TO_EQUITY,
        Metric::QuickRatio => QUICK_RATIO,
        Metric::Beta => BETA,
        Metric::DividendYield => DIVIDEND_YIELD,
        Metric::ShortRatio => SHORT_RATIO,
    };
    Cow::Borrowed(table)
}

/// Points of the first band the value falls into, zero if none.
pub fn first_match(bands: &[Band], value: f64) -> i32 {
    bands
        .iter()
        .find(|b| b.test.passes(value))
        .map_or(0, |b| b.points)
}

/// Points one metric contributes for this record.
pub fn metric_points(metric: Metric, record: &FundamentalsRecord) -> i32 {
    first_match(&bands_for(metric, record), record.value(metric))
}
