//! Plain-text panels for the terminal.

use analysis_core::{AnalysisError, Bar, CompanyProfile, FundamentalsRecord, Recommendation};

const NA: &str = "N/A";

fn heading(title: &str) -> Vec<String> {
    vec![title.to_string(), "=".repeat(title.len())]
}

/// One line per entry, newline-terminated
fn panel(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn raw(value: Option<f64>) -> String {
    value.map_or_else(|| NA.to_string(), |v| v.to_string())
}

/// Decimal ratio shown as a percentage with two decimals (0.1234 -> "12.34%")
fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| NA.to_string(), |v| format!("{:.2}%", v * 100.0))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// 2950000000.5 -> "2,950,000,000.50"
pub fn format_money(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (whole, frac) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, group_thousands(whole), frac)
}

pub fn format_count(value: u64) -> String {
    group_thousands(&value.to_string())
}

pub fn render_recommendation(recommendation: &Result<Recommendation, AnalysisError>) -> String {
    let mut lines = heading("Investment Recommendation");

    let rec = match recommendation {
        Ok(rec) => rec,
        Err(e) => {
            lines.push("Unable to calculate recommendation".to_string());
            lines.push(format!("Reason: {}", e));
            return panel(lines);
        }
    };

    let tone = if rec.rating.is_bullish() { "favorable" } else { "unfavorable" };
    lines.push(format!("Rating: {} ({})", rec.rating, tone));
    lines.push(format!("Total Score: {}/100", rec.total_score));
    lines.push(String::new());
    lines.push("Category Scores:".to_string());
    lines.extend(
        rec.category_scores
            .iter()
            .map(|(category, points)| format!("  {}: {}/20", category.display_name(), points)),
    );
    lines.push(String::new());
    lines.push("Strengths:".to_string());
    if rec.details.is_empty() {
        lines.push("  (none)".to_string());
    }
    lines.extend(rec.details.iter().map(|detail| format!("  - {}", detail)));
    panel(lines)
}

pub fn render_company_info(profile: Option<&CompanyProfile>) -> String {
    let mut lines = heading("Company Information");

    let Some(p) = profile else {
        lines.push("No company information available".to_string());
        return panel(lines);
    };

    lines.extend([
        format!("Current Price: ${}", raw(p.current_price)),
        format!(
            "Market Cap: {}",
            p.market_cap.map_or_else(|| NA.to_string(), |m| format!("${}", format_money(m)))
        ),
        format!("52 Week High: ${}", raw(p.fifty_two_week_high)),
        format!("52 Week Low: ${}", raw(p.fifty_two_week_low)),
        format!("Volume: {}", p.volume.map_or_else(|| NA.to_string(), format_count)),
        format!("P/E Ratio: {}", raw(p.trailing_pe)),
        // Provider value printed as-is; it is not rescaled to a percentage
        format!(
            "Dividend Yield: {}",
            p.dividend_yield.map_or_else(|| NA.to_string(), |d| format!("{}%", d))
        ),
    ]);
    panel(lines)
}

pub fn render_financials(record: Option<&FundamentalsRecord>) -> String {
    let mut lines = heading("Key Financial Metrics");

    let Some(r) = record else {
        lines.push("No financial metrics available".to_string());
        return panel(lines);
    };

    lines.extend([
        "Valuation".to_string(),
        format!("  P/E Ratio: {}", raw(r.trailing_pe)),
        format!("  Forward P/E: {}", raw(r.forward_pe)),
        format!("  P/B Ratio: {}", raw(r.price_to_book)),
        "Profitability".to_string(),
        format!("  Profit Margin: {}", percent(r.profit_margin)),
        format!("  Operating Margin: {}", percent(r.operating_margin)),
        format!("  ROE: {}", percent(r.return_on_equity)),
        "Growth".to_string(),
        format!("  Revenue Growth: {}", percent(r.revenue_growth)),
        format!("  Earnings Growth: {}", percent(r.earnings_growth)),
        format!("  Quarterly Growth: {}", percent(r.earnings_quarterly_growth)),
        "Financial Health".to_string(),
        format!("  Current Ratio: {}", raw(r.current_ratio)),
        format!("  Debt/Equity: {}", raw(r.debt_to_equity)),
        format!("  Quick Ratio: {}", raw(r.quick_ratio)),
    ]);
    panel(lines)
}

pub fn render_history(symbol: &str, bars: &[Bar]) -> String {
    let mut lines = heading(&format!("{} Stock Price", symbol));

    let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
        lines.push("No price history available".to_string());
        return panel(lines);
    };

    let high = bars.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let low = bars.iter().map(|b| b.low).fold(f64::MAX, f64::min);

    lines.extend([
        format!(
            "Period: {} to {} ({} sessions)",
            first.timestamp.format("%Y-%m-%d"),
            last.timestamp.format("%Y-%m-%d"),
            bars.len()
        ),
        format!("Last Close: ${:.2}", last.close),
        format!("Period High: ${:.2}", high),
        format!("Period Low: ${:.2}", low),
    ]);
    if first.close > 0.0 {
        let change = (last.close - first.close) / first.close * 100.0;
        lines.push(format!("Period Change: {:+.2}%", change));
    }
    panel(lines)
}
