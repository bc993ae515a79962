use analysis_core::{AnalysisError, Bar, CompanyProfile, FundamentalsRecord, FundamentalsSource, TickerSummary};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// quoteSummary modules merged into one flat info map. On a key clash the earliest
/// module with a numeric value wins: summaryDetail, then financialData, then
/// defaultKeyStatistics, then price.
const SUMMARY_MODULES: [&str; 4] = ["summaryDetail", "financialData", "defaultKeyStatistics", "price"];

/// Longest history window accepted, roughly a century of calendar days
pub const MAX_HISTORY_DAYS: i64 = 36_500;

#[derive(Debug, Clone)]
pub struct YahooConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_backoff: Duration::from_millis(1000),
        }
    }
}

#[derive(Clone)]
pub struct YahooFinanceClient {
    client: Client,
    config: YahooConfig,
}

impl YahooFinanceClient {
    pub fn new() -> Self {
        Self::with_config(YahooConfig::default())
    }

    pub fn with_config(config: YahooConfig) -> Self {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, config }
    }

    /// Send a request, retrying on 429 and 5xx with a fixed backoff.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, AnalysisError> {
        let request = builder.build().map_err(|e| AnalysisError::ApiError(e.to_string()))?;
        let attempts = self.config.max_retries.max(1);

        for attempt in 0..attempts {
            let req_clone = request.try_clone()
                .ok_or_else(|| AnalysisError::ApiError("Cannot clone request".to_string()))?;
            let response = self.client.execute(req_clone).await
                .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

            let status = response.status();
            if status != StatusCode::TOO_MANY_REQUESTS && !status.is_server_error() {
                return Ok(response);
            }

            if attempt + 1 < attempts {
                tracing::warn!(
                    "Yahoo returned {}, waiting {}ms before retry {}/{}",
                    status,
                    self.config.retry_backoff.as_millis(),
                    attempt + 1,
                    attempts - 1
                );
                tokio::time::sleep(self.config.retry_backoff).await;
            }
        }

        Err(AnalysisError::ApiError(format!(
            "Yahoo request failed after {} attempts",
            attempts
        )))
    }

    /// Fetch the quoteSummary modules and flatten them into one info map.
    /// `None` when Yahoo has no quote for the symbol.
    pub async fn get_info(&self, symbol: &str) -> Result<Option<Map<String, Value>>, AnalysisError> {
        let url = format!("{}/v10/finance/quoteSummary/{}", self.config.base_url, symbol);

        let response = self.send_request(
            self.client.get(&url).query(&[("modules", SUMMARY_MODULES.join(","))])
        ).await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::info!("Yahoo has no quote summary for {}", symbol);
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(AnalysisError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let json: Value = response.json().await
            .map_err(|e| AnalysisError::InvalidData(e.to_string()))?;
        Ok(flatten_quote_summary(&json))
    }

    /// Get daily bars between two instants
    pub async fn get_historical_data(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Bar>, AnalysisError> {
        let url = format!("{}/v8/finance/chart/{}", self.config.base_url, symbol);

        let response = self.send_request(self.client.get(&url).query(&[
            ("period1", from.timestamp().to_string()),
            ("period2", to.timestamp().to_string()),
            ("interval", "1d".to_string()),
        ])).await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::info!("Yahoo has no chart for {}", symbol);
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(AnalysisError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let json: Value = response.json().await
            .map_err(|e| AnalysisError::InvalidData(e.to_string()))?;
        parse_chart(&json)
    }
}

impl Default for YahooFinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FundamentalsSource for YahooFinanceClient {
    async fn fetch_summary(&self, symbol: &str) -> Result<Option<TickerSummary>, AnalysisError> {
        Ok(self.get_info(symbol).await?.map(|info| summarize_info(symbol, info)))
    }

    async fn fetch_history(&self, symbol: &str, days: i64) -> Result<Vec<Bar>, AnalysisError> {
        let (from, to) = history_window(Utc::now(), days)?;
        self.get_historical_data(symbol, from, to).await
    }
}

/// `[to - days, to]`. Windows outside `1..=MAX_HISTORY_DAYS` are rejected.
pub fn history_window(
    to: DateTime<Utc>,
    days: i64,
) -> Result<(DateTime<Utc>, DateTime<Utc>), AnalysisError> {
    if days <= 0 || days > MAX_HISTORY_DAYS {
        return Err(AnalysisError::InvalidData(format!(
            "History window must be 1..={} days, got {}",
            MAX_HISTORY_DAYS, days
        )));
    }

    let from = ChronoDuration::try_days(days)
        .and_then(|span| to.checked_sub_signed(span))
        .ok_or_else(|| AnalysisError::InvalidData(format!("History window of {} days is out of range", days)))?;
    Ok((from, to))
}

/// Build the record and the profile from one flattened info map
pub fn summarize_info(symbol: &str, info: Map<String, Value>) -> TickerSummary {
    let profile = parse_profile(symbol, &info);
    let fundamentals = FundamentalsRecord::from_json(&Value::Object(info));
    TickerSummary { profile, fundamentals }
}

/// Merge the modules of a quoteSummary response into a flat key -> value map.
pub fn flatten_quote_summary(json: &Value) -> Option<Map<String, Value>> {
    let result = json.get("quoteSummary")
        .and_then(|v| v.get("result"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())?;

    let mut info = Map::new();
    for module in SUMMARY_MODULES {
        let Some(fields) = result.get(module).and_then(|v| v.as_object()) else {
            continue;
        };
        for (key, value) in fields {
            let present = info.get(key).map_or(false, |v| unwrap_raw(v).is_some());
            if !present {
                info.insert(key.clone(), value.clone());
            }
        }
    }
    Some(info)
}

/// Numeric value of a plain number or a `{"raw": n}` wrapper
fn unwrap_raw(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Object(obj) => obj.get("raw").and_then(|v| v.as_f64()),
        _ => None,
    }
}

pub fn parse_profile(symbol: &str, info: &Map<String, Value>) -> CompanyProfile {
    let field = |key: &str| info.get(key).and_then(unwrap_raw);

    CompanyProfile {
        symbol: symbol.to_string(),
        current_price: field("currentPrice").or_else(|| field("regularMarketPrice")),
        market_cap: field("marketCap"),
        fifty_two_week_high: field("fiftyTwoWeekHigh"),
        fifty_two_week_low: field("fiftyTwoWeekLow"),
        volume: field("volume")
            .or_else(|| field("regularMarketVolume"))
            .filter(|v| *v >= 0.0)
            .map(|v| v as u64),
        trailing_pe: field("trailingPE"),
        dividend_yield: field("dividendYield"),
    }
}

/// Parse a v8 chart response into daily bars. Rows with a missing price are skipped.
pub fn parse_chart(json: &Value) -> Result<Vec<Bar>, AnalysisError> {
    let chart = json.get("chart")
        .and_then(|v| v.get("result"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first());

    let Some(chart) = chart else {
        return Ok(Vec::new());
    };

    // A symbol with no trading days in range has no timestamp array at all
    let Some(timestamps) = chart.get("timestamp").and_then(|v| v.as_array()) else {
        return Ok(Vec::new());
    };

    let quotes = chart.get("indicators")
        .and_then(|v| v.get("quote"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| AnalysisError::InvalidData("No quote data in chart".to_string()))?;

    let opens = series(quotes, "open")?;
    let highs = series(quotes, "high")?;
    let lows = series(quotes, "low")?;
    let closes = series(quotes, "close")?;
    let volumes = series(quotes, "volume")?;

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let at = |s: &Vec<Value>| s.get(i).and_then(|v| v.as_f64());
        if let (Some(ts), Some(o), Some(h), Some(l), Some(c)) =
            (ts.as_i64(), at(opens), at(highs), at(lows), at(closes))
        {
            let timestamp = DateTime::from_timestamp(ts, 0)
                .ok_or_else(|| AnalysisError::InvalidData(format!("Invalid timestamp {}", ts)))?;
            bars.push(Bar {
                timestamp,
                open: o,
                high: h,
                low: l,
                close: c,
                volume: at(volumes).unwrap_or(0.0),
            });
        }
    }

    Ok(bars)
}

fn series<'a>(quotes: &'a Value, name: &str) -> Result<&'a Vec<Value>, AnalysisError> {
    quotes.get(name)
        .and_then(|v| v.as_array())
        .ok_or_else(|| AnalysisError::InvalidData(format!("No {} series in chart", name)))
}
