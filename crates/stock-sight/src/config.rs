use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use yahoo_client::{YahooConfig, MAX_HISTORY_DAYS};

#[derive(Debug, Clone)]
pub struct StockSightConfig {
    pub yahoo: YahooConfig,
    pub history_days: i64, // 365 (one year of daily bars)
}

impl StockSightConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup, so tests don't touch the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = YahooConfig::default();

        let timeout_secs: u64 = parse_or(&lookup, "YAHOO_TIMEOUT_SECS", defaults.timeout.as_secs())?;
        let backoff_ms: u64 = parse_or(
            &lookup,
            "YAHOO_RETRY_BACKOFF_MS",
            defaults.retry_backoff.as_millis() as u64,
        )?;

        let config = Self {
            yahoo: YahooConfig {
                base_url: lookup("YAHOO_BASE_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or(defaults.base_url),
                user_agent: lookup("YAHOO_USER_AGENT").unwrap_or(defaults.user_agent),
                timeout: Duration::from_secs(timeout_secs),
                max_retries: parse_or(&lookup, "YAHOO_MAX_RETRIES", defaults.max_retries)?,
                retry_backoff: Duration::from_millis(backoff_ms),
            },
            history_days: parse_or(&lookup, "STOCKSIGHT_HISTORY_DAYS", 365)?,
        };

        check_history_days("STOCKSIGHT_HISTORY_DAYS", config.history_days)?;
        Ok(config)
    }

    /// History window for one run: the command-line value if given, else the configured one.
    pub fn history_days_or(&self, flag: Option<i64>) -> Result<i64> {
        match flag {
            Some(days) => check_history_days("--history-days", days),
            None => Ok(self.history_days),
        }
    }
}

fn check_history_days(name: &str, days: i64) -> Result<i64> {
    if !(1..=MAX_HISTORY_DAYS).contains(&days) {
        anyhow::bail!("{} must be between 1 and {}, got {}", name, MAX_HISTORY_DAYS, days);
    }
    Ok(days)
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid value for {}: {:?}", key, value)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_env_is_empty() {
        let config = StockSightConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.history_days, 365);
        assert_eq!(config.yahoo.base_url, "https://query2.finance.yahoo.com");
        assert_eq!(config.yahoo.max_retries, 3);
        assert_eq!(config.yahoo.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = StockSightConfig::from_lookup(lookup_from(&[
            ("YAHOO_BASE_URL", "http://localhost:8080/"),
            ("YAHOO_MAX_RETRIES", "5"),
            ("YAHOO_RETRY_BACKOFF_MS", "250"),
            ("STOCKSIGHT_HISTORY_DAYS", "90"),
        ]))
        .unwrap();
        assert_eq!(config.yahoo.base_url, "http://localhost:8080");
        assert_eq!(config.yahoo.max_retries, 5);
        assert_eq!(config.yahoo.retry_backoff, Duration::from_millis(250));
        assert_eq!(config.history_days, 90);
    }

    #[test]
    fn test_malformed_number_is_an_error() {
        let err = StockSightConfig::from_lookup(lookup_from(&[("YAHOO_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("YAHOO_TIMEOUT_SECS"));
    }

    #[test]
    fn test_non_positive_history_is_rejected() {
        assert!(StockSightConfig::from_lookup(lookup_from(&[("STOCKSIGHT_HISTORY_DAYS", "0")])).is_err());
    }

    #[test]
    fn test_oversized_history_is_rejected() {
        let err = StockSightConfig::from_lookup(lookup_from(&[("STOCKSIGHT_HISTORY_DAYS", "200000000")]))
            .unwrap_err();
        assert!(err.to_string().contains("STOCKSIGHT_HISTORY_DAYS"));

        let longest = MAX_HISTORY_DAYS.to_string();
        let config = StockSightConfig::from_lookup(lookup_from(&[("STOCKSIGHT_HISTORY_DAYS", &longest)])).unwrap();
        assert_eq!(config.history_days, MAX_HISTORY_DAYS);
    }

    #[test]
    fn test_history_flag_overrides_and_is_bounded() {
        let config = StockSightConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.history_days_or(None).unwrap(), 365);
        assert_eq!(config.history_days_or(Some(90)).unwrap(), 90);

        let err = config.history_days_or(Some(200_000_000)).unwrap_err();
        assert!(err.to_string().contains("--history-days"));
        assert!(config.history_days_or(Some(0)).is_err());
        assert!(config.history_days_or(Some(-5)).is_err());
    }
}
