//! stock-sight: fundamentals-based buy/sell recommendation for a stock ticker.
//!
//! Fetches the ticker's fundamentals, company snapshot and a year of daily bars from
//! Yahoo Finance, scores the fundamentals, and prints the result as text panels.
//!
//! Usage:
//!   stock-sight analyze AAPL
//!   stock-sight analyze msft --history-days 90 --json
//!   stock-sight score --file fundamentals.json

mod app;
mod config;
mod render;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fundamental_analysis::RecommendationEngine;
use serde_json::json;
use std::path::PathBuf;
use yahoo_client::YahooFinanceClient;

use crate::app::{analyze_symbol, normalize_symbol, Dashboard};
use crate::config::StockSightConfig;

#[derive(Parser)]
#[command(name = "stock-sight", about = "StockSight: interactive stock market analytics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a ticker from Yahoo Finance and score its fundamentals.
    Analyze {
        /// Stock symbol (e.g., AAPL).
        symbol: String,

        /// Days of daily price history to summarize. Defaults to STOCKSIGHT_HISTORY_DAYS or 365.
        #[arg(long)]
        history_days: Option<i64>,

        /// Print the result as JSON instead of text panels.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Score a fundamentals JSON file (a provider info map) without touching the network.
    Score {
        /// Path to the JSON file.
        #[arg(long)]
        file: PathBuf,

        /// Print the recommendation as JSON instead of text panels.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stock_sight=info,yahoo_client=warn,fundamental_analysis=warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = StockSightConfig::from_env().context("Failed to load configuration")?;

    match cli.command {
        Commands::Analyze { symbol, history_days, json } => {
            let Some(symbol) = normalize_symbol(&symbol) else {
                bail!("Enter a stock symbol (e.g., AAPL)");
            };
            let history_days = config.history_days_or(history_days)?;

            tracing::info!("Analyzing {} ({} days of history)", symbol, history_days);
            let client = YahooFinanceClient::with_config(config.yahoo.clone());
            let engine = RecommendationEngine::new();
            let dashboard = analyze_symbol(&client, &engine, &symbol, history_days).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&dashboard_json(&dashboard))?);
            } else {
                print_dashboard(&dashboard);
            }
        }
        Commands::Score { file, json } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let info: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("{} is not valid JSON", file.display()))?;

            let recommendation = RecommendationEngine::new().score_json(Some(&info));
            if let Err(e) = &recommendation {
                tracing::warn!("Could not score {}: {}", file.display(), e);
            }

            if json {
                let out = match &recommendation {
                    Ok(rec) => json!({ "recommendation": rec }),
                    Err(e) => json!({ "recommendation": null, "error": e.to_string() }),
                };
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                let record = analysis_core::FundamentalsRecord::from_json(&info).ok();
                println!("{}", render::render_recommendation(&recommendation));
                println!("{}", render::render_financials(record.as_ref()));
            }
        }
    }

    Ok(())
}

fn print_dashboard(dashboard: &Dashboard) {
    println!("{}", render::render_history(&dashboard.symbol, &dashboard.history));
    println!("{}", render::render_company_info(dashboard.profile.as_ref()));
    println!("{}", render::render_recommendation(&dashboard.recommendation));
    println!("{}", render::render_financials(dashboard.fundamentals.as_ref()));
}

fn dashboard_json(dashboard: &Dashboard) -> serde_json::Value {
    let (recommendation, error) = match &dashboard.recommendation {
        Ok(rec) => (json!(rec), serde_json::Value::Null),
        Err(e) => (serde_json::Value::Null, json!(e.to_string())),
    };

    json!({
        "symbol": dashboard.symbol,
        "profile": dashboard.profile,
        "fundamentals": dashboard.fundamentals,
        "bars": dashboard.history.len(),
        "last_close": dashboard.history.last().map(|b| b.close),
        "recommendation": recommendation,
        "error": error,
    })
}
