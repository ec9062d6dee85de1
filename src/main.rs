use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stock_curator::application::features::FeaturePipeline;
use stock_curator::application::ml::{BatchPredictor, load_index};
use stock_curator::application::signal_curator::{SignalCurator, symbols_from_recommendations};
use stock_curator::config::Config;
use stock_curator::domain::market::IndexSeries;
use stock_curator::domain::ml::{FEATURE_COLS, FEATURE_COUNT, WINDOW_SIZE};
use stock_curator::domain::signals::LlmRecommendation;
use stock_curator::infrastructure::{CsvIndexProvider, CsvPriceProvider, FileArtifactStore};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about = "7-day direction signals for NSE stocks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Predict the 7-day direction for a comma-separated list of symbols
    Predict {
        #[arg(long, value_delimiter = ',', required = true)]
        symbols: Vec<String>,
    },
    /// Predict every validated LLM recommendation and print the daily report
    Curate {
        /// JSON array of LLM recommendations
        #[arg(long)]
        recommendations: PathBuf,
    },
    /// Prepare the feature window for one symbol without predicting
    Features {
        #[arg(long)]
        symbol: String,
    },
}

fn feature_pipeline(config: &Config) -> FeaturePipeline {
    let prices = CsvPriceProvider::new(&config.data.price_data_dir);
    FeaturePipeline::new(Arc::new(prices))
        .with_history_days(config.pipeline.history_days)
        .with_min_raw_bars(config.pipeline.min_raw_bars)
}

fn index_series(config: &Config) -> Option<IndexSeries> {
    match &config.data.index_data_path {
        Some(path) => load_index(&CsvIndexProvider::new(path), config.pipeline.history_days),
        None => {
            warn!("INDEX_DATA_PATH not set, market-context features will be neutral");
            None
        }
    }
}

fn batch_predictor(config: &Config) -> Result<BatchPredictor> {
    let store = FileArtifactStore::new(&config.artifacts.model_path, &config.artifacts.scaler_path);
    let predictor = BatchPredictor::load(feature_pipeline(config), &store)
        .context("Cannot run predictions without model artifacts")?;
    Ok(predictor.with_parallel(config.pipeline.parallel_predictions))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_predict(config: &Config, symbols: Vec<String>) -> Result<()> {
    let symbols: BTreeSet<String> = symbols
        .into_iter()
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();
    let predictor = batch_predictor(config)?;
    let index = index_series(config);
    let report = predictor.run(&symbols, index.as_ref());

    let failures: BTreeMap<&str, &str> = report.failures().into_iter().collect();
    print_json(&serde_json::json!({
        "predictions": &report.results,
        "summary": {
            "total": report.total(),
            "successful": report.success_count(),
            "failed": failures,
            "success_rate": report.success_rate(),
        }
    }))
}

fn run_curate(config: &Config, path: PathBuf) -> Result<()> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read recommendations from {:?}", path))?;
    let recommendations: Vec<LlmRecommendation> =
        serde_json::from_str(&content).context("Failed to parse recommendations JSON")?;

    let symbols = symbols_from_recommendations(&recommendations);
    info!(
        "{} recommendations, {} predictable symbols",
        recommendations.len(),
        symbols.len()
    );

    let predictor = batch_predictor(config)?;
    let index = index_series(config);
    let report = predictor.run(&symbols, index.as_ref());

    let curator = SignalCurator::new(config.pipeline.strong_signal_confidence);
    let daily = curator.build_report(recommendations, report, chrono::Utc::now());
    print_json(&daily)
}

fn run_features(config: &Config, symbol: &str) -> Result<()> {
    let index = index_series(config);
    let prepared = feature_pipeline(config)
        .prepare(&symbol.to_uppercase(), index.as_ref())
        .with_context(|| format!("Feature preparation failed for {}", symbol))?;

    let latest = prepared.window.matrix().row(WINDOW_SIZE - 1);
    let latest_features: BTreeMap<&str, f64> = FEATURE_COLS
        .iter()
        .copied()
        .zip(latest.iter().copied())
        .collect();

    print_json(&serde_json::json!({
        "symbol": prepared.symbol,
        "window_shape": [WINDOW_SIZE, FEATURE_COUNT],
        "latest_close": prepared.latest_close,
        "window_start": prepared.ohlcv.keys().next(),
        "window_end": prepared.ohlcv.keys().next_back(),
        "latest_features": latest_features,
    }))
}

fn main() -> Result<()> {
    // Load Env (before starting anything)
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays machine-readable
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stderr_layer)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Command::Predict { symbols } => run_predict(&config, symbols),
        Command::Curate { recommendations } => run_curate(&config, recommendations),
        Command::Features { symbol } => run_features(&config, &symbol),
    }
}
