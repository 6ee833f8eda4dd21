//! # meteocast
//!
//! Command-line front end: batch forecasts, history ingestion and the live reading.

use anyhow::{Context, Result, bail};
use chrono::{TimeDelta, Utc};
use clap::{Parser, Subcommand};
use meteocast::config::MAX_HORIZON_HOURS;
use meteocast::forecast::anchor_from_records;
use meteocast::{
    BatchForecaster, FjallStore, ForecastEngine, MeteocastConfig, MeteocastError,
    ModelBundle, OpenMeteoClient, TimeSeriesStore, logging, parse_anchor,
};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "meteocast", version)]
#[command(about = "Hourly weather forecasts from precomputed models", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast every modeled variable for the hours after the anchor
    Forecast {
        /// Anchor timestamp (RFC 3339); defaults to the newest stored record
        #[arg(short, long)]
        anchor: Option<String>,

        /// Number of hours to forecast
        #[arg(
            long,
            value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_HORIZON_HOURS))
        )]
        hours: Option<u32>,

        /// Model bundle file (JSON)
        #[arg(short, long)]
        bundle: Option<PathBuf>,

        /// Print the table as JSON
        #[arg(long)]
        json: bool,

        /// Replace the stored predictions with this forecast
        #[arg(long)]
        save: bool,
    },

    /// Fetch recent hourly observations and store the new ones
    Ingest {
        /// Days of history to request
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Print the current "feels like" temperature
    Now,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<MeteocastError>() {
            Some(err) => eprintln!("Error: {}", err.user_message()),
            None => eprintln!("Error: {e:#}"),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = MeteocastConfig::load_from_path(cli.config)?;
    logging::init(&config.logging, cli.verbose)?;

    match cli.command {
        Commands::Forecast {
            anchor,
            hours,
            bundle,
            json,
            save,
        } => forecast(&config, anchor, hours, bundle, json, save).await,
        Commands::Ingest { days } => ingest(&config, days).await,
        Commands::Now => now(&config).await,
    }
}

fn open_store(config: &MeteocastConfig) -> Result<FjallStore> {
    let path = config.store_path();
    std::fs::create_dir_all(&path)
        .with_context(|| format!("Failed to create store directory {}", path.display()))?;
    FjallStore::open(&path).with_context(|| format!("Failed to open store at {}", path.display()))
}

async fn forecast(
    config: &MeteocastConfig,
    anchor: Option<String>,
    hours: Option<u32>,
    bundle_path: Option<PathBuf>,
    json: bool,
    save: bool,
) -> Result<()> {
    let tz = config.timezone()?;
    let bundle_path = bundle_path.unwrap_or_else(|| config.bundle_path());
    let bundle = ModelBundle::load(&bundle_path)?;
    let horizon_hours = hours.unwrap_or(config.forecast.horizon_hours);

    let store = if save || anchor.is_none() {
        Some(open_store(config)?)
    } else {
        None
    };

    let anchor = match anchor {
        Some(raw) => parse_anchor(&raw)?.with_timezone(&tz),
        None => {
            let store = store
                .as_ref()
                .context("A store is required to anchor the forecast")?;
            let lower_bound = Utc::now() - TimeDelta::days(i64::from(config.store.lookback_days));
            let records = store.query_range(lower_bound).await?;
            match anchor_from_records(&records) {
                Some(latest) => latest.with_timezone(&tz),
                None => bail!(
                    "No records in the last {} days; run `meteocast ingest` or pass --anchor",
                    config.store.lookback_days
                ),
            }
        }
    };
    info!(anchor = %anchor, horizon_hours, "Running forecast");

    let engine = ForecastEngine::with_epsilon(&bundle, config.forecast.epsilon)?;
    let table = BatchForecaster::with_engine(engine).run(&anchor, horizon_hours)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&table)?);
    } else {
        print!("{table}");
    }

    if save && let Some(store) = &store {
        let written = store.replace_predictions(&table).await?;
        info!(written, "Stored predictions");
    }
    Ok(())
}

async fn ingest(config: &MeteocastConfig, days: Option<u32>) -> Result<()> {
    let days = days.unwrap_or(config.store.lookback_days);
    let client = OpenMeteoClient::new(&config.weather)?;
    let store = open_store(config)?;

    let records = client
        .recent_hourly(
            config.location.latitude,
            config.location.longitude,
            days,
            Utc::now(),
        )
        .await
        .context("Failed to fetch hourly history")?;

    let mut inserted = 0usize;
    let mut skipped = 0usize;
    for record in records {
        if store.insert_record(record).await? {
            inserted += 1;
        } else {
            skipped += 1;
        }
    }
    if inserted == 0 {
        warn!("No new records; the store is already up to date");
    }
    println!("Inserted {inserted} records ({skipped} already stored)");
    Ok(())
}

async fn now(config: &MeteocastConfig) -> Result<()> {
    let client = OpenMeteoClient::new(&config.weather)?;
    let reading = client
        .current_feels_like(config.location.latitude, config.location.longitude)
        .await
        .context("Failed to fetch the current reading")?;
    let tz = config.timezone()?;
    println!(
        "Feels like {} at {}",
        reading.format_temperature(),
        reading.timestamp.with_timezone(&tz).format("%Y-%m-%d %H:%M %Z")
    );
    Ok(())
}
