// In app/src/main.rs

use analytics::DashboardSession;
use anyhow::{Context, Result};
use api_client::{AlphaVantageFeed, AssetApiClient, AssetQuery, BenchmarkFeed, TradeRecordSource};
use app_config::Settings;
use clap::{Args, Parser, Subcommand};
use events::WsMessage;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing_subscriber::prelude::*;
use web_server::{AppState, WS_CACHE_SIZE, WsCache};

use self::tracing_layer::WsBroadcastLayer;

mod report;
mod tracing_layer;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "Portfolio dashboard over uploaded trade records.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs the dashboard web server.
    Serve,

    /// Prints totals by currency, bank and portfolio.
    Summary {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Prints the cumulative position curve for one asset, with its benchmark.
    Performance {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Prints the stress scenarios for the latest trade of one asset.
    Stress {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Additional shock in percent (e.g., -15).
        #[arg(long, allow_negative_numbers = true)]
        custom: Option<i32>,
    },

    /// Uploads a spreadsheet of trade records to the asset API.
    Upload {
        /// Path to the .xlsx or .csv file.
        file: PathBuf,
    },
}

/// The bank -> portfolio -> asset path identifying one holding.
#[derive(Args, Debug)]
struct SelectionArgs {
    #[arg(short, long)]
    bank: String,

    #[arg(short, long)]
    portfolio: String,

    /// The asset name as shown in the dashboard (not the ticker).
    #[arg(short, long)]
    asset: String,
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    let settings = app_config::load_settings().context("Failed to load settings")?;

    // --- WebSocket and Tracing Setup ---
    let (ws_tx, _) = broadcast::channel::<WsMessage>(1024);
    let ws_cache: WsCache = Arc::new(Mutex::new(VecDeque::with_capacity(WS_CACHE_SIZE)));
    let ws_layer = WsBroadcastLayer::new(ws_tx.clone(), ws_cache.clone());
    let level = settings
        .app
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(
        tracing_subscriber::filter::Targets::new()
            .with_target("hyper", tracing::Level::WARN)
            .with_target("reqwest", tracing::Level::WARN)
            .with_default(level),
    );
    tracing_subscriber::registry().with(fmt_layer).with(ws_layer).init();

    let cli = Cli::parse();

    tracing::info!(environment = %settings.app.environment, "Starting asset dashboard");

    match cli.command {
        Commands::Serve => {
            handle_serve(settings, ws_tx, ws_cache).await?;
        }
        Commands::Summary { json } => {
            handle_summary(&settings, json).await?;
        }
        Commands::Performance { selection, json } => {
            handle_performance(&settings, &selection, json).await?;
        }
        Commands::Stress { selection, custom } => {
            handle_stress(&settings, &selection, custom).await?;
        }
        Commands::Upload { file } => {
            handle_upload(&settings, file).await?;
        }
    }

    Ok(())
}

// --- "Serve" Subcommand Logic ---

/// Loads the first snapshot and serves the dashboard API until terminated.
async fn handle_serve(
    settings: Settings,
    ws_tx: broadcast::Sender<WsMessage>,
    ws_cache: WsCache,
) -> Result<()> {
    let records: Arc<dyn TradeRecordSource> = Arc::new(AssetApiClient::new(&settings.asset_api)?);
    let benchmark: Arc<dyn BenchmarkFeed> = Arc::new(AlphaVantageFeed::new(&settings.benchmark)?);
    let app_state = AppState::new(records, benchmark, settings.stress.clone(), ws_tx, ws_cache);

    // The server still starts without records; `POST /api/assets/refresh` retries.
    if let Err(e) = web_server::refresh_snapshot(&app_state).await {
        tracing::warn!(error = %e, "Initial record load failed, starting with an empty snapshot.");
    }

    web_server::run(settings.server, app_state).await?;
    Ok(())
}

// --- One-shot Subcommand Logic ---

/// Fetches every record and builds a session over them.
async fn load_session(settings: &Settings) -> Result<DashboardSession> {
    let client = AssetApiClient::new(&settings.asset_api)?;
    let records = client.get_assets(&AssetQuery::default()).await?;
    tracing::info!(count = records.len(), "Loaded trade records.");
    Ok(DashboardSession::new(records.into(), settings.stress.clone()))
}

/// Applies the selection in cascade order; fails if the asset cannot be resolved.
fn apply_selection(session: &mut DashboardSession, args: &SelectionArgs) -> Result<()> {
    session.select_bank(&args.bank);
    session.select_portfolio(&args.portfolio);
    session.select_asset_name(&args.asset);
    if session.ticker().is_none() {
        anyhow::bail!(
            "No asset named '{}' in bank '{}', portfolio '{}'",
            args.asset,
            args.bank,
            args.portfolio
        );
    }
    Ok(())
}

async fn handle_summary(settings: &Settings, json: bool) -> Result<()> {
    let session = load_session(settings).await?;
    let summary = session.summary();
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", report::render_summary(&summary));
    }
    Ok(())
}

async fn handle_performance(settings: &Settings, selection: &SelectionArgs, json: bool) -> Result<()> {
    let mut session = load_session(settings).await?;
    apply_selection(&mut session, selection)?;

    if let Some(request) = session.benchmark_request() {
        let feed = AlphaVantageFeed::new(&settings.benchmark)?;
        let result = feed.monthly_prices(&request.ticker).await;
        session.apply_benchmark(request.generation, result);
    }

    let view = session.performance_view();
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("{}", report::render_performance(&view));
    }
    Ok(())
}

async fn handle_stress(settings: &Settings, selection: &SelectionArgs, custom: Option<i32>) -> Result<()> {
    let mut session = load_session(settings).await?;
    apply_selection(&mut session, selection)?;

    let scenarios = session.stress(custom)?;
    println!("{}", report::render_stress(&scenarios));
    Ok(())
}

async fn handle_upload(settings: &Settings, file: PathBuf) -> Result<()> {
    let client = AssetApiClient::new(&settings.asset_api)?;
    let summary = client
        .upload_asset_path(&file)
        .await
        .with_context(|| format!("Upload of {} failed", file.display()))?;
    println!("{}", report::render_upload(&file.display().to_string(), &summary));
    Ok(())
}
