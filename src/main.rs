//! NBA moneyline arbitrage scanner entry point.

use std::net::SocketAddr;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::net::TcpListener;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nba_arb::api::{create_router, AppState};
use nba_arb::config::Config;
use nba_arb::market::{filter_nba_events, GammaClient};
use nba_arb::metrics;
use nba_arb::odds::{resolve_conversion_rate, OddsApiClient, OddsCache};
use nba_arb::pipeline::{self, ScanOutcome};
use nba_arb::snapshot::write_snapshot;
use nba_arb::utils::{run_instant, shutdown_signal};

/// Exit code when a run completes without finding an opportunity.
const EXIT_NO_OPPORTUNITIES: u8 = 2;

/// NBA moneyline arbitrage scanner.
#[derive(Parser, Debug)]
#[command(name = "nba-arb")]
#[command(about = "Find arbitrage between Polymarket NBA markets and sportsbook moneylines")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch both sources, then scan (default).
    Run,

    /// Fetch Polymarket NBA events and write the prediction snapshot.
    FetchEvents,

    /// Fetch sportsbook odds and write the sportsbook snapshot.
    FetchOdds,

    /// Scan existing snapshots and write the report.
    Scan,

    /// Serve cached sportsbook odds over HTTP.
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("nba_arb=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    if args.json_logs {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }

    let handle = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to install Prometheus recorder: {e}");
            return ExitCode::FAILURE;
        }
    };
    metrics::init_metrics();

    let result = match args.command.unwrap_or(Command::Run) {
        Command::Run => cmd_run().await.map(scan_exit_code),
        Command::FetchEvents => cmd_fetch_events().await.map(|_| ExitCode::SUCCESS),
        Command::FetchOdds => cmd_fetch_odds().await.map(|_| ExitCode::SUCCESS),
        Command::Scan => cmd_scan().await.map(scan_exit_code),
        Command::Serve { port } => cmd_serve(port, handle.clone()).await.map(|_| ExitCode::SUCCESS),
        Command::CheckConfig => cmd_check_config().map(|_| ExitCode::SUCCESS),
    };

    debug!(metrics = %handle.render(), "Run metrics");

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("Command failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn scan_exit_code(outcome: ScanOutcome) -> ExitCode {
    if outcome.opportunities.is_empty() {
        ExitCode::from(EXIT_NO_OPPORTUNITIES)
    } else {
        ExitCode::SUCCESS
    }
}

fn load_config() -> anyhow::Result<Config> {
    let config = Config::load().context("Configuration load failed")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {}", e))?;
    Ok(config)
}

/// Fetch both sources, then scan.
async fn cmd_run() -> anyhow::Result<ScanOutcome> {
    let config = load_config()?;
    fetch_events(&config).await?;
    fetch_odds(&config).await?;
    scan(&config).await
}

async fn cmd_fetch_events() -> anyhow::Result<()> {
    let config = load_config()?;
    fetch_events(&config).await
}

async fn cmd_fetch_odds() -> anyhow::Result<()> {
    let config = load_config()?;
    fetch_odds(&config).await
}

async fn cmd_scan() -> anyhow::Result<ScanOutcome> {
    let config = load_config()?;
    scan(&config).await
}

async fn fetch_events(config: &Config) -> anyhow::Result<()> {
    let client = GammaClient::new(config)?;
    let raw = client.fetch_all_events().await?;
    let events = filter_nba_events(raw, run_instant());
    write_snapshot(&config.polymarket_snapshot_path, &events)?;
    info!(count = events.len(), "Prediction snapshot written");
    Ok(())
}

async fn fetch_odds(config: &Config) -> anyhow::Result<()> {
    let client = OddsApiClient::new(config)?;
    let mut cache = OddsCache::new(client, config.cache_ttl());
    let board = cache.get(&config.sport).await?;
    write_snapshot(&config.sportsbook_snapshot_path, &board.to_snapshot())?;
    info!(
        games = board.games.len(),
        remaining_requests = %board.remaining_requests,
        "Sportsbook snapshot written"
    );
    Ok(())
}

async fn scan(config: &Config) -> anyhow::Result<ScanOutcome> {
    let rate = resolve_conversion_rate(config).await;
    let outcome = pipeline::scan_blocking(config.clone(), run_instant(), rate).await?;

    if outcome.opportunities.is_empty() {
        println!("No arbitrage opportunities found");
    } else {
        println!(
            "{} arbitrage opportunities found, report: {}",
            outcome.opportunities.len(),
            outcome.report_path.display()
        );
    }
    Ok(outcome)
}

/// Run the odds server until shutdown.
async fn cmd_serve(port_override: Option<u16>, handle: PrometheusHandle) -> anyhow::Result<()> {
    let config = load_config()?;
    let port = port_override.unwrap_or(config.port);

    let client = OddsApiClient::new(&config)?;
    let cache = OddsCache::new(client, config.cache_ttl());
    let router = create_router(AppState::new(cache, Some(handle)));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("NBA ARB SCANNER - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!();
    println!("Configuration:");
    println!("  Sport:               {}", config.sport);
    println!(
        "  Odds API key:        {}",
        if config.require_odds_api_key().is_ok() { "set" } else { "MISSING" }
    );
    println!("  Odds cache TTL:      {}s", config.cache_ttl_secs);
    println!("  Match window:        {}s", config.match_window_secs);
    println!(
        "  Initial stake:       {} {}",
        config.initial_stake, config.base_currency
    );
    println!(
        "  Fallback rate:       {} {}/{}",
        config.fallback_conversion_rate, config.quote_currency, config.base_currency
    );
    println!("  Polymarket snapshot: {}", config.polymarket_snapshot_path.display());
    println!("  Sportsbook snapshot: {}", config.sportsbook_snapshot_path.display());
    println!("  Report directory:    {}", config.report_dir.display());
    println!("  Server port:         {}", config.port);
    println!();
    println!("======================================================================");

    Ok(())
}
