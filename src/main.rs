use arion::api::ArionClient;
use arion::config::{Settings, DEFAULT_CONFIG_PATH};
use arion::execution::{MarketFeed, Monitor, PortfolioStore, TracingLogSink};
use arion::risk::{estimator_from_config, RiskEstimator};
use arion::strategy::{Screener, ScreeningOutcome, SignalDetector};
use arion::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::time::{interval_at, Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "arion", version, about = "Position monitor for the 3x technique")]
struct Cli {
    /// Path to the TOML settings file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "arion=info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run monitor passes until Ctrl+C (default)
    Monitor,
    /// Run a single monitor pass and print its report as JSON
    Once,
    /// Run phase-1 entry screening once
    Screen,
}

type LiveMonitor = Monitor<Box<dyn RiskEstimator>, TracingLogSink>;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    let settings = Settings::load(&cli.config)?;
    let client = ArionClient::new(&settings.exchange)?;
    let feed = MarketFeed::new(client, settings.exchange.candle_limit);

    match cli.command.unwrap_or(Command::Monitor) {
        Command::Monitor => run_monitor(&settings, &feed).await,
        Command::Once => run_once(&settings, &feed).await,
        Command::Screen => run_screen(&settings, &feed).await,
    }
}

fn setup_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_monitor(settings: &Settings) -> LiveMonitor {
    Monitor::from_settings(
        settings,
        estimator_from_config(&settings.risk),
        TracingLogSink,
    )
}

async fn run_monitor(settings: &Settings, feed: &MarketFeed) -> Result<()> {
    tracing::info!("🚀 Arion monitor starting");

    let mut store = PortfolioStore::from_settings(settings)?;
    let mut monitor = build_monitor(settings);

    tracing::info!("📊 Configuration:");
    tracing::info!("  Exchange: {}", settings.exchange.base_url);
    tracing::info!("  Equity: ${:.2}", settings.account.total_equity);
    tracing::info!(
        "  Max liquidation risk: {:.1}%",
        settings.risk.max_liquidation_risk * 100.0
    );
    tracing::info!("  Poll interval: {}s", settings.monitor.poll_interval_secs);
    for position in store.positions.open_positions() {
        tracing::info!(
            "    - {} {:?} {} @ ${:.4} ({}x)",
            position.symbol,
            position.direction,
            position.quantity(),
            position.entry_price(),
            position.leverage
        );
    }
    tracing::info!("Press Ctrl+C to stop...");

    let period = Duration::from_secs(settings.monitor.poll_interval_secs.max(1));
    let mut ticker = interval_at(Instant::now(), period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tracing::info!("🔄 [MONITOR] Tick at {}", Utc::now().format("%H:%M:%S"));
                monitor_tick(feed, &mut monitor, &mut store).await;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("⚠️  Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    tracing::info!("👋 Arion monitor stopped");
    Ok(())
}

async fn monitor_tick(feed: &MarketFeed, monitor: &mut LiveMonitor, store: &mut PortfolioStore) {
    let symbols = store.positions.open_symbols();
    if symbols.is_empty() {
        tracing::info!("No open positions to monitor");
    } else {
        feed.refresh(&symbols).await;
    }

    let report = monitor.run_pass(feed.buffer(), store);
    store.log_summary(&report.prices());
}

async fn run_once(settings: &Settings, feed: &MarketFeed) -> Result<()> {
    let mut store = PortfolioStore::from_settings(settings)?;
    let mut monitor = build_monitor(settings);

    feed.refresh(&store.positions.open_symbols()).await;
    let report = monitor.run_pass(feed.buffer(), &mut store);
    store.log_summary(&report.prices());

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_screen(settings: &Settings, feed: &MarketFeed) -> Result<()> {
    let screener = Screener::new(
        SignalDetector::new(settings.signals.clone()),
        settings.screener.clone(),
    );

    feed.refresh(&screener.symbols()).await;

    match screener.run(feed.buffer(), &mut TracingLogSink)? {
        ScreeningOutcome::Waiting => {
            println!("Reference trend is neutral, no candidates");
        }
        ScreeningOutcome::Screened { regime, signals } => {
            println!("Reference trend: {}", regime);
            if signals.is_empty() {
                println!("No candidates matched");
            }
            for signal in signals {
                println!(
                    "  {:<10} {:?} RSI {:.2} allocation ${:.2}",
                    signal.symbol, signal.direction, signal.rsi, signal.allocation_usdt
                );
            }
        }
    }

    Ok(())
}
