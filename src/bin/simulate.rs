use arion::config::Settings;
use arion::execution::{CandleBuffer, MemoryLogSink, Monitor, PassReport, PortfolioStore};
use arion::risk::SimulatedRiskEstimator;
use arion::simulation::{MarketScenario, SyntheticDataGenerator};
use arion::Result;
use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;

/// Replays the monitor against seeded synthetic markets
#[derive(Parser, Debug)]
#[command(name = "arion-simulate", version)]
struct Args {
    /// Number of monitor passes to run
    #[arg(long, default_value_t = 6)]
    ticks: usize,

    /// Seed for candles and the simulated risk ratio
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Optional settings file; the built-in reference portfolio otherwise
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Scenario and price move (fraction) applied on each tick, cycled
const SCRIPT: &[(MarketScenario, f64)] = &[
    (MarketScenario::Sideways, 0.0),
    (MarketScenario::Breakout, 0.02),
    (MarketScenario::Breakout, 0.01),
    (MarketScenario::Sideways, 0.0),
    (MarketScenario::Reversal, -0.03),
];

const CANDLES_PER_SERIES: usize = 60;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("arion=info")
        .init();

    let args = Args::parse();
    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::reference(),
    };

    println!("\n╔═══════════════════════════════════════════════════════╗");
    println!("║            ARION MONITOR SIMULATION                   ║");
    println!("╚═══════════════════════════════════════════════════════╝");

    let mut store = PortfolioStore::from_settings(&settings)?;
    let estimator = SimulatedRiskEstimator::new(
        settings.risk.simulated_min,
        settings.risk.simulated_max,
        Some(args.seed),
    );
    let sink = MemoryLogSink::new();
    let mut monitor = Monitor::from_settings(&settings, estimator, sink.clone());

    let mut generator = SyntheticDataGenerator::new(args.seed);
    let buffer = CandleBuffer::new(CANDLES_PER_SERIES);

    let mut prices: HashMap<String, f64> = store
        .positions
        .open_positions()
        .iter()
        .map(|p| (p.symbol.clone(), p.entry_price()))
        .collect();

    for tick in 0..args.ticks {
        let (scenario, step) = SCRIPT[tick % SCRIPT.len()];

        for symbol in store.positions.open_symbols() {
            let price = prices.entry(symbol.clone()).or_insert(100.0);
            *price *= 1.0 + step;
            generator.populate(&buffer, &symbol, scenario, CANDLES_PER_SERIES, *price)?;
        }

        let report = monitor.run_pass(&buffer, &mut store);
        print_tick(tick, scenario, &report);
    }

    println!("\n📊 Final state");
    println!("{}", "─".repeat(56));
    for position in store.positions.all_positions() {
        println!(
            "  {:<10} {:?} qty {:.4} entry ${:.4} status {:?}",
            position.symbol,
            position.state(),
            position.quantity(),
            position.entry_price(),
            position.status()
        );
    }
    println!("  Ledger total: ${:.2}", store.ledger.total());
    for entry in store.ledger.entries() {
        println!("    {:<10} ${:.2}", entry.symbol, entry.profit);
    }
    println!("  Signals logged: {}", sink.records().len());
    println!();

    Ok(())
}

fn print_tick(tick: usize, scenario: MarketScenario, report: &PassReport) {
    println!("\nTick {} ({:?})", tick + 1, scenario);

    if report.symbols.is_empty() {
        println!("  no open positions");
    }
    for symbol in &report.symbols {
        let price = symbol
            .price
            .map(|p| format!("${:.4}", p))
            .unwrap_or_else(|| "n/a".to_string());

        match &symbol.skipped {
            Some(reason) => println!("  {:<10} {} skipped: {}", symbol.symbol, price, reason),
            None if symbol.events.is_empty() => println!("  {:<10} {} hold", symbol.symbol, price),
            None => {
                for event in &symbol.events {
                    println!("  {:<10} {} {:?}", symbol.symbol, price, event);
                }
            }
        }
    }

    if let Some(adjustment) = &report.risk_adjustment {
        println!(
            "  risk {:.3} over limit by {:.3}: reduced {:?} (${:.2})",
            adjustment.risk, adjustment.excess, adjustment.reduced_symbols, adjustment.reduced_total
        );
    }
}
