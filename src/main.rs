//! Momentum Surfer
//!
//! Simulated multi-chain momentum trading: scans tokens for momentum, sizes
//! positions by risk tier and drives each position through its lifecycle
//! until a profit target, stop loss, time limit or momentum fade closes it.

mod demo;
mod error;
mod events;
mod metrics;
mod models;
mod simulation;
mod trading;

use std::path::PathBuf;

use anyhow::Result;
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::models::ARBITRAGE_SPREAD_PCT;
use crate::simulation::{Simulation, SimulationConfig};
use crate::trading::{EngineConfig, LifecycleEngine, PositionSizer, RandomWalk, RiskTier};

/// Momentum surfing simulator CLI.
#[derive(Parser)]
#[command(name = "surfer")]
#[command(about = "Simulated multi-chain momentum trading", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SURFER_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// JSON file with engine configuration overrides
    #[arg(short, long, env = "SURFER_CONFIG")]
    config: Option<PathBuf>,

    /// Starting balance (overrides config)
    #[arg(long, env = "SURFER_BALANCE")]
    balance: Option<Decimal>,

    /// Risk tier: low, medium, high (overrides config)
    #[arg(long, env = "SURFER_TIER", value_parser = parse_tier)]
    tier: Option<RiskTier>,

    /// Scan threshold 0-10; tokens need momentum >= threshold * 10
    #[arg(long, env = "SURFER_THRESHOLD", value_parser = clap::value_parser!(u8).range(0..=10))]
    threshold: Option<u8>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List demo tokens passing the momentum filter
    Scan {
        /// Also show how many tokens pass at every threshold 0-10
        #[arg(long)]
        sweep: bool,
    },

    /// Size a position for a balance, tier and momentum score
    Size {
        /// Momentum score 0-100
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
        momentum: u8,
    },

    /// Open a position on a demo token, let it fill, then close it manually
    OpenClose {
        /// Token symbol
        #[arg(short, long, default_value = "BTC")]
        token: String,

        /// Price walk seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Risk tier for this trade only: low, medium, high
        #[arg(short, long, value_parser = parse_tier)]
        risk: Option<RiskTier>,
    },

    /// Replay a session on a simulated clock
    Simulate {
        /// Number of ticks to run
        #[arg(short = 'n', long, default_value = "720")]
        ticks: u64,

        /// Seed for prices and market feed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Open a position on every scanned token
        #[arg(long)]
        surf: bool,

        /// Ticks between market re-scans (0 = never)
        #[arg(long, default_value = "3")]
        rescan_every: u64,

        /// Print engine events as JSON lines instead of the summary
        #[arg(long)]
        json: bool,
    },

    /// Run the simulation on wall-clock time until Ctrl+C
    Run {
        /// Open a position on every scanned token
        #[arg(long)]
        surf: bool,

        /// Ticks between market re-scans (0 = never)
        #[arg(long, default_value = "3")]
        rescan_every: u64,
    },

    /// Show cross-chain quotes and spreads
    Arbitrage,

    /// Show effective configuration and exit rules
    Config,
}

fn parse_tier(s: &str) -> std::result::Result<RiskTier, String> {
    RiskTier::from_str(s).ok_or_else(|| format!("unknown risk tier '{}' (low, medium, high)", s))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Effective configuration: defaults, then file, then flags
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(balance) = cli.balance {
        config.initial_balance = balance;
    }
    if let Some(tier) = cli.tier {
        config.risk_tier = tier;
    }
    if let Some(threshold) = cli.threshold {
        config.momentum_threshold = threshold;
    }

    match cli.command {
        Commands::Scan { sweep } => {
            let walk = RandomWalk::seeded(0, config.max_walk_pct);
            let mut engine = LifecycleEngine::new(config.clone(), Box::new(walk));
            engine.update_market(demo::tokens());
            let hits = engine.scan_market();

            println!(
                "\nMomentum >= {} ({} of {} tokens)\n",
                u16::from(engine.momentum_threshold()) * 10,
                hits.len(),
                engine.market().len()
            );
            println!(
                "{:<8} {:<12} {:>12} {:>8} {:>9} {:<14} {:>7}",
                "SYMBOL", "NAME", "PRICE", "24H%", "MOMENTUM", "TREND", "CHAINS"
            );
            println!("{}", "-".repeat(76));

            for token in hits {
                println!(
                    "{:<8} {:<12} {:>12} {:>7.1}% {:>9} {:<14} {:>7}",
                    token.symbol,
                    truncate(&token.name, 12),
                    token.price,
                    token.change_24h,
                    token.momentum_score,
                    token.trend.as_str(),
                    token.chain_count()
                );
            }

            if sweep {
                println!("\n--- Threshold Sweep ---");
                for threshold in 0..=10u8 {
                    engine.set_momentum_threshold(threshold);
                    let passing = engine.scan_market();
                    println!(
                        "  {:>2} (>= {:>3}): {:>2} tokens  {}",
                        threshold,
                        u16::from(threshold) * 10,
                        passing.len(),
                        passing.iter().map(|t| t.symbol.as_str()).collect::<Vec<_>>().join(" ")
                    );
                }
            }
        }

        Commands::Size { momentum } => {
            let notional = PositionSizer::size(config.initial_balance, config.risk_tier, momentum);
            let pct = PositionSizer::percentage_of_balance(notional, config.initial_balance);

            println!("\n=== Position Size ===");
            println!("Balance:     ${}", config.initial_balance);
            println!(
                "Risk Tier:   {} (x{})",
                config.risk_tier,
                config.risk_tier.multiplier()
            );
            println!("Momentum:    {}", momentum);
            println!("Notional:    ${}", notional);
            println!("Of Balance:  {:.1}%", pct);
        }

        Commands::OpenClose { token, seed, risk } => {
            let walk = RandomWalk::seeded(seed, config.max_walk_pct);
            let mut engine = LifecycleEngine::new(config.clone(), Box::new(walk));
            engine.update_market(demo::tokens());
            if let Some(tier) = risk {
                engine.set_risk_tier(tier);
            }

            let opened_at = Utc::now();
            let position = engine.open_with_current_tier(&token, opened_at)?;
            println!(
                "\nOpened {} {} @ ${} (notional ${}, {} chains)",
                position.quantity.round_dp(8),
                position.token,
                position.entry_price,
                position.notional,
                position.chain_count()
            );

            // Past the fill delay, then one monitored price step
            let filled_at = opened_at + config.fill_delay();
            engine.tick(filled_at);
            let stepped_at = filled_at + Duration::milliseconds(config.tick_interval_ms as i64);
            engine.tick(stepped_at);

            engine.select_position(position.id)?;
            if let Some(p) = engine.selected_position() {
                println!(
                    "Now {} @ ${} | P&L ${} ({}%) | {}",
                    p.token, p.current_price, p.unrealized_pnl, p.percentage_gain, p.status.as_str()
                );
            }

            let entry = engine.close_position(position.id, stepped_at)?;
            println!("Closed with P&L ${}", entry.pnl);
            println!("Balance: ${} -> ${}", config.initial_balance, engine.balance());
            if engine.selected_position().is_none() {
                println!("Detail view closed");
            }

            println!("\n--- Trade Log ---");
            for row in engine.trade_log() {
                println!(
                    "  {} {:<6} {:<6} {:>2} chains {:<10} ${}{}",
                    row.timestamp.format("%H:%M:%S"),
                    row.action.as_str(),
                    row.token,
                    row.chain_count,
                    row.status.as_str(),
                    row.pnl,
                    if row.is_profitable() { " +" } else { "" }
                );
            }
        }

        Commands::Simulate {
            ticks,
            seed,
            surf,
            rescan_every,
            json,
        } => {
            info!(ticks = ticks, seed = seed, surf = surf, "Starting simulation");

            let sim_config = SimulationConfig {
                engine: config,
                surf_mode: surf,
                rescan_every,
                seed: Some(seed),
            };
            let start = Utc::now();
            let mut sim = Simulation::new(sim_config, demo::tokens())
                .with_trade_log(demo::seeded_trade_log(start));

            if json {
                let mut rx = sim.engine().subscribe();
                let period = Duration::milliseconds(sim.tick_interval().as_millis() as i64);
                let mut now = start;
                for _ in 0..ticks {
                    now += period;
                    sim.step(now);
                    // Drain per tick so the channel never lags
                    while let Ok(event) = rx.try_recv() {
                        println!("{}", event.to_json());
                    }
                }
            } else {
                let results = sim.run_ticks(ticks, start);
                println!("{}", results);
            }
        }

        Commands::Run { surf, rescan_every } => {
            let sim_config = SimulationConfig {
                engine: config,
                surf_mode: surf,
                rescan_every,
                seed: None,
            };
            let mut sim = Simulation::new(sim_config, demo::tokens())
                .with_trade_log(demo::seeded_trade_log(Utc::now()));

            println!("\n=== Momentum Surfer ===");
            println!("Balance:   ${}", sim.engine().balance());
            println!("Risk Tier: {}", sim.engine().risk_tier());
            println!("Surf Mode: {}", if surf { "ON" } else { "OFF" });
            println!("Interval:  {}ms", sim.tick_interval().as_millis());
            println!("\nThis is SIMULATED trading - no real money involved.");
            println!("Press Ctrl+C to stop.\n");

            sim.run_live(None, |sim, report| {
                let engine = sim.engine();
                for closed in &report.closed {
                    println!(
                        "  closed {} ({}) P&L ${}",
                        closed.position.token, closed.reason, closed.entry.pnl
                    );
                }
                if !report.closed.is_empty() {
                    println!("  realized this tick: ${}", report.realized_pnl());
                }
                println!(
                    "[{}] #{} Balance: ${:.2} | Equity: ${:.2} | Open: {} | Trades: {}",
                    chrono::Local::now().format("%H:%M:%S"),
                    sim.ticks(),
                    engine.balance(),
                    engine.equity(),
                    engine.open_positions().len(),
                    engine.trade_log().len()
                );
            })
            .await?;

            println!("{}", sim.results());
        }

        Commands::Arbitrage => {
            println!("\n=== Cross-Chain Prices ===");
            println!("Arbitrage when spread > {}%", ARBITRAGE_SPREAD_PCT);
            for comparison in demo::price_comparisons() {
                println!("\n{}", comparison.token);
                for quote in &comparison.quotes {
                    println!(
                        "  {:<10} {:<6} ${:>10} {:>6}%",
                        quote.chain, quote.symbol, quote.price, quote.change
                    );
                }

                let spread = comparison.spread_pct().unwrap_or(Decimal::ZERO);
                let route = match (comparison.cheapest(), comparison.richest()) {
                    (Some(lo), Some(hi)) => format!("buy {} / sell {}", lo.chain, hi.chain),
                    _ => "-".to_string(),
                };
                println!(
                    "  Spread: {:.2}% | {} | {}",
                    spread,
                    route,
                    if comparison.is_arbitrage() { "ARBITRAGE" } else { "no opportunity" }
                );
            }
        }

        Commands::Config => {
            let walk = RandomWalk::seeded(0, config.max_walk_pct);
            let engine = LifecycleEngine::new(config, Box::new(walk));
            let config = engine.config();

            println!("\n=== Engine Configuration ===\n");
            println!("Account:");
            println!("  Initial Balance:      ${}", config.initial_balance);
            println!("  Risk Tier:            {} (x{})", config.risk_tier, config.risk_tier.multiplier());
            println!("  Momentum Threshold:   {} (score >= {})",
                config.momentum_threshold,
                u16::from(config.momentum_threshold) * 10);

            println!("\nScheduling:");
            println!("  Tick Interval:        {}ms", config.tick_interval_ms);
            println!("  Fill Delay:           {}s", config.fill_delay_secs);
            println!("  Settle Dwell:         {}s", config.settle_dwell_secs);
            println!("  Max Price Step:       {}%", config.max_walk_pct * Decimal::ONE_HUNDRED);
            println!("  Event Buffer:         {}", config.event_buffer);

            println!("\n=== Exit Rules ===\n");
            println!(
                "  {:<8} {:>8} {:>8} {:>8} {:>8}",
                "TOKEN", "TARGET%", "STOP%", "HOURS", "FADE"
            );
            println!("  {}", "-".repeat(44));
            for (symbol, rule) in engine.strategies().entries() {
                println!(
                    "  {:<8} {:>8} {:>8} {:>8} {:>8}",
                    symbol, rule.profit_target, rule.stop_loss, rule.time_limit_hours, rule.momentum_fade
                );
            }
            let fallback = engine.strategies().default_strategy();
            println!(
                "  {:<8} {:>8} {:>8} {:>8} {:>8}",
                "(other)", fallback.profit_target, fallback.stop_loss,
                fallback.time_limit_hours, fallback.momentum_fade
            );
        }
    }

    Ok(())
}

/// Truncate a string with ellipsis if it has more than `max_len` characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate("Bitcoin", 12), "Bitcoin");
        assert_eq!(truncate("Avalanche Network", 12), "Avalanche...");
    }

    #[test]
    fn test_truncate_multibyte_names() {
        // The cut lands inside a multi-byte character when slicing by bytes
        assert_eq!(truncate("Ünïcödé Tökên", 10), "Ünïcödé...");
        assert_eq!(truncate("ビットコイン・キャッシュ", 8), "ビットコイ...");
        assert_eq!(truncate("ab", 2), "ab");
    }

    #[test]
    fn test_parse_tier() {
        assert_eq!(parse_tier("HIGH"), Ok(RiskTier::High));
        assert!(parse_tier("extreme").is_err());
    }
}
