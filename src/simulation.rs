//! Simulation host: drives the lifecycle engine on a fixed cadence.
//!
//! Features:
//! - Periodic engine tick plus trade-log settlement, run back to back
//! - Simulated market feed re-scanned every few ticks
//! - Optional surf mode that opens a position on every scanned token
//! - Deterministic replay on a simulated clock for a fixed seed
//! - Live loop on wall-clock time until Ctrl+C

use std::collections::HashMap;
use std::time::Duration as StdDuration;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal_macros::dec;
use tracing::{debug, info};

use crate::metrics::MetricsCalculator;
use crate::models::{SessionMetrics, Token, TradeLogEntry, Trend};
use crate::trading::{
    ClosedPosition, EngineConfig, ExitReason, LifecycleEngine, PriceWalk, RandomWalk, TickReport,
};

/// Simulation configuration.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Engine configuration
    pub engine: EngineConfig,

    /// Open a position on every scanned token that has none
    pub surf_mode: bool,

    /// Ticks between market re-scans (0 = never)
    pub rescan_every: u64,

    /// Seed for prices and market feed; `None` uses entropy
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            surf_mode: false,
            rescan_every: 3,
            seed: None,
        }
    }
}

// ============== Market Feed ==============

/// Simulated market data: each re-scan nudges momentum and display prices.
pub struct MarketFeed {
    rng: StdRng,
    tokens: Vec<Token>,
}

impl MarketFeed {
    /// Max momentum change per re-scan, in points
    const MOMENTUM_JITTER: i16 = 5;
    /// Max display-price change per re-scan, as a fraction
    const PRICE_JITTER: f64 = 0.01;

    pub fn new(tokens: Vec<Token>, rng: StdRng) -> Self {
        Self { rng, tokens }
    }

    /// Produce a fresh snapshot replacing the previous one.
    pub fn rescan(&mut self) -> Vec<Token> {
        for token in self.tokens.iter_mut() {
            let delta = self
                .rng
                .gen_range(-Self::MOMENTUM_JITTER..=Self::MOMENTUM_JITTER);
            token.momentum_score = (i16::from(token.momentum_score) + delta).clamp(0, 100) as u8;
            token.trend = Trend::from_momentum(token.momentum_score);

            let move_pct = self.rng.gen_range(-Self::PRICE_JITTER..=Self::PRICE_JITTER);
            let factor = Decimal::from_f64(move_pct).unwrap_or(Decimal::ZERO);
            token.price = (token.price * (Decimal::ONE + factor)).round_dp(8);
            token.change_24h = (token.change_24h + factor * dec!(100)).round_dp(2);
        }
        self.tokens.clone()
    }
}

// ============== Simulation ==============

/// Owns the engine and plays the role of the host scheduler.
pub struct Simulation {
    config: SimulationConfig,
    engine: LifecycleEngine,
    feed: MarketFeed,
    ticks: u64,
    closed: Vec<ClosedPosition>,
    started_at: Option<DateTime<Utc>>,
    last_tick_at: Option<DateTime<Utc>>,
}

impl Simulation {
    /// Create a simulation over an initial market snapshot.
    pub fn new(config: SimulationConfig, tokens: Vec<Token>) -> Self {
        let max_step = config.engine.max_walk_pct;
        let (walk, feed_rng): (Box<dyn PriceWalk>, StdRng) = match config.seed {
            Some(seed) => (
                Box::new(RandomWalk::seeded(seed, max_step)),
                StdRng::seed_from_u64(seed.wrapping_add(1)),
            ),
            None => (Box::new(RandomWalk::from_entropy(max_step)), StdRng::from_entropy()),
        };

        let mut engine = LifecycleEngine::new(config.engine.clone(), walk);
        engine.update_market(tokens.clone());

        Self {
            feed: MarketFeed::new(tokens, feed_rng),
            engine,
            config,
            ticks: 0,
            closed: Vec::new(),
            started_at: None,
            last_tick_at: None,
        }
    }

    /// Start from pre-existing trade-log rows.
    pub fn with_trade_log(mut self, entries: Vec<TradeLogEntry>) -> Self {
        self.engine = self.engine.with_trade_log(entries);
        self
    }

    pub fn engine(&self) -> &LifecycleEngine {
        &self.engine
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Tick period from the engine configuration (at least 1ms).
    pub fn tick_interval(&self) -> StdDuration {
        StdDuration::from_millis(self.config.engine.tick_interval_ms.max(1))
    }

    /// One scheduling turn: re-scan, surf entries, engine tick, settlement.
    pub fn step(&mut self, now: DateTime<Utc>) -> TickReport {
        self.started_at.get_or_insert(now);
        self.ticks += 1;

        if self.config.rescan_every > 0 && self.ticks % self.config.rescan_every == 0 {
            let tokens = self.feed.rescan();
            self.engine.update_market(tokens);
        }

        if self.config.surf_mode {
            self.surf(now);
        }

        let report = self.engine.tick(now);
        self.engine.settle_trade_log(now);

        self.closed.extend(report.closed.iter().cloned());
        self.last_tick_at = Some(now);
        report
    }

    /// Open positions on scanned tokens that are not held yet.
    fn surf(&mut self, now: DateTime<Utc>) {
        for token in self.engine.scan_market() {
            if self.engine.has_open_position(&token.symbol) {
                continue;
            }
            match self.engine.open_with_current_tier(&token.symbol, now) {
                Ok(position) => {
                    debug!(token = %token.symbol, id = %position.id, "Surf entry");
                }
                Err(e) => {
                    debug!(token = %token.symbol, error = %e, "Surf entry skipped");
                }
            }
        }
    }

    /// Replay `n` ticks on a simulated clock starting at `start`.
    pub fn run_ticks(&mut self, n: u64, start: DateTime<Utc>) -> SimulationResults {
        let period = Duration::milliseconds(self.config.engine.tick_interval_ms as i64);
        let mut now = start;
        for _ in 0..n {
            now += period;
            self.step(now);
        }
        self.results()
    }

    /// Run on wall-clock time until Ctrl+C or `max_ticks`.
    ///
    /// `on_tick` sees the simulation after every step. Stopping discards
    /// nothing here; the caller drops the simulation to discard state.
    pub async fn run_live<F>(&mut self, max_ticks: Option<u64>, mut on_tick: F) -> Result<()>
    where
        F: FnMut(&Simulation, &TickReport),
    {
        let mut interval = tokio::time::interval(self.tick_interval());
        // First interval tick fires immediately
        interval.tick().await;

        info!(
            interval_ms = self.config.engine.tick_interval_ms,
            surf = self.config.surf_mode,
            "Simulation started"
        );

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
                _ = interval.tick() => {
                    let report = self.step(Utc::now());
                    on_tick(self, &report);
                    if max_ticks.is_some_and(|max| self.ticks >= max) {
                        break;
                    }
                }
            }
        }

        info!(ticks = self.ticks, balance = %self.engine.balance(), "Simulation stopped");
        Ok(())
    }

    /// Summary of the session so far.
    pub fn results(&self) -> SimulationResults {
        let pnls: Vec<Decimal> = self.closed.iter().map(|c| c.entry.pnl).collect();
        let initial = self.config.engine.initial_balance;

        let mut by_reason: HashMap<ExitReason, (usize, Decimal)> = HashMap::new();
        for closed in &self.closed {
            let entry = by_reason.entry(closed.reason).or_insert((0, Decimal::ZERO));
            entry.0 += 1;
            entry.1 += closed.entry.pnl;
        }

        let now = self.last_tick_at.unwrap_or_else(Utc::now);
        SimulationResults {
            initial_balance: initial,
            final_balance: self.engine.balance(),
            equity: self.engine.equity(),
            ticks: self.ticks,
            open_positions: self.engine.open_positions().len(),
            closed: self.closed.clone(),
            by_reason,
            metrics: MetricsCalculator::calculate(&pnls, initial),
            start_time: self.started_at.unwrap_or(now),
            end_time: now,
        }
    }
}

/// Session summary.
#[derive(Debug, Clone)]
pub struct SimulationResults {
    pub initial_balance: Decimal,

    /// Free balance after the last tick
    pub final_balance: Decimal,

    /// Balance plus open positions at their last price
    pub equity: Decimal,

    pub ticks: u64,

    pub open_positions: usize,

    /// Every closed position, in close order
    pub closed: Vec<ClosedPosition>,

    /// Count and realized P&L per exit reason
    pub by_reason: HashMap<ExitReason, (usize, Decimal)>,

    pub metrics: SessionMetrics,

    pub start_time: DateTime<Utc>,

    pub end_time: DateTime<Utc>,
}

impl std::fmt::Display for SimulationResults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let m = &self.metrics;
        writeln!(f, "\n{:=^60}", " SIMULATION RESULTS ")?;
        writeln!(f)?;
        writeln!(f, "Period: {} to {} ({} ticks)",
            self.start_time.format("%Y-%m-%d %H:%M:%S"),
            self.end_time.format("%Y-%m-%d %H:%M:%S"),
            self.ticks)?;
        writeln!(f)?;
        writeln!(f, "--- Account ---")?;
        writeln!(f, "Initial:     ${:.2}", self.initial_balance)?;
        writeln!(f, "Balance:     ${:.2}", self.final_balance)?;
        writeln!(f, "Equity:      ${:.2}", self.equity)?;
        writeln!(f, "Open:        {} positions", self.open_positions)?;
        writeln!(f)?;
        writeln!(f, "--- Trades ---")?;
        writeln!(f, "Closed:      {}", m.total_trades)?;
        writeln!(f, "Winners:     {} ({:.1}%)", m.winning_trades, m.win_rate * 100.0)?;
        writeln!(f, "Losers:      {}", m.losing_trades)?;
        writeln!(f, "Realized:    ${:.2} ({})", m.total_pnl,
            if m.is_profitable() { "profitable" } else { "not profitable" })?;
        writeln!(f, "Avg Win:     ${:.2}", m.avg_win)?;
        writeln!(f, "Avg Loss:    ${:.2}", m.avg_loss)?;
        writeln!(f, "Profit Factor: {:.2}", m.profit_factor)?;
        writeln!(f)?;
        writeln!(f, "--- Risk Metrics ---")?;
        writeln!(f, "Max Drawdown: {:.2}%", m.max_drawdown * 100.0)?;
        writeln!(f, "Sharpe (per trade): {:.2}", m.sharpe_ratio)?;

        if !self.by_reason.is_empty() {
            writeln!(f)?;
            writeln!(f, "--- Exits by Reason ---")?;
            let mut reasons: Vec<_> = self.by_reason.iter().collect();
            reasons.sort_by_key(|(reason, _)| reason.as_str());
            for (reason, (count, pnl)) in reasons {
                writeln!(f, "  {:<16} {:>3} trades  ${:.2}", reason.as_str(), count, pnl)?;
            }
        }

        if !self.closed.is_empty() {
            writeln!(f)?;
            writeln!(f, "--- Last Closes ---")?;
            for closed in self.closed.iter().rev().take(5) {
                writeln!(f, "  {} {:<6} {:<16} ${:.2} ({}%)",
                    closed.entry.timestamp.format("%H:%M:%S"),
                    closed.position.token,
                    closed.reason.as_str(),
                    closed.entry.pnl,
                    closed.position.percentage_gain)?;
            }
        }
        writeln!(f, "{:=^60}", "")?;
        Ok(())
    }
}
