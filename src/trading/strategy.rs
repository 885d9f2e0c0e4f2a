//! Exit rules: per-token thresholds and the exit predicate.
//!
//! A position exits when any of these holds:
//! - percentage gain reached the profit target
//! - percentage loss reached the stop loss
//! - the position has been held for the time limit
//! - the token's momentum faded below the threshold
//!
//! All four are equally authoritative. When several trip at once the
//! recorded reason is the first one in the order above.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::Position;

/// Exit thresholds for one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitStrategy {
    /// Take profit at this percentage gain (e.g., 15 = +15%)
    pub profit_target: Decimal,

    /// Stop out at this percentage loss (e.g., 8 = -8%)
    pub stop_loss: Decimal,

    /// Maximum holding period in hours
    pub time_limit_hours: Decimal,

    /// Momentum below this value means the move is dead
    pub momentum_fade: u8,
}

impl ExitStrategy {
    pub fn new(
        profit_target: Decimal,
        stop_loss: Decimal,
        time_limit_hours: Decimal,
        momentum_fade: u8,
    ) -> Self {
        Self {
            profit_target,
            stop_loss,
            time_limit_hours,
            momentum_fade,
        }
    }

    /// Evaluate the exit predicate for a position.
    ///
    /// `current_momentum` is the token's latest score; `None` skips the fade
    /// check (token missing from the market snapshot).
    pub fn check_exit(
        &self,
        position: &Position,
        current_momentum: Option<u8>,
        now: DateTime<Utc>,
    ) -> ExitSignal {
        let gain = position.percentage_gain;

        if gain >= self.profit_target {
            debug!(
                token = %position.token,
                gain = %gain,
                target = %self.profit_target,
                "Profit target reached"
            );
            return ExitSignal::exit(ExitReason::ProfitTarget);
        }

        if gain <= -self.stop_loss {
            warn!(
                token = %position.token,
                gain = %gain,
                stop = %self.stop_loss,
                "Stop loss triggered"
            );
            return ExitSignal::exit(ExitReason::StopLoss);
        }

        let hours = position.hours_elapsed(now);
        if hours >= self.time_limit_hours {
            info!(
                token = %position.token,
                hours = %hours.round_dp(2),
                limit = %self.time_limit_hours,
                "Time limit reached"
            );
            return ExitSignal::exit(ExitReason::TimeLimit);
        }

        if let Some(momentum) = current_momentum {
            if momentum < self.momentum_fade {
                info!(
                    token = %position.token,
                    momentum = momentum,
                    threshold = self.momentum_fade,
                    "Momentum faded"
                );
                return ExitSignal::exit(ExitReason::MomentumFade);
            }
        }

        ExitSignal::hold()
    }
}

/// Reason a position left the open set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    ProfitTarget,
    StopLoss,
    TimeLimit,
    MomentumFade,
    ManualClose,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::ProfitTarget => "Profit Target",
            ExitReason::StopLoss => "Stop Loss",
            ExitReason::TimeLimit => "Time Limit",
            ExitReason::MomentumFade => "Momentum Fade",
            ExitReason::ManualClose => "Manual Close",
        }
    }
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an exit evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitSignal {
    pub should_exit: bool,
    pub reason: Option<ExitReason>,
}

impl ExitSignal {
    pub fn exit(reason: ExitReason) -> Self {
        Self {
            should_exit: true,
            reason: Some(reason),
        }
    }

    pub fn hold() -> Self {
        Self {
            should_exit: false,
            reason: None,
        }
    }
}

/// Immutable symbol -> strategy table with an explicit default entry.
#[derive(Debug, Clone)]
pub struct ExitStrategyTable {
    entries: HashMap<String, ExitStrategy>,
    default: ExitStrategy,
}

impl ExitStrategyTable {
    pub fn new(entries: HashMap<String, ExitStrategy>, default: ExitStrategy) -> Self {
        Self { entries, default }
    }

    /// Strategy for a symbol, falling back to the default profile.
    pub fn lookup(&self, symbol: &str) -> ExitStrategy {
        self.entries.get(symbol).copied().unwrap_or(self.default)
    }

    pub fn default_strategy(&self) -> ExitStrategy {
        self.default
    }

    /// Whether a symbol has a dedicated entry.
    pub fn has_entry(&self, symbol: &str) -> bool {
        self.entries.contains_key(symbol)
    }

    /// Dedicated entries sorted by symbol.
    pub fn entries(&self) -> Vec<(&str, ExitStrategy)> {
        let mut rows: Vec<_> = self
            .entries
            .iter()
            .map(|(symbol, strategy)| (symbol.as_str(), *strategy))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(b.0));
        rows
    }
}

impl Default for ExitStrategyTable {
    fn default() -> Self {
        let btc = ExitStrategy::new(dec!(15), dec!(8), dec!(24), 40);

        let entries = HashMap::from([
            ("BTC".to_string(), btc),
            ("ETH".to_string(), ExitStrategy::new(dec!(18), dec!(9), dec!(18), 38)),
            ("SOL".to_string(), ExitStrategy::new(dec!(22), dec!(12), dec!(12), 42)),
            ("MATIC".to_string(), ExitStrategy::new(dec!(25), dec!(12), dec!(12), 45)),
            ("AVAX".to_string(), ExitStrategy::new(dec!(20), dec!(10), dec!(16), 42)),
        ]);

        // Tokens without a dedicated profile trade with BTC's
        Self::new(entries, btc)
    }
}
