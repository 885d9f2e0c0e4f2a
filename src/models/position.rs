//! Simulated position held by the lifecycle engine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::round_half_up;
use crate::trading::ExitStrategy;

/// Lifecycle status of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    /// Waiting for the simulated fill; no exit evaluation
    Entering,
    /// Filled; exits are evaluated every tick
    Monitoring,
    /// An exit fired and the close is in progress
    Exiting,
    /// Closed and removed from the open set
    Completed,
}

impl PositionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionStatus::Entering => "entering",
            PositionStatus::Monitoring => "monitoring",
            PositionStatus::Exiting => "exiting",
            PositionStatus::Completed => "completed",
        }
    }
}

/// A single simulated long position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: Uuid,

    /// Underlying token symbol
    pub token: String,

    /// Price at open
    pub entry_price: Decimal,

    /// Latest simulated price
    pub current_price: Decimal,

    /// Units held, fixed at open
    pub quantity: Decimal,

    /// Amount debited from the account at open
    pub notional: Decimal,

    pub opened_at: DateTime<Utc>,

    /// Chains the position was routed through
    #[serde(default)]
    pub chains: Vec<String>,

    /// Exit thresholds copied from the strategy table at open
    pub exit: ExitStrategy,

    pub status: PositionStatus,

    /// Unrealized P&L in whole currency units
    pub unrealized_pnl: Decimal,

    /// Unrealized P&L as percent of committed capital, two decimals
    pub percentage_gain: Decimal,
}

impl Position {
    /// Create a position in the `Entering` state buying `notional` worth at
    /// `entry_price`. A non-positive price yields zero quantity.
    pub fn open(
        token: String,
        chains: Vec<String>,
        entry_price: Decimal,
        notional: Decimal,
        exit: ExitStrategy,
        opened_at: DateTime<Utc>,
    ) -> Self {
        let quantity = if entry_price > Decimal::ZERO {
            notional / entry_price
        } else {
            Decimal::ZERO
        };
        Self {
            id: Uuid::new_v4(),
            token,
            entry_price,
            current_price: entry_price,
            quantity,
            notional,
            opened_at,
            chains,
            exit,
            status: PositionStatus::Entering,
            unrealized_pnl: Decimal::ZERO,
            percentage_gain: Decimal::ZERO,
        }
    }

    /// Capital locked at open: `quantity * entry_price`.
    pub fn committed_capital(&self) -> Decimal {
        self.quantity * self.entry_price
    }

    /// Move to a new price and recompute the derived P&L fields.
    pub fn update_price(&mut self, current_price: Decimal) {
        self.current_price = current_price;
        self.unrealized_pnl =
            round_half_up(self.quantity * (current_price - self.entry_price), 0);

        let committed = self.committed_capital();
        self.percentage_gain = if committed.is_zero() {
            Decimal::ZERO
        } else {
            round_half_up(self.unrealized_pnl / committed * dec!(100), 2)
        };
    }

    /// Fractional hours since open. Negative clock skew counts as zero.
    pub fn hours_elapsed(&self, now: DateTime<Utc>) -> Decimal {
        let millis = (now - self.opened_at).num_milliseconds().max(0);
        Decimal::from(millis) / dec!(3_600_000)
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn btc_position() -> Position {
        Position::open(
            "BTC".to_string(),
            vec!["ETH".to_string(), "BSC".to_string()],
            dec!(43180),
            dec!(1079.5),
            ExitStrategy::new(dec!(15), dec!(8), dec!(24), 40),
            Utc::now(),
        )
    }

    #[test]
    fn test_position_pnl() {
        let mut pos = btc_position();
        assert_eq!(pos.quantity, dec!(0.025));
        assert_eq!(pos.committed_capital(), dec!(1079.5));
        assert_eq!(pos.unrealized_pnl, dec!(0));
        assert_eq!(pos.status, PositionStatus::Entering);

        pos.update_price(dec!(43950));
        assert_eq!(pos.unrealized_pnl, dec!(19));
        assert_eq!(pos.percentage_gain, dec!(1.76));

        // Committed capital never moves with the price
        assert_eq!(pos.committed_capital(), dec!(1079.5));
    }

    #[test]
    fn test_position_loss_rounding() {
        let mut pos = btc_position();
        // 0.025 * -780 = -19.5, half rounds up towards zero
        pos.update_price(dec!(42400));
        assert_eq!(pos.unrealized_pnl, dec!(-19));
        assert!(pos.percentage_gain < Decimal::ZERO);
    }

    #[test]
    fn test_zero_quantity_has_no_gain() {
        let mut pos = btc_position();
        pos.quantity = Decimal::ZERO;
        pos.update_price(dec!(50000));
        assert_eq!(pos.unrealized_pnl, dec!(0));
        assert_eq!(pos.percentage_gain, dec!(0));
    }

    #[test]
    fn test_hours_elapsed() {
        let pos = btc_position();
        let later = pos.opened_at + Duration::minutes(90);
        assert_eq!(pos.hours_elapsed(later), dec!(1.5));
        assert_eq!(pos.hours_elapsed(pos.opened_at - Duration::hours(1)), dec!(0));
    }
}
