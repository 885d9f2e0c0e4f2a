//! Position sizing from a risk tier and a momentum score.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::models::round_half_up;

/// Risk profile mapping to a fixed fraction of account balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Fraction of balance a full-momentum trade may commit.
    pub fn multiplier(&self) -> Decimal {
        match self {
            RiskTier::Low => dec!(0.15),
            RiskTier::Medium => dec!(0.35),
            RiskTier::High => dec!(0.60),
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "LOW",
            RiskTier::Medium => "MEDIUM",
            RiskTier::High => "HIGH",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calculator for trade notionals. Stateless.
pub struct PositionSizer;

impl PositionSizer {
    /// Notional for a new position, in whole currency units.
    ///
    /// `round(balance * multiplier * momentum / 100)`, never above
    /// `balance * multiplier`. Negative balances size to zero and momentum
    /// above 100 is treated as 100.
    pub fn size(balance: Decimal, tier: RiskTier, momentum_score: u8) -> Decimal {
        let balance = balance.max(Decimal::ZERO);
        let momentum = Decimal::from(momentum_score.min(100));

        let cap = balance * tier.multiplier();
        let raw = cap * momentum / dec!(100);

        // Rounding must not push the notional past the tier cap
        round_half_up(raw, 0).min(cap.floor())
    }

    /// Notional as a whole-number percentage of balance. Display only.
    pub fn percentage_of_balance(notional: Decimal, balance: Decimal) -> Decimal {
        if balance <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        round_half_up(notional / balance * dec!(100), 0)
    }
}
