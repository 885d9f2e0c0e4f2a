//! Token snapshot model: one tradable asset as seen by a market scan.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Qualitative trend label attached to a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    VeryBullish,
    Building,
    Fading,
    Bearish,
}

impl Trend {
    /// Classify a momentum score into a trend bucket.
    pub fn from_momentum(score: u8) -> Self {
        match score {
            80..=u8::MAX => Trend::VeryBullish,
            55..=79 => Trend::Building,
            40..=54 => Trend::Fading,
            _ => Trend::Bearish,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::VeryBullish => "Very Bullish",
            Trend::Building => "Building",
            Trend::Fading => "Fading",
            Trend::Bearish => "Bearish",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable per-scan snapshot of a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Ticker symbol (e.g., "BTC")
    pub symbol: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Current display price
    pub price: Decimal,

    /// 24h change in percent
    #[serde(default)]
    pub change_24h: Decimal,

    /// Momentum score, 0-100
    pub momentum_score: u8,

    pub trend: Trend,

    /// Chains the token is available on
    #[serde(default)]
    pub chains: Vec<String>,
}

impl Token {
    /// Build a token whose trend is derived from its momentum score.
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        price: Decimal,
        change_24h: Decimal,
        momentum_score: u8,
        chains: &[&str],
    ) -> Self {
        let momentum_score = momentum_score.min(100);
        Self {
            symbol: symbol.into(),
            name: name.into(),
            price,
            change_24h,
            momentum_score,
            trend: Trend::from_momentum(momentum_score),
            chains: chains.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Number of chains this token trades on.
    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }
}
