//! Cross-chain price comparison for a single token.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Spread above which a comparison is flagged as an arbitrage opportunity (percent).
pub const ARBITRAGE_SPREAD_PCT: Decimal = dec!(1);

/// Price of a token on one chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainQuote {
    /// Chain name (e.g., "Ethereum")
    pub chain: String,

    /// Wrapped symbol on that chain (e.g., "wBTC")
    pub symbol: String,

    pub price: Decimal,

    /// Change relative to the reference chain, in percent
    #[serde(default)]
    pub change: Decimal,
}

impl ChainQuote {
    pub fn new(chain: &str, symbol: &str, price: Decimal, change: Decimal) -> Self {
        Self {
            chain: chain.to_string(),
            symbol: symbol.to_string(),
            price,
            change,
        }
    }
}

/// All chain quotes for one token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceComparison {
    pub token: String,
    pub quotes: Vec<ChainQuote>,
}

impl PriceComparison {
    pub fn new(token: impl Into<String>, quotes: Vec<ChainQuote>) -> Self {
        Self {
            token: token.into(),
            quotes,
        }
    }

    /// Cheapest quote across chains.
    pub fn cheapest(&self) -> Option<&ChainQuote> {
        self.quotes.iter().min_by(|a, b| a.price.cmp(&b.price))
    }

    /// Most expensive quote across chains.
    pub fn richest(&self) -> Option<&ChainQuote> {
        self.quotes.iter().max_by(|a, b| a.price.cmp(&b.price))
    }

    /// Spread between the richest and cheapest chain, in percent of the cheapest.
    pub fn spread_pct(&self) -> Option<Decimal> {
        let min = self.cheapest()?.price;
        let max = self.richest()?.price;
        if min <= Decimal::ZERO {
            return None;
        }
        Some((max - min) / min * dec!(100))
    }

    /// Whether the spread clears the arbitrage threshold.
    pub fn is_arbitrage(&self) -> bool {
        self.spread_pct()
            .is_some_and(|spread| spread > ARBITRAGE_SPREAD_PCT)
    }
}
