//! Data models for tokens, positions, trade-log rows, chain quotes and metrics.

mod market;
mod metrics;
mod position;
mod token;
mod trade;

pub use market::{ChainQuote, PriceComparison, ARBITRAGE_SPREAD_PCT};
pub use metrics::SessionMetrics;
pub use position::{Position, PositionStatus};
pub use token::{Token, Trend};
pub use trade::{TradeAction, TradeLogEntry, TradeStatus};

use rust_decimal::Decimal;

/// Round to `dp` decimals with halves going up (towards positive infinity).
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    let scale = Decimal::from(10u64.pow(dp));
    (value * scale + Decimal::new(5, 1)).floor() / scale
}
