//! Change notifications broadcast by the lifecycle engine.
//!
//! Display layers subscribe and re-render on each event; they never mutate
//! engine state directly.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Position, Token, TradeLogEntry};
use crate::trading::ExitReason;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineEvent {
    /// Market snapshot replaced by a new scan
    MarketUpdated { tokens: Vec<Token> },

    /// Position opened and capital committed
    PositionOpened { position: Box<Position> },

    /// Simulated fill landed; the position is now monitored
    PositionFilled { position_id: Uuid },

    /// Position closed and P&L realized
    PositionClosed {
        position: Box<Position>,
        reason: ExitReason,
        pnl: Decimal,
    },

    /// Row appended to the trade log
    TradeLogged { entry: Box<TradeLogEntry> },

    /// An executing trade-log row completed
    TradeSettled { entry_id: Uuid },

    BalanceChanged { balance: Decimal },

    /// Detail view opened or closed
    SelectionChanged { position_id: Option<Uuid> },
}

impl EngineEvent {
    /// JSON form for line-oriented consumers.
    #[inline]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"event":"SERIALIZATION_ERROR"}"#.to_string())
    }

    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::MarketUpdated { .. } => "market_updated",
            EngineEvent::PositionOpened { .. } => "position_opened",
            EngineEvent::PositionFilled { .. } => "position_filled",
            EngineEvent::PositionClosed { .. } => "position_closed",
            EngineEvent::TradeLogged { .. } => "trade_logged",
            EngineEvent::TradeSettled { .. } => "trade_settled",
            EngineEvent::BalanceChanged { .. } => "balance_changed",
            EngineEvent::SelectionChanged { .. } => "selection_changed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_event_json_tag() {
        let json = EngineEvent::BalanceChanged { balance: dec!(1440) }.to_json();
        assert!(json.contains(r#""event":"BALANCE_CHANGED""#));
        assert!(json.contains("1440"));
    }
}
