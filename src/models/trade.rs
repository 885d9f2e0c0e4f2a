//! Trade-log model: append-only record of open and close actions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which side of the lifecycle a log row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Open,
    Close,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Open => "OPEN",
            TradeAction::Close => "CLOSE",
        }
    }
}

/// Execution status of a log row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Pending,
    Executing,
    Completed,
    Failed,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Pending => "pending",
            TradeStatus::Executing => "executing",
            TradeStatus::Completed => "completed",
            TradeStatus::Failed => "failed",
        }
    }
}

/// One row of the trade log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeLogEntry {
    pub id: Uuid,

    pub timestamp: DateTime<Utc>,

    /// Token symbol
    pub token: String,

    /// Number of chains involved
    pub chain_count: usize,

    /// Position this row belongs to; seeded rows have none
    #[serde(default)]
    pub position_id: Option<Uuid>,

    pub action: TradeAction,

    pub status: TradeStatus,

    /// Realized P&L, zero until close
    #[serde(default)]
    pub pnl: Decimal,
}

impl TradeLogEntry {
    /// Row recorded when a position is opened.
    pub fn opened(
        token: &str,
        chain_count: usize,
        position_id: Uuid,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            token: token.to_string(),
            chain_count,
            position_id: Some(position_id),
            action: TradeAction::Open,
            status: TradeStatus::Executing,
            pnl: Decimal::ZERO,
        }
    }

    /// Row recorded when a position is closed and its P&L realized.
    pub fn closed(
        token: &str,
        chain_count: usize,
        position_id: Uuid,
        pnl: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            token: token.to_string(),
            chain_count,
            position_id: Some(position_id),
            action: TradeAction::Close,
            status: TradeStatus::Completed,
            pnl,
        }
    }

    /// Whether the row has waited in `Executing` for at least `dwell`.
    pub fn is_stale(&self, now: DateTime<Utc>, dwell: chrono::Duration) -> bool {
        self.status == TradeStatus::Executing && now - self.timestamp >= dwell
    }

    pub fn is_profitable(&self) -> bool {
        self.pnl > Decimal::ZERO
    }
}
