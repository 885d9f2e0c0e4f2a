//! Session performance metrics over realized trades.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Statistics over the closed trades of one simulation session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionMetrics {
    // === Basic Statistics ===
    /// Number of closed trades
    pub total_trades: u32,

    /// Total realized P&L
    pub total_pnl: Decimal,

    // === Win/Loss Metrics ===
    pub winning_trades: u32,

    pub losing_trades: u32,

    /// Win rate (0.0 to 1.0)
    pub win_rate: f64,

    /// Average profit on winning trades
    pub avg_win: Decimal,

    /// Average loss on losing trades (absolute value)
    pub avg_loss: Decimal,

    /// Gross profit / gross loss
    pub profit_factor: f64,

    // === Risk Metrics ===
    /// Maximum drawdown of realized equity (0.0 to 1.0)
    pub max_drawdown: f64,

    /// Peak realized equity
    pub peak_equity: Decimal,

    /// Mean / std-dev of per-trade P&L, not annualized
    pub sharpe_ratio: f64,
}

impl SessionMetrics {
    /// Whether the session made money overall.
    pub fn is_profitable(&self) -> bool {
        self.total_pnl > Decimal::ZERO
    }
}
