//! Calculator for session metrics: win rate, drawdown, Sharpe ratio, etc.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use statrs::statistics::Statistics;

use crate::models::SessionMetrics;

/// Calculator for computing session performance metrics.
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Calculate metrics from realized P&Ls in close order.
    ///
    /// Equity starts at `initial_balance` and moves by each realized P&L.
    pub fn calculate(pnls: &[Decimal], initial_balance: Decimal) -> SessionMetrics {
        let mut metrics = SessionMetrics {
            peak_equity: initial_balance,
            ..Default::default()
        };

        if pnls.is_empty() {
            return metrics;
        }

        metrics.total_trades = pnls.len() as u32;
        metrics.total_pnl = pnls.iter().copied().sum();

        Self::calculate_win_loss(&mut metrics, pnls);
        Self::calculate_drawdown(&mut metrics, pnls, initial_balance);
        Self::calculate_sharpe(&mut metrics, pnls);

        metrics
    }

    fn calculate_win_loss(metrics: &mut SessionMetrics, pnls: &[Decimal]) {
        let (wins, losses): (Vec<Decimal>, Vec<Decimal>) =
            pnls.iter().copied().partition(|p| *p > Decimal::ZERO);
        // Break-even trades count as neither
        let losses: Vec<Decimal> = losses.into_iter().filter(|l| *l < Decimal::ZERO).collect();

        metrics.winning_trades = wins.len() as u32;
        metrics.losing_trades = losses.len() as u32;
        metrics.win_rate = wins.len() as f64 / pnls.len() as f64;

        let gross_profit: Decimal = wins.iter().copied().sum();
        let gross_loss: Decimal = losses.iter().map(|l| l.abs()).sum();

        if !wins.is_empty() {
            metrics.avg_win = gross_profit / Decimal::from(wins.len() as u32);
        }
        if !losses.is_empty() {
            metrics.avg_loss = gross_loss / Decimal::from(losses.len() as u32);
        }

        if gross_loss > Decimal::ZERO {
            metrics.profit_factor =
                gross_profit.to_f64().unwrap_or(0.0) / gross_loss.to_f64().unwrap_or(1.0);
        }
    }

    /// Maximum drawdown of the realized equity curve.
    fn calculate_drawdown(metrics: &mut SessionMetrics, pnls: &[Decimal], initial: Decimal) {
        let mut equity = initial;
        let mut peak = initial;
        let mut max_dd_pct = 0.0f64;

        for pnl in pnls {
            equity += pnl;

            if equity > peak {
                peak = equity;
            }

            if peak > Decimal::ZERO {
                let dd = ((peak - equity) / peak).to_f64().unwrap_or(0.0);
                if dd > max_dd_pct {
                    max_dd_pct = dd;
                }
            }
        }

        metrics.max_drawdown = max_dd_pct;
        metrics.peak_equity = peak;
    }

    /// Per-trade Sharpe ratio (mean / std-dev), zero-rate, not annualized.
    fn calculate_sharpe(metrics: &mut SessionMetrics, pnls: &[Decimal]) {
        if pnls.len() < 2 {
            return;
        }

        let returns: Vec<f64> = pnls.iter().filter_map(|p| p.to_f64()).collect();
        let mean = returns.as_slice().mean();
        let std_dev = returns.as_slice().std_dev();

        if std_dev > 0.0 && std_dev.is_finite() {
            metrics.sharpe_ratio = mean / std_dev;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_session() {
        let m = MetricsCalculator::calculate(&[], dec!(2000));
        assert_eq!(m.total_trades, 0);
        assert_eq!(m.peak_equity, dec!(2000));
        assert_eq!(m.win_rate, 0.0);
    }

    #[test]
    fn test_win_loss_stats() {
        let pnls = [dec!(84), dec!(-56), dec!(19), dec!(0)];
        let m = MetricsCalculator::calculate(&pnls, dec!(2000));

        assert_eq!(m.total_trades, 4);
        assert_eq!(m.total_pnl, dec!(47));
        assert_eq!(m.winning_trades, 2);
        assert_eq!(m.losing_trades, 1);
        assert!((m.win_rate - 0.5).abs() < 1e-9);
        assert_eq!(m.avg_win, dec!(51.5));
        assert_eq!(m.avg_loss, dec!(56));
        assert!((m.profit_factor - 103.0 / 56.0).abs() < 1e-9);
        assert!(m.is_profitable());
    }

    #[test]
    fn test_drawdown_from_peak() {
        let pnls = [dec!(100), dec!(-210), dec!(50)];
        let m = MetricsCalculator::calculate(&pnls, dec!(1000));
        assert_eq!(m.peak_equity, dec!(1100));
        // 1100 -> 890
        assert!((m.max_drawdown - 210.0 / 1100.0).abs() < 1e-9);
    }

    #[test]
    fn test_sharpe_sign() {
        let m = MetricsCalculator::calculate(&[dec!(10), dec!(20), dec!(-5)], dec!(1000));
        assert!(m.sharpe_ratio > 0.0);

        let single = MetricsCalculator::calculate(&[dec!(10)], dec!(1000));
        assert_eq!(single.sharpe_ratio, 0.0);
    }
}
