//! Position lifecycle engine: owns the account, the open positions and the
//! trade log, and advances them one tick at a time.
//!
//! Every mutation goes through `&mut self`, so a host that owns the engine
//! runs each tick as one atomic read-modify-write over the open set. The
//! host decides the cadence; the engine never schedules anything itself.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::events::EngineEvent;
use crate::models::{Position, PositionStatus, Token, TradeLogEntry, TradeStatus};

use super::{
    scan, EngineConfig, ExitReason, ExitStrategyTable, PositionSizer, PriceWalk, RiskTier,
};

/// A position that left the open set during a tick or a manual close.
#[derive(Debug, Clone)]
pub struct ClosedPosition {
    /// Final state, status `Completed`
    pub position: Position,
    pub reason: ExitReason,
    /// Close row appended to the trade log
    pub entry: TradeLogEntry,
}

/// Side effects of one tick.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Positions that moved from `entering` to `monitoring`
    pub promoted: Vec<Uuid>,
    /// Positions closed by an exit condition
    pub closed: Vec<ClosedPosition>,
    /// Positions still open after the tick
    pub open: Vec<Position>,
}

impl TickReport {
    pub fn realized_pnl(&self) -> Decimal {
        self.closed.iter().map(|c| c.entry.pnl).sum()
    }
}

/// Simulated position lifecycle engine.
pub struct LifecycleEngine {
    config: EngineConfig,
    strategies: ExitStrategyTable,
    walk: Box<dyn PriceWalk>,

    // Market snapshot and user settings
    market: Vec<Token>,
    risk_tier: RiskTier,
    momentum_threshold: u8,

    // Account state
    balance: Decimal,
    positions: Vec<Position>,
    trade_log: Vec<TradeLogEntry>,
    selected: Option<Uuid>,

    events: broadcast::Sender<EngineEvent>,
}

impl LifecycleEngine {
    /// Create an engine with the default exit-strategy table.
    pub fn new(config: EngineConfig, walk: Box<dyn PriceWalk>) -> Self {
        let (events, _) = broadcast::channel(config.event_buffer.max(1));
        Self {
            balance: config.initial_balance,
            risk_tier: config.risk_tier,
            momentum_threshold: config.momentum_threshold,
            config,
            strategies: ExitStrategyTable::default(),
            walk,
            market: Vec::new(),
            positions: Vec::new(),
            trade_log: Vec::new(),
            selected: None,
            events,
        }
    }

    /// Start from pre-existing trade-log rows.
    pub fn with_trade_log(mut self, entries: Vec<TradeLogEntry>) -> Self {
        self.trade_log = entries;
        self
    }

    /// Receive change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: EngineEvent) {
        trace!(event = event.name(), "Engine event");
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    // ==================== Settings & Market ====================

    /// Replace the market snapshot wholesale.
    pub fn update_market(&mut self, tokens: Vec<Token>) {
        debug!(tokens = tokens.len(), "Market snapshot updated");
        self.market = tokens;
        self.emit(EngineEvent::MarketUpdated {
            tokens: self.market.clone(),
        });
    }

    /// Tokens in the current snapshot passing the momentum threshold.
    pub fn scan_market(&self) -> Vec<Token> {
        scan(&self.market, self.momentum_threshold)
    }

    pub fn set_risk_tier(&mut self, tier: RiskTier) {
        info!(tier = %tier, "Risk tier changed");
        self.risk_tier = tier;
    }

    pub fn set_momentum_threshold(&mut self, threshold: u8) {
        info!(threshold = threshold, "Momentum threshold changed");
        self.momentum_threshold = threshold;
    }

    // ==================== Open ====================

    /// Size and open a position on `symbol` at its current display price.
    pub fn open_position(
        &mut self,
        symbol: &str,
        tier: RiskTier,
        now: DateTime<Utc>,
    ) -> Result<Position> {
        let token = self
            .market
            .iter()
            .find(|t| t.symbol == symbol)
            .ok_or_else(|| EngineError::InvalidToken(symbol.to_string()))?;

        if token.price <= Decimal::ZERO {
            return Err(EngineError::InvalidToken(symbol.to_string()));
        }

        let notional = PositionSizer::size(self.balance, tier, token.momentum_score);
        if notional.is_zero() {
            return Err(EngineError::ZeroNotional(symbol.to_string()));
        }
        if notional > self.balance {
            return Err(EngineError::InsufficientBalance {
                required: notional,
                available: self.balance,
            });
        }

        let position = Position::open(
            token.symbol.clone(),
            token.chains.clone(),
            token.price,
            notional,
            self.strategies.lookup(symbol),
            now,
        );

        // Capital is committed before the simulated fill lands
        self.balance -= notional;

        let entry = TradeLogEntry::opened(symbol, position.chain_count(), position.id, now);
        self.trade_log.push(entry.clone());
        self.positions.push(position.clone());

        info!(
            id = %position.id,
            token = %symbol,
            tier = %tier,
            notional = %notional,
            price = %position.entry_price,
            quantity = %position.quantity.round_dp(8),
            "Position opened"
        );

        self.emit(EngineEvent::PositionOpened {
            position: Box::new(position.clone()),
        });
        self.emit(EngineEvent::TradeLogged {
            entry: Box::new(entry),
        });
        self.emit(EngineEvent::BalanceChanged {
            balance: self.balance,
        });

        Ok(position)
    }

    /// Open using the engine's current risk tier.
    pub fn open_with_current_tier(&mut self, symbol: &str, now: DateTime<Utc>) -> Result<Position> {
        self.open_position(symbol, self.risk_tier, now)
    }

    // ==================== Tick ====================

    /// One evaluation pass over every open position.
    ///
    /// Entering positions past the fill delay become monitored (and are first
    /// evaluated on the next tick). Monitored positions take one price step,
    /// recompute P&L and are closed if any exit condition holds.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickReport {
        let fill_delay = self.config.fill_delay();
        let mut promoted = Vec::new();
        let mut flagged = Vec::new();

        for position in self.positions.iter_mut() {
            match position.status {
                PositionStatus::Entering => {
                    if now - position.opened_at >= fill_delay {
                        position.status = PositionStatus::Monitoring;
                        promoted.push(position.id);
                    }
                }
                PositionStatus::Monitoring => {
                    let next_price = self.walk.step(&position.token, position.current_price);
                    position.update_price(next_price);

                    let momentum = momentum_of(&self.market, &position.token);
                    let exit = position.exit;
                    let signal = exit.check_exit(position, momentum, now);

                    if let (true, Some(reason)) = (signal.should_exit, signal.reason) {
                        position.status = PositionStatus::Exiting;
                        flagged.push((position.id, reason));
                    }
                }
                PositionStatus::Exiting | PositionStatus::Completed => {}
            }
        }

        for id in &promoted {
            debug!(id = %id, "Position filled");
            self.emit(EngineEvent::PositionFilled { position_id: *id });
        }

        let closed: Vec<_> = flagged
            .into_iter()
            .filter_map(|(id, reason)| self.finish_close(id, reason, now))
            .collect();

        debug!(
            promoted = promoted.len(),
            closed = closed.len(),
            open = self.positions.len(),
            balance = %self.balance,
            "Tick complete"
        );

        TickReport {
            promoted,
            closed,
            open: self.positions.clone(),
        }
    }

    // ==================== Close ====================

    /// Manually close a position at its last computed P&L.
    pub fn close_position(&mut self, id: Uuid, now: DateTime<Utc>) -> Result<TradeLogEntry> {
        let closed = self
            .finish_close(id, ExitReason::ManualClose, now)
            .ok_or(EngineError::UnknownPosition(id))?;
        Ok(closed.entry)
    }

    /// Realize a position: return its capital plus P&L to the account, log
    /// the close and drop it from the open set.
    fn finish_close(
        &mut self,
        id: Uuid,
        reason: ExitReason,
        now: DateTime<Utc>,
    ) -> Option<ClosedPosition> {
        let index = self.positions.iter().position(|p| p.id == id)?;
        let mut position = self.positions.remove(index);
        position.status = PositionStatus::Exiting;

        let pnl = position.unrealized_pnl;
        self.balance += position.notional + pnl;

        let entry =
            TradeLogEntry::closed(&position.token, position.chain_count(), position.id, pnl, now);
        self.trade_log.push(entry.clone());
        position.status = PositionStatus::Completed;

        match reason {
            ExitReason::StopLoss => warn!(
                id = %id,
                token = %position.token,
                pnl = %pnl,
                "Position stopped out"
            ),
            _ => info!(
                id = %id,
                token = %position.token,
                reason = %reason,
                pnl = %pnl,
                "Position closed"
            ),
        }

        // A manual close dismisses whatever detail view is open
        let clear_selection = match reason {
            ExitReason::ManualClose => self.selected.is_some(),
            _ => self.selected == Some(id),
        };

        self.emit(EngineEvent::PositionClosed {
            position: Box::new(position.clone()),
            reason,
            pnl,
        });
        self.emit(EngineEvent::TradeLogged {
            entry: Box::new(entry.clone()),
        });
        self.emit(EngineEvent::BalanceChanged {
            balance: self.balance,
        });
        if clear_selection {
            self.selected = None;
            self.emit(EngineEvent::SelectionChanged { position_id: None });
        }

        Some(ClosedPosition {
            position,
            reason,
            entry,
        })
    }

    // ==================== Trade Log ====================

    /// Mark `executing` rows older than the settle dwell as completed.
    pub fn settle_trade_log(&mut self, now: DateTime<Utc>) -> Vec<Uuid> {
        let dwell = self.config.settle_dwell();
        let settled: Vec<Uuid> = self
            .trade_log
            .iter_mut()
            .filter(|entry| entry.is_stale(now, dwell))
            .map(|entry| {
                entry.status = TradeStatus::Completed;
                entry.id
            })
            .collect();

        for id in &settled {
            debug!(entry = %id, "Trade settled");
            self.emit(EngineEvent::TradeSettled { entry_id: *id });
        }
        settled
    }

    // ==================== Detail View ====================

    /// Open the detail view on a position.
    pub fn select_position(&mut self, id: Uuid) -> Result<()> {
        if !self.positions.iter().any(|p| p.id == id) {
            return Err(EngineError::UnknownPosition(id));
        }
        self.selected = Some(id);
        self.emit(EngineEvent::SelectionChanged {
            position_id: Some(id),
        });
        Ok(())
    }

    // ==================== Snapshots ====================

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Open positions in the order they were opened.
    pub fn open_positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn position(&self, id: Uuid) -> Option<&Position> {
        self.positions.iter().find(|p| p.id == id)
    }

    pub fn has_open_position(&self, symbol: &str) -> bool {
        self.positions.iter().any(|p| p.token == symbol)
    }

    pub fn selected_position(&self) -> Option<&Position> {
        self.selected.and_then(|id| self.position(id))
    }

    pub fn trade_log(&self) -> &[TradeLogEntry] {
        &self.trade_log
    }

    pub fn market(&self) -> &[Token] {
        &self.market
    }

    pub fn risk_tier(&self) -> RiskTier {
        self.risk_tier
    }

    pub fn momentum_threshold(&self) -> u8 {
        self.momentum_threshold
    }

    pub fn strategies(&self) -> &ExitStrategyTable {
        &self.strategies
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Capital currently committed to open positions.
    pub fn committed_capital(&self) -> Decimal {
        self.positions.iter().map(|p| p.notional).sum()
    }

    /// Balance plus committed capital plus unrealized P&L.
    pub fn equity(&self) -> Decimal {
        self.balance
            + self
                .positions
                .iter()
                .map(|p| p.notional + p.unrealized_pnl)
                .sum::<Decimal>()
    }
}

fn momentum_of(market: &[Token], symbol: &str) -> Option<u8> {
    market
        .iter()
        .find(|t| t.symbol == symbol)
        .map(|t| t.momentum_score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TradeAction;
    use crate::trading::{RandomWalk, ScriptedWalk};
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn market() -> Vec<Token> {
        vec![
            Token::new("BTC", "Bitcoin", dec!(43250), dec!(5.2), 87, &["ETH", "BSC", "MATIC"]),
            Token::new("SOL", "Solana", dec!(98.5), dec!(-2.1), 45, &["SOL"]),
            Token::new("DOT", "Polkadot", dec!(100), dec!(-1.8), 80, &["DOT", "ETH"]),
            Token::new("ZERO", "Zero", dec!(1), dec!(0), 0, &["ETH"]),
        ]
    }

    fn engine_with(walk: Box<dyn PriceWalk>) -> LifecycleEngine {
        let mut engine = LifecycleEngine::new(EngineConfig::default(), walk);
        engine.update_market(market());
        engine
    }

    /// Open a position and tick it past the fill delay.
    fn open_monitored(engine: &mut LifecycleEngine, symbol: &str, t0: DateTime<Utc>) -> Uuid {
        let pos = engine.open_position(symbol, RiskTier::Medium, t0).unwrap();
        let report = engine.tick(t0 + Duration::seconds(2));
        assert_eq!(report.promoted, vec![pos.id]);
        pos.id
    }

    #[test]
    fn test_open_debits_notional() {
        let mut engine = engine_with(Box::new(ScriptedWalk::flat()));
        let now = Utc::now();

        let pos = engine.open_position("BTC", RiskTier::Medium, now).unwrap();

        // round(2000 * 0.35 * 0.87) = 609
        assert_eq!(pos.notional, dec!(609));
        assert_eq!(engine.balance(), dec!(1391));
        assert_eq!(pos.status, PositionStatus::Entering);
        assert_eq!(pos.entry_price, dec!(43250));
        assert_eq!(pos.exit, engine.strategies().lookup("BTC"));

        let log = engine.trade_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].status, TradeStatus::Executing);
        assert_eq!(log[0].action, TradeAction::Open);
        assert_eq!(log[0].chain_count, 3);
    }

    #[test]
    fn test_open_rejections_leave_state() {
        let mut engine = engine_with(Box::new(ScriptedWalk::flat()));
        let now = Utc::now();

        let err = engine.open_position("DOGE", RiskTier::High, now).unwrap_err();
        assert_eq!(err, EngineError::InvalidToken("DOGE".to_string()));

        let err = engine.open_position("ZERO", RiskTier::High, now).unwrap_err();
        assert_eq!(err, EngineError::ZeroNotional("ZERO".to_string()));

        assert_eq!(engine.balance(), dec!(2000));
        assert!(engine.open_positions().is_empty());
        assert!(engine.trade_log().is_empty());
    }

    #[test]
    fn test_unknown_token_uses_default_exit_profile() {
        let mut engine = engine_with(Box::new(ScriptedWalk::flat()));
        let pos = engine.open_position("DOT", RiskTier::Low, Utc::now()).unwrap();
        assert_eq!(pos.exit, engine.strategies().default_strategy());
    }

    #[test]
    fn test_entering_is_not_evaluated() {
        // A 50% jump would blow through any profit target
        let mut engine = engine_with(Box::new(ScriptedWalk::new([dec!(0.5)])));
        let t0 = Utc::now();
        let pos = engine.open_position("BTC", RiskTier::Medium, t0).unwrap();

        let report = engine.tick(t0 + Duration::seconds(1));
        assert!(report.promoted.is_empty());
        assert!(report.closed.is_empty());
        assert_eq!(engine.position(pos.id).unwrap().current_price, dec!(43250));

        // Promotion tick does not step the price either
        let report = engine.tick(t0 + Duration::seconds(2));
        assert_eq!(report.promoted, vec![pos.id]);
        assert!(report.closed.is_empty());
        assert_eq!(engine.position(pos.id).unwrap().status, PositionStatus::Monitoring);
    }

    #[test]
    fn test_profit_target_boundary_closes() {
        // DOT: momentum 80, Medium -> notional 560 at 100; +15% lands exactly on target
        let mut engine = engine_with(Box::new(ScriptedWalk::new([dec!(0.15)])));
        let t0 = Utc::now();
        let id = open_monitored(&mut engine, "DOT", t0);
        assert_eq!(engine.balance(), dec!(1440));

        let report = engine.tick(t0 + Duration::seconds(7));
        assert_eq!(report.closed.len(), 1);

        let closed = &report.closed[0];
        assert_eq!(closed.position.id, id);
        assert_eq!(closed.reason, ExitReason::ProfitTarget);
        assert_eq!(closed.position.percentage_gain, dec!(15));
        assert_eq!(closed.position.status, PositionStatus::Completed);
        assert_eq!(closed.entry.pnl, dec!(84));
        assert!(report.open.is_empty());
        assert_eq!(engine.balance(), dec!(2084));
    }

    #[test]
    fn test_pushed_gain_flags_on_next_tick() {
        let mut engine = engine_with(Box::new(ScriptedWalk::flat()));
        let t0 = Utc::now();
        let id = open_monitored(&mut engine, "DOT", t0);

        // Push the position straight onto the target: 5.6 units at 100 -> 115
        let target = engine.strategies().lookup("DOT").profit_target;
        let pos = engine.positions.iter_mut().find(|p| p.id == id).unwrap();
        let price = pos.entry_price * (Decimal::ONE + target / dec!(100));
        pos.update_price(price);
        assert_eq!(pos.percentage_gain, target);

        let report = engine.tick(t0 + Duration::seconds(7));
        assert_eq!(report.closed.len(), 1);
        assert_eq!(report.closed[0].reason, ExitReason::ProfitTarget);
    }

    #[test]
    fn test_time_limit_boundary_closes() {
        let mut engine = engine_with(Box::new(ScriptedWalk::flat()));
        let t0 = Utc::now();
        let id = open_monitored(&mut engine, "BTC", t0);

        let report = engine.tick(t0 + Duration::hours(24) - Duration::milliseconds(1));
        assert!(report.closed.is_empty());

        let report = engine.tick(t0 + Duration::hours(24));
        assert_eq!(report.closed.len(), 1);
        assert_eq!(report.closed[0].position.id, id);
        assert_eq!(report.closed[0].reason, ExitReason::TimeLimit);
        // Flat prices: capital comes back untouched
        assert_eq!(engine.balance(), dec!(2000));
    }

    #[test]
    fn test_stop_loss_closes() {
        let mut engine = engine_with(Box::new(ScriptedWalk::new([dec!(-0.10)])));
        let t0 = Utc::now();
        open_monitored(&mut engine, "DOT", t0);

        let report = engine.tick(t0 + Duration::seconds(7));
        assert_eq!(report.closed[0].reason, ExitReason::StopLoss);
        assert_eq!(report.closed[0].entry.pnl, dec!(-56));
        assert_eq!(engine.balance(), dec!(1944));
    }

    #[test]
    fn test_momentum_fade_closes() {
        let mut engine = engine_with(Box::new(ScriptedWalk::flat()));
        let t0 = Utc::now();
        open_monitored(&mut engine, "BTC", t0);

        let mut faded = market();
        faded[0] = Token::new("BTC", "Bitcoin", dec!(43250), dec!(-3), 30, &["ETH"]);
        engine.update_market(faded);

        let report = engine.tick(t0 + Duration::seconds(7));
        assert_eq!(report.closed[0].reason, ExitReason::MomentumFade);
    }

    #[test]
    fn test_token_leaving_market_skips_fade() {
        let mut engine = engine_with(Box::new(ScriptedWalk::flat()));
        let t0 = Utc::now();
        open_monitored(&mut engine, "BTC", t0);

        engine.update_market(Vec::new());
        let report = engine.tick(t0 + Duration::seconds(7));
        assert!(report.closed.is_empty());
        assert_eq!(report.open.len(), 1);
    }

    /// Close returns the committed 1079.5 plus the 19 P&L; net of the open
    /// debit the account ends 19 up.
    #[test]
    fn test_btc_scenario_close_returns_notional_plus_pnl() {
        let mut engine = engine_with(Box::new(ScriptedWalk::flat()));
        let mut btc = market();
        btc[0].price = dec!(43180);
        engine.update_market(btc);
        let t0 = Utc::now();

        let id = open_monitored(&mut engine, "BTC", t0);
        let before_open = dec!(2000);

        // Rebase the position onto the 0.025 BTC scenario
        let pos = engine.positions.iter_mut().find(|p| p.id == id).unwrap();
        let old_notional = pos.notional;
        pos.quantity = dec!(0.025);
        pos.notional = dec!(1079.5);
        engine.balance += old_notional - dec!(1079.5);

        let pos = engine.positions.iter_mut().find(|p| p.id == id).unwrap();
        pos.update_price(dec!(43950));
        assert_eq!(pos.unrealized_pnl, dec!(19));
        assert_eq!(pos.percentage_gain, dec!(1.76));

        engine.select_position(id).unwrap();
        let balance_open = engine.balance();
        let entry = engine.close_position(id, t0 + Duration::seconds(10)).unwrap();

        assert_eq!(entry.status, TradeStatus::Completed);
        assert_eq!(entry.action, TradeAction::Close);
        assert_eq!(entry.pnl, dec!(19));
        assert_eq!(engine.balance(), balance_open + dec!(1079.5) + dec!(19));
        assert_eq!(engine.balance(), before_open + dec!(19));
        assert!(engine.position(id).is_none());
        assert!(engine.selected_position().is_none());
    }

    #[test]
    fn test_close_credit_is_notional_plus_pnl() {
        // DOT: notional 560 at 100, one +1% step -> pnl 6
        let mut engine = engine_with(Box::new(ScriptedWalk::new([dec!(0.01)])));
        let t0 = Utc::now();
        let id = open_monitored(&mut engine, "DOT", t0);
        engine.tick(t0 + Duration::seconds(7));

        let pos = engine.position(id).unwrap();
        assert_eq!(pos.notional, dec!(560));
        assert_eq!(pos.unrealized_pnl, dec!(6));

        let before_close = engine.balance();
        assert_eq!(before_close, dec!(1440));
        let entry = engine.close_position(id, t0 + Duration::seconds(8)).unwrap();

        assert_eq!(entry.pnl, dec!(6));
        assert_eq!(engine.balance() - before_close, dec!(566));
        assert_eq!(engine.balance(), dec!(2000) + entry.pnl);
    }

    #[test]
    fn test_close_unknown_is_rejected() {
        let mut engine = engine_with(Box::new(ScriptedWalk::flat()));
        let t0 = Utc::now();
        open_monitored(&mut engine, "BTC", t0);
        let balance = engine.balance();
        let log_len = engine.trade_log().len();

        let ghost = Uuid::new_v4();
        assert_eq!(
            engine.close_position(ghost, t0).unwrap_err(),
            EngineError::UnknownPosition(ghost)
        );
        assert_eq!(engine.balance(), balance);
        assert_eq!(engine.trade_log().len(), log_len);
        assert_eq!(engine.open_positions().len(), 1);
        assert!(engine.select_position(ghost).is_err());
    }

    #[test]
    fn test_auto_close_keeps_unrelated_selection() {
        let mut engine = engine_with(Box::new(ScriptedWalk::new([dec!(0.15)])));
        let t0 = Utc::now();
        let dot = open_monitored(&mut engine, "DOT", t0);
        let btc = engine.open_position("BTC", RiskTier::Low, t0).unwrap().id;
        engine.select_position(btc).unwrap();

        let report = engine.tick(t0 + Duration::seconds(7));
        assert_eq!(report.closed[0].position.id, dot);
        assert_eq!(engine.selected_position().map(|p| p.id), Some(btc));
    }

    #[test]
    fn test_net_balance_after_round_trip() {
        let mut engine = engine_with(Box::new(RandomWalk::seeded(11, dec!(0.01))));
        let t0 = Utc::now();
        let id = open_monitored(&mut engine, "BTC", t0);

        for i in 1..=5 {
            engine.tick(t0 + Duration::seconds(2 + 5 * i));
        }
        let pnl = engine.position(id).unwrap().unrealized_pnl;
        let entry = engine.close_position(id, t0 + Duration::seconds(40)).unwrap();

        assert_eq!(entry.pnl, pnl);
        assert_eq!(engine.balance(), dec!(2000) + pnl);
    }

    #[test]
    fn test_invariants_hold_every_tick() {
        let mut engine = engine_with(Box::new(RandomWalk::seeded(3, dec!(0.01))));
        let t0 = Utc::now();
        open_monitored(&mut engine, "BTC", t0);
        open_monitored(&mut engine, "DOT", t0);

        for i in 1..=200 {
            let report = engine.tick(t0 + Duration::seconds(2 + 5 * i));
            for pos in &report.open {
                let committed = pos.quantity * pos.entry_price;
                let exact = pos.quantity * (pos.current_price - pos.entry_price);
                assert!((pos.unrealized_pnl - exact).abs() <= dec!(0.5));
                let pct = pos.unrealized_pnl / committed * dec!(100);
                assert!((pos.percentage_gain - pct).abs() <= dec!(0.005));
                assert!((pos.notional - committed).abs() < dec!(0.000001));
            }
        }
    }

    #[test]
    fn test_settle_trade_log() {
        let mut engine = engine_with(Box::new(ScriptedWalk::flat()));
        let t0 = Utc::now();
        engine.open_position("BTC", RiskTier::Low, t0).unwrap();

        assert!(engine.settle_trade_log(t0 + Duration::seconds(2)).is_empty());
        let settled = engine.settle_trade_log(t0 + Duration::seconds(3));
        assert_eq!(settled.len(), 1);
        assert_eq!(engine.trade_log()[0].status, TradeStatus::Completed);
        // Settlement never touches positions
        assert_eq!(engine.open_positions()[0].status, PositionStatus::Entering);
    }

    #[test]
    fn test_events_are_broadcast() {
        let mut engine = engine_with(Box::new(ScriptedWalk::flat()));
        let mut rx = engine.subscribe();
        let t0 = Utc::now();

        let id = open_monitored(&mut engine, "BTC", t0);
        engine.close_position(id, t0 + Duration::seconds(5)).unwrap();

        let mut names = Vec::new();
        while let Ok(event) = rx.try_recv() {
            names.push(event.name());
        }
        assert_eq!(
            names,
            vec![
                "position_opened",
                "trade_logged",
                "balance_changed",
                "position_filled",
                "position_closed",
                "trade_logged",
                "balance_changed",
            ]
        );
    }

    #[test]
    fn test_scan_market_uses_threshold() {
        let mut engine = engine_with(Box::new(ScriptedWalk::flat()));
        let symbols: Vec<_> = engine.scan_market().into_iter().map(|t| t.symbol).collect();
        assert_eq!(symbols, vec!["BTC", "DOT"]);

        engine.set_momentum_threshold(4);
        assert_eq!(engine.scan_market().len(), 3);
    }
}
