//! Trading logic: position sizing, exit rules, price walk and the lifecycle engine.

mod config;
mod engine;
mod position_sizer;
mod price_walk;
mod scanner;
mod strategy;

pub use config::EngineConfig;
pub use engine::{ClosedPosition, LifecycleEngine, TickReport};
pub use position_sizer::{PositionSizer, RiskTier};
pub use price_walk::{PriceWalk, RandomWalk};
#[cfg(test)]
pub use price_walk::ScriptedWalk;
pub use scanner::scan;
pub use strategy::{ExitReason, ExitStrategy, ExitStrategyTable};
