//! Domain errors raised by the lifecycle engine.
//!
//! All of these are local and non-fatal: the failing call leaves engine state
//! untouched and the caller decides whether to surface or ignore it.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Open requested for a symbol missing from the current market snapshot.
    #[error("Unknown token: {0}")]
    InvalidToken(String),

    /// Close or select requested for an id that is not in the open set.
    #[error("Unknown position: {0}")]
    UnknownPosition(Uuid),

    /// Sized notional exceeds the available balance.
    #[error("Insufficient balance: need {required}, have {available}")]
    InsufficientBalance { required: Decimal, available: Decimal },

    /// Sizing produced nothing to trade (zero balance or zero momentum).
    #[error("Sized notional for {0} is zero")]
    ZeroNotional(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
