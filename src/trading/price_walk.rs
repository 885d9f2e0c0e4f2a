//! Injectable price movement for simulated positions.

#[cfg(test)]
use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

/// Source of per-tick price moves.
pub trait PriceWalk: Send {
    /// Next price for `symbol`, given its current price.
    fn step(&mut self, symbol: &str, price: Decimal) -> Decimal;
}

/// Uniform bounded random walk: each step moves the price by at most
/// `max_step` (a fraction) in either direction.
pub struct RandomWalk {
    rng: StdRng,
    max_step: Decimal,
}

impl RandomWalk {
    /// Reproducible walk for a given seed.
    pub fn seeded(seed: u64, max_step: Decimal) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            max_step,
        }
    }

    /// Walk seeded from OS entropy.
    pub fn from_entropy(max_step: Decimal) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            max_step,
        }
    }
}

impl PriceWalk for RandomWalk {
    fn step(&mut self, _symbol: &str, price: Decimal) -> Decimal {
        let unit: f64 = self.rng.gen_range(-1.0..=1.0);
        let factor = Decimal::from_f64(unit).unwrap_or(Decimal::ZERO);
        // Keep the step bounded even if the f64 conversion picked up noise
        let change = (factor * self.max_step)
            .max(-self.max_step)
            .min(self.max_step);
        (price * (Decimal::ONE + change)).round_dp(8)
    }
}

/// Replays a fixed list of fractional moves, then holds prices flat.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ScriptedWalk {
    moves: VecDeque<Decimal>,
}

#[cfg(test)]
impl ScriptedWalk {
    pub fn new(moves: impl IntoIterator<Item = Decimal>) -> Self {
        Self {
            moves: moves.into_iter().collect(),
        }
    }

    /// Walk that never moves the price.
    pub fn flat() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl PriceWalk for ScriptedWalk {
    fn step(&mut self, _symbol: &str, price: Decimal) -> Decimal {
        match self.moves.pop_front() {
            Some(change) => price * (Decimal::ONE + change),
            None => price,
        }
    }
}
