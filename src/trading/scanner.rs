//! Momentum scan over a token snapshot.

use crate::models::Token;

/// Tokens with `momentum_score >= threshold * 10`, in input order.
pub fn scan(tokens: &[Token], threshold: u8) -> Vec<Token> {
    let floor = u16::from(threshold) * 10;
    tokens
        .iter()
        .filter(|t| u16::from(t.momentum_score) >= floor)
        .cloned()
        .collect()
}
