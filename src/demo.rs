//! Seed data the dashboard starts from: token list, chain quotes and a few
//! pre-existing trade-log rows.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use crate::models::{ChainQuote, PriceComparison, Token, TradeAction, TradeLogEntry, TradeStatus};

/// Initial market snapshot.
pub fn tokens() -> Vec<Token> {
    vec![
        Token::new("BTC", "Bitcoin", dec!(43250), dec!(5.2), 87, &["ETH", "BSC", "MATIC"]),
        Token::new("ETH", "Ethereum", dec!(2650), dec!(3.8), 72, &["ETH", "MATIC", "ARB"]),
        Token::new("SOL", "Solana", dec!(98.5), dec!(-2.1), 45, &["SOL"]),
        Token::new("MATIC", "Polygon", dec!(0.85), dec!(8.3), 91, &["ETH", "MATIC"]),
        Token::new("AVAX", "Avalanche", dec!(38.2), dec!(1.2), 58, &["AVAX", "ETH"]),
        Token::new("BNB", "BNB", dec!(315), dec!(-4.5), 32, &["BSC", "ETH"]),
        Token::new("ADA", "Cardano", dec!(0.48), dec!(2.8), 63, &["ADA"]),
        Token::new("DOT", "Polkadot", dec!(7.2), dec!(-1.8), 41, &["DOT", "ETH"]),
    ]
}

/// Per-chain quotes for the tokens bridged across several chains.
pub fn price_comparisons() -> Vec<PriceComparison> {
    vec![
        PriceComparison::new(
            "BTC",
            vec![
                ChainQuote::new("Ethereum", "wBTC", dec!(43250), dec!(0)),
                ChainQuote::new("BSC", "BTCB", dec!(43180), dec!(-0.16)),
                ChainQuote::new("Polygon", "wBTC", dec!(43290), dec!(0.09)),
            ],
        ),
        PriceComparison::new(
            "ETH",
            vec![
                ChainQuote::new("Ethereum", "ETH", dec!(2650), dec!(0)),
                ChainQuote::new("Polygon", "ETH", dec!(2648), dec!(-0.08)),
                ChainQuote::new("Arbitrum", "ETH", dec!(2652), dec!(0.08)),
            ],
        ),
    ]
}

/// Trade-log rows that predate the session, newest last.
pub fn seeded_trade_log(now: DateTime<Utc>) -> Vec<TradeLogEntry> {
    let row = |minutes_ago: i64, token: &str, chains: usize, status: TradeStatus, pnl: Decimal| {
        TradeLogEntry {
            id: Uuid::new_v4(),
            timestamp: now - Duration::minutes(minutes_ago),
            token: token.to_string(),
            chain_count: chains,
            position_id: None,
            action: TradeAction::Open,
            status,
            pnl,
        }
    };

    vec![
        row(12, "SOL", 1, TradeStatus::Failed, dec!(-45)),
        row(7, "ETH", 2, TradeStatus::Pending, Decimal::ZERO),
        row(4, "MATIC", 2, TradeStatus::Executing, Decimal::ZERO),
        row(0, "BTC", 2, TradeStatus::Completed, dec!(125)),
    ]
}
