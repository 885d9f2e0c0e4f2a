//! Engine configuration.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::RiskTier;

/// Configuration for the lifecycle engine and its host scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Starting account balance
    pub initial_balance: Decimal,

    /// Risk tier used when sizing new positions
    pub risk_tier: RiskTier,

    /// Scan threshold; tokens need momentum >= threshold * 10
    pub momentum_threshold: u8,

    /// Milliseconds between engine ticks
    pub tick_interval_ms: u64,

    /// Seconds a new position waits in `entering` before it is monitored
    pub fill_delay_secs: i64,

    /// Seconds an `executing` trade-log row waits before it is marked completed
    pub settle_dwell_secs: i64,

    /// Maximum price move per tick as a fraction of price (0.01 = 1%)
    pub max_walk_pct: Decimal,

    /// Capacity of the event broadcast channel
    pub event_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_balance: dec!(2000),
            risk_tier: RiskTier::Medium,
            momentum_threshold: 5,
            tick_interval_ms: 5000,
            fill_delay_secs: 2,
            settle_dwell_secs: 3,
            max_walk_pct: dec!(0.01), // +/-1% per tick
            event_buffer: 256,
        }
    }
}

impl EngineConfig {
    /// Load overrides from a JSON file; missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Reject delays that do not fit a `chrono::Duration`.
    pub fn validate(&self) -> Result<()> {
        for (field, secs) in [
            ("fill_delay_secs", self.fill_delay_secs),
            ("settle_dwell_secs", self.settle_dwell_secs),
        ] {
            if secs < 0 || Duration::try_seconds(secs).is_none() {
                bail!("{} out of range: {}", field, secs);
            }
        }
        Ok(())
    }

    pub fn fill_delay(&self) -> Duration {
        Duration::try_seconds(self.fill_delay_secs).unwrap_or(Duration::MAX)
    }

    pub fn settle_dwell(&self) -> Duration {
        Duration::try_seconds(self.settle_dwell_secs).unwrap_or(Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "initial_balance": "5000", "risk_tier": "high" }"#).unwrap();
        assert_eq!(config.initial_balance, dec!(5000));
        assert_eq!(config.risk_tier, RiskTier::High);
        assert_eq!(config.tick_interval_ms, 5000);
        assert_eq!(config.max_walk_pct, dec!(0.01));
    }

    #[test]
    fn test_out_of_range_delay_is_rejected() {
        let path = std::env::temp_dir().join(format!("surfer-config-{}.json", std::process::id()));
        std::fs::write(&path, format!(r#"{{ "fill_delay_secs": {} }}"#, i64::MAX)).unwrap();

        let err = EngineConfig::from_file(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(format!("{:#}", err).contains("fill_delay_secs out of range"));
    }

    #[test]
    fn test_delays_do_not_panic() {
        let config = EngineConfig {
            settle_dwell_secs: i64::MAX,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(config.settle_dwell(), Duration::MAX);
        assert_eq!(EngineConfig::default().fill_delay(), Duration::seconds(2));
    }
}
