//! Engine configuration
//!
//! All tunables live here with their defaults; a TOML file may override any subset:
//!
//! ```toml
//! seed = 42
//!
//! [timing]
//! lock_delay_ms = 300
//!
//! [ai.weights]
//! holes = 120.0
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{LINE_CLEAR_PAUSE_MS, LOCK_DELAY_MS, LOCK_RESET_LIMIT, SOFT_DROP_MULTIPLIER};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for the piece bag
    pub seed: u64,
    pub timing: TimingConfig,
    pub ai: AiConfig,
}

/// Lock delay, clear pause and soft drop tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Grace time a grounded piece waits before it locks
    pub lock_delay_ms: u32,
    /// How many successful moves/rotations may restart the lock delay per piece
    pub lock_reset_limit: u8,
    /// Pause after a line clear before the next piece spawns
    pub line_clear_delay_ms: u32,
    /// Gravity speed-up while soft drop is held
    pub soft_drop_multiplier: u32,
}

/// Autopilot tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub weights: HeuristicWeights,
    /// Rows at the top of the board that count as topping out
    pub danger_rows: u8,
    /// Share of the next piece's best cost added to each candidate (0 disables look-ahead)
    pub lookahead_weight: f64,
    /// Minimum accumulated time between two autopilot commands
    pub action_interval_ms: u32,
}

/// Cost weights for a resulting board (lower total cost is better)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicWeights {
    /// Per unit of summed column height
    pub aggregate_height: f64,
    /// Per unit of height difference between neighbouring columns
    pub bumpiness: f64,
    /// Per covered empty cell
    pub holes: f64,
    /// Per cleared line; negative values reward clears
    pub lines_cleared: f64,
    /// Flat penalty when blocks reach the danger rows
    pub top_out: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            timing: TimingConfig::default(),
            ai: AiConfig::default(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            lock_delay_ms: LOCK_DELAY_MS,
            lock_reset_limit: LOCK_RESET_LIMIT,
            line_clear_delay_ms: LINE_CLEAR_PAUSE_MS,
            soft_drop_multiplier: SOFT_DROP_MULTIPLIER,
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            weights: HeuristicWeights::default(),
            danger_rows: 2,
            lookahead_weight: 0.5,
            action_interval_ms: 0,
        }
    }
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self {
            aggregate_height: 5.0,
            bumpiness: 3.0,
            holes: 80.0,
            lines_cleared: -400.0,
            top_out: 10_000.0,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timing.soft_drop_multiplier == 0 {
            return Err(ConfigError::Invalid {
                field: "timing.soft_drop_multiplier",
                reason: "must be at least 1",
            });
        }
        let w = &self.ai.weights;
        let weights = [
            w.aggregate_height,
            w.bumpiness,
            w.holes,
            w.lines_cleared,
            w.top_out,
        ];
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "ai.weights",
                reason: "weights must be finite",
            });
        }
        if !self.ai.lookahead_weight.is_finite() || self.ai.lookahead_weight < 0.0 {
            return Err(ConfigError::Invalid {
                field: "ai.lookahead_weight",
                reason: "must be a finite, non-negative number",
            });
        }
        Ok(())
    }
}
