//! Game quality scoring configuration

use crate::error::{FixturingError, Result};
use serde::{Deserialize, Serialize};

/// Largest accepted value for any scoring weight
pub const MAX_SCORING_WEIGHT: f64 = 1_000_000.0;

/// Weights used to turn a candidate pairing into a matching weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Starting weight of every candidate game
    pub base_weight: f64,
    /// Subtracted once per previous meeting of the pair
    pub rematch_penalty: f64,
    /// Added when the game was requested
    pub request_bonus: f64,
    /// Subtracted when the game was asked not to happen
    pub anti_request_penalty: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_weight: 100.0,
            rematch_penalty: 10.0,
            request_bonus: 2.0,
            anti_request_penalty: 4.0,
        }
    }
}

impl ScoringConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("base_weight", self.base_weight),
            ("rematch_penalty", self.rematch_penalty),
            ("request_bonus", self.request_bonus),
            ("anti_request_penalty", self.anti_request_penalty),
        ];

        for (name, value) in weights {
            if !(0.0..=MAX_SCORING_WEIGHT).contains(&value) {
                return Err(FixturingError::ConfigurationError {
                    message: format!("{} must be between 0 and {}", name, MAX_SCORING_WEIGHT),
                }
                .into());
            }
        }

        Ok(())
    }
}
