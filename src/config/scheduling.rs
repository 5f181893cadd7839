//! Round scheduling configuration

use crate::error::{FixturingError, Result};
use serde::{Deserialize, Serialize};

/// Largest accepted elo perturbation half-width
pub const MAX_PERTURBATION_RANGE: f64 = 1_000.0;

/// Rematch allowance and retry budget for the schedulers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Highest number of previous meetings tolerated for any scheduled pair
    pub max_allowed_rematches: u32,
    /// Matching attempts per round before giving up
    pub max_round_attempts: u32,
    /// Restarts of the whole double-round procedure before giving up
    pub max_double_round_attempts: u32,
    /// Half-width of the uniform elo perturbation applied between attempts
    pub perturbation_range: f64,
    /// Seed for the random source; entropy is used when absent
    pub seed: Option<u64>,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            max_allowed_rematches: 0,
            max_round_attempts: 500,
            max_double_round_attempts: 50,
            perturbation_range: 2.5,
            seed: None,
        }
    }
}

impl SchedulingConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.max_round_attempts == 0 {
            return Err(FixturingError::ConfigurationError {
                message: "max_round_attempts must be greater than 0".to_string(),
            }
            .into());
        }

        if self.max_double_round_attempts == 0 {
            return Err(FixturingError::ConfigurationError {
                message: "max_double_round_attempts must be greater than 0".to_string(),
            }
            .into());
        }

        if !(0.0..=MAX_PERTURBATION_RANGE).contains(&self.perturbation_range) {
            return Err(FixturingError::ConfigurationError {
                message: format!(
                    "perturbation_range must be between 0 and {}",
                    MAX_PERTURBATION_RANGE
                ),
            }
            .into());
        }

        Ok(())
    }
}
