//! Main application configuration
//!
//! This module defines the primary configuration structures for the fixturer,
//! including TOML file loading, environment variable overrides and validation.

use crate::config::{SchedulingConfig, ScoringConfig};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub scheduling: SchedulingConfig,
    pub scoring: ScoringConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Directory fixture tables are written to
    pub output_dir: PathBuf,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "league-fixturer".to_string(),
            log_level: "info".to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::load(path, env_var)
    }

    fn load<F>(path: &Path, var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.apply_overrides(var)?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(env_var)?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup such as the process environment
    fn apply_overrides<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Service settings
        if let Some(name) = var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Some(log_level) = var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Some(output_dir) = var("OUTPUT_DIR") {
            self.service.output_dir = PathBuf::from(output_dir);
        }

        // Scheduling settings
        if let Some(rematches) = var("MAX_ALLOWED_REMATCHES") {
            self.scheduling.max_allowed_rematches = rematches
                .parse()
                .map_err(|_| anyhow!("Invalid MAX_ALLOWED_REMATCHES value: {}", rematches))?;
        }
        if let Some(attempts) = var("MAX_ROUND_ATTEMPTS") {
            self.scheduling.max_round_attempts = attempts
                .parse()
                .map_err(|_| anyhow!("Invalid MAX_ROUND_ATTEMPTS value: {}", attempts))?;
        }
        if let Some(attempts) = var("MAX_DOUBLE_ROUND_ATTEMPTS") {
            self.scheduling.max_double_round_attempts = attempts
                .parse()
                .map_err(|_| anyhow!("Invalid MAX_DOUBLE_ROUND_ATTEMPTS value: {}", attempts))?;
        }
        if let Some(range) = var("PERTURBATION_RANGE") {
            self.scheduling.perturbation_range = range
                .parse()
                .map_err(|_| anyhow!("Invalid PERTURBATION_RANGE value: {}", range))?;
        }
        if let Some(seed) = var("FIXTURE_SEED") {
            self.scheduling.seed = Some(
                seed.parse()
                    .map_err(|_| anyhow!("Invalid FIXTURE_SEED value: {}", seed))?,
            );
        }

        Ok(())
    }
}

fn env_var(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.name.is_empty() {
        return Err(anyhow!("Service name cannot be empty"));
    }

    config.scheduling.validate()?;
    config.scoring.validate()?;

    Ok(())
}
