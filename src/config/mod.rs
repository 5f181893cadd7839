//! Configuration management for the fixturer
//!
//! This module handles configuration loading from TOML files and environment
//! variables, validation, and default values for scoring and scheduling.

pub mod app;
pub mod scheduling;
pub mod scoring;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, ServiceSettings};
pub use scheduling::{SchedulingConfig, MAX_PERTURBATION_RANGE};
pub use scoring::{ScoringConfig, MAX_SCORING_WEIGHT};
