//! League Fixturer - Elo-rated round-robin fixture generation
//!
//! This crate rates teams from recorded results, scores every candidate game
//! and picks each round's pairings with a maximum-weight matching, including
//! double rounds with a bye for odd team counts.

pub mod config;
pub mod error;
pub mod fixturing;
pub mod league;
pub mod rating;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{FixturingError, Result};
pub use types::*;

// Re-export key components
pub use fixturing::{
    BlossomMatcher, ByeRoundScheduler, FixtureHistory, GameQualityScorer, RoundScheduler,
    ScheduleOutcome, WeightedMatcher,
};
pub use league::{LeagueFile, LeaguePlanner};
pub use rating::RatingBook;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
