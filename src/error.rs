//! Error types for the fixturing engine
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application. Typed conditions are raised as `FixturingError`
//! and can be recovered from an `anyhow::Error` with `downcast_ref`.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific fixturing scenarios
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FixturingError {
    #[error("Unknown team: {team}")]
    UnknownTeam { team: String },

    #[error("Score share undefined: both sides scored zero")]
    DivisionUndefined,

    #[error("At least 2 teams are required to schedule a round, got {count}")]
    InsufficientTeams { count: usize },

    #[error(
        "No fixture within {allowed} allowed rematches after {attempts} attempts \
         (best attempt still had {worst_rematches})"
    )]
    RematchConstraintUnsatisfiable {
        attempts: u32,
        worst_rematches: u32,
        allowed: u32,
    },

    #[error("A double round needs an odd number of teams, got {count}")]
    EvenTeamCount { count: usize },

    #[error("Team {team} drew the bye in both halves of a double round")]
    RepeatedByeTeam { team: String },

    #[error("Team name is reserved: {name}")]
    ReservedTeamName { name: String },

    #[error("Invalid game code: {code:?}")]
    InvalidGameCode { code: String },

    #[error("Invalid rating for {team}: {reason}")]
    InvalidRating { team: String, reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("League file error: {message}")]
    LeagueFileError { message: String },
}
