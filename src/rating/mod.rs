//! Elo rating engine
//!
//! This module provides the Elo expected-outcome and update math, plus the
//! per-division rating book that folds match results in round order.

pub mod book;
pub mod elo;

// Re-export commonly used types
pub use book::{RatingBook, RatingChange, RatingEntry};
pub use elo::{expected_outcome, scaled_closeness, score_share, update_rating};
