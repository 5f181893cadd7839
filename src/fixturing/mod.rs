//! Fixture generation
//!
//! This module turns ratings and fixture history into rounds: scoring
//! candidate games, building the candidate graph, maximum-weight matching,
//! and the single and double round schedulers built on top.

pub mod bye;
pub mod graph;
pub mod history;
pub mod matching;
pub mod quality;
pub mod scheduler;

// Re-export commonly used types
pub use bye::ByeRoundScheduler;
pub use graph::{CandidateGraph, WeightedEdge};
pub use history::{FixtureHistory, GameLog};
pub use matching::{BlossomMatcher, Matching, WeightedMatcher};
pub use quality::GameQualityScorer;
pub use scheduler::{RoundScheduler, ScheduleFailure, ScheduleOutcome};
