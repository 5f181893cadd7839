//! League driver
//!
//! Loads league files, plans each division's round and writes the resulting
//! fixture tables.

pub mod input;
pub mod output;
pub mod planner;

// Re-export commonly used types
pub use input::{DivisionInput, LeagueFile, TeamInput};
pub use output::{fixture_file_name, read_fixture_csv, write_division_fixture, write_fixture_csv};
pub use planner::{DivisionFixture, LeaguePlanner, RoundPlan};
