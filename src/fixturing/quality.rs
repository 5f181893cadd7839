//! Game quality scoring
//!
//! Turns a candidate pairing into a non-negative matching weight: close
//! contests score higher, previous meetings and anti-requests score lower,
//! requested games get a small bonus.

use crate::config::ScoringConfig;
use crate::error::{FixturingError, Result};
use crate::fixturing::history::FixtureHistory;
use crate::rating::{expected_outcome, scaled_closeness};
use crate::types::EloTable;

/// Scores candidate games for the matcher
#[derive(Debug, Clone, Default)]
pub struct GameQualityScorer {
    config: ScoringConfig,
}

impl GameQualityScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Weight of the game between two teams with known elos
    pub fn score_pair(
        &self,
        team_a: &str,
        team_b: &str,
        elo_a: f64,
        elo_b: f64,
        history: &FixtureHistory,
    ) -> f64 {
        let (expected_a, _) = expected_outcome(elo_a, elo_b);
        let mut weight = self.config.base_weight + scaled_closeness(expected_a);

        let meetings = history.fixtured.count(team_a, team_b);
        weight -= self.config.rematch_penalty * meetings as f64;

        if history.requested.contains(team_a, team_b) {
            weight += self.config.request_bonus;
        }
        if history.anti_requested.contains(team_a, team_b) {
            weight -= self.config.anti_request_penalty;
        }

        // Negative weights are not valid matcher input
        weight.max(0.0)
    }

    /// Weight of the game between two teams, looking their elos up
    pub fn score(
        &self,
        team_a: &str,
        team_b: &str,
        elos: &EloTable,
        history: &FixtureHistory,
    ) -> Result<f64> {
        let elo_a = lookup_elo(elos, team_a)?;
        let elo_b = lookup_elo(elos, team_b)?;
        Ok(self.score_pair(team_a, team_b, elo_a, elo_b, history))
    }
}

fn lookup_elo(elos: &EloTable, team: &str) -> Result<f64> {
    elos.get(team).copied().ok_or_else(|| {
        FixturingError::UnknownTeam {
            team: team.to_string(),
        }
        .into()
    })
}
