//! Per-team rating storage and result folding
//!
//! The rating book owns each team's elo and K-value for one scheduling run.
//! Results are folded in round order; once folding is done the book is only
//! read from.

use crate::error::{FixturingError, Result};
use crate::rating::elo::{expected_outcome, score_share, update_rating};
use crate::types::{MatchResult, TeamId, TeamRating};
use crate::utils::game_code;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Storage entry for a team's rating with metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingEntry {
    pub team: TeamId,
    pub rating: TeamRating,
    pub games_played: u32,
}

impl RatingEntry {
    pub fn new(team: TeamId, rating: TeamRating) -> Self {
        Self {
            team,
            rating,
            games_played: 0,
        }
    }

    fn update_elo(&mut self, elo: f64) {
        self.rating.elo = elo;
        self.games_played += 1;
    }
}

/// Rating change produced by folding a single result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingChange {
    pub team: TeamId,
    pub old_elo: f64,
    pub new_elo: f64,
}

/// All ratings for one division
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingBook {
    entries: BTreeMap<TeamId, RatingEntry>,
}

impl RatingBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a book from separate elo and K-value maps keyed by team
    pub fn from_maps(elos: &HashMap<TeamId, f64>, k_values: &HashMap<TeamId, f64>) -> Result<Self> {
        let mut book = Self::new();
        for (team, elo) in elos {
            let k_value = k_values
                .get(team)
                .copied()
                .ok_or_else(|| FixturingError::UnknownTeam { team: team.clone() })?;
            book.insert(team.clone(), TeamRating::new(*elo, k_value))?;
        }

        if let Some(team) = k_values.keys().find(|team| !elos.contains_key(*team)) {
            return Err(FixturingError::UnknownTeam { team: team.clone() }.into());
        }

        Ok(book)
    }

    /// Add or replace a team's starting rating
    pub fn insert(&mut self, team: TeamId, rating: TeamRating) -> Result<()> {
        if !rating.elo.is_finite() {
            return Err(FixturingError::InvalidRating {
                team,
                reason: "elo must be finite".to_string(),
            }
            .into());
        }
        if !rating.k_value.is_finite() || rating.k_value < 0.0 {
            return Err(FixturingError::InvalidRating {
                team,
                reason: "K-value must be finite and non-negative".to_string(),
            }
            .into());
        }

        self.entries
            .insert(team.clone(), RatingEntry::new(team, rating));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, team: &str) -> bool {
        self.entries.contains_key(team)
    }

    pub fn entry(&self, team: &str) -> Option<&RatingEntry> {
        self.entries.get(team)
    }

    /// Current rating of a team, failing with `UnknownTeam` if absent
    pub fn rating(&self, team: &str) -> Result<TeamRating> {
        self.entries
            .get(team)
            .map(|entry| entry.rating)
            .ok_or_else(|| {
                FixturingError::UnknownTeam {
                    team: team.to_string(),
                }
                .into()
            })
    }

    pub fn teams(&self) -> BTreeSet<TeamId> {
        self.entries.keys().cloned().collect()
    }

    /// Snapshot of every team's elo
    pub fn elos(&self) -> BTreeMap<TeamId, f64> {
        self.entries
            .iter()
            .map(|(team, entry)| (team.clone(), entry.rating.elo))
            .collect()
    }

    /// Fold one result into the book, returning the home and away changes
    pub fn apply_result(&mut self, result: &MatchResult) -> Result<(RatingChange, RatingChange)> {
        let home = self.rating(&result.home_team)?;
        let away = self.rating(&result.away_team)?;

        let (home_share, away_share) = score_share(result.home_score, result.away_score)
            .with_context(|| {
                format!(
                    "round {} result {}",
                    result.round,
                    game_code(&result.home_team, &result.away_team)
                )
            })?;
        let (home_expected, away_expected) = expected_outcome(home.elo, away.elo);

        let home_new = update_rating(home_expected, home_share, home.elo, home.k_value);
        let away_new = update_rating(away_expected, away_share, away.elo, away.k_value);

        if let Some(entry) = self.entries.get_mut(&result.home_team) {
            entry.update_elo(home_new);
        }
        if let Some(entry) = self.entries.get_mut(&result.away_team) {
            entry.update_elo(away_new);
        }

        debug!(
            "Round {} {} {}-{}: {:.2} -> {:.2}, {:.2} -> {:.2}",
            result.round,
            game_code(&result.home_team, &result.away_team),
            result.home_score,
            result.away_score,
            home.elo,
            home_new,
            away.elo,
            away_new
        );

        Ok((
            RatingChange {
                team: result.home_team.clone(),
                old_elo: home.elo,
                new_elo: home_new,
            },
            RatingChange {
                team: result.away_team.clone(),
                old_elo: away.elo,
                new_elo: away_new,
            },
        ))
    }

    /// Fold results in ascending round order, sequentially
    ///
    /// Results within the same round keep their given order. On error the
    /// book is left untouched.
    pub fn fold_results(&mut self, results: &[MatchResult]) -> Result<()> {
        let mut ordered: Vec<&MatchResult> = results.iter().collect();
        ordered.sort_by_key(|result| result.round);

        let mut working = self.clone();
        for result in ordered {
            working.apply_result(result)?;
        }

        *self = working;
        Ok(())
    }
}
