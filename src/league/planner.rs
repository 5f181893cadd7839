//! Per-division round planning
//!
//! Folds each division's results into its ratings and runs the single or
//! double round scheduler, depending on the team count and round number.

use crate::config::{AppConfig, SchedulingConfig, ScoringConfig};
use crate::error::{FixturingError, Result};
use crate::fixturing::{ByeRoundScheduler, RoundScheduler};
use crate::league::input::{DivisionInput, LeagueFile};
use crate::types::{FixtureRow, TeamId};
use anyhow::Context;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// What a division plays in a given round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPlan {
    /// Even team count: one round, labelled `"n"`
    Single { label: String },
    /// Odd team count on an odd round: rounds n and n+1, labelled `"n-(n+1)"`
    Double { label: String },
    /// Odd team count on an even round, already covered by the previous double round
    Skipped,
}

impl RoundPlan {
    pub fn for_round(team_count: usize, round: u32) -> Self {
        if team_count % 2 == 0 {
            RoundPlan::Single {
                label: round.to_string(),
            }
        } else if round % 2 == 1 {
            RoundPlan::Double {
                label: format!("{}-{}", round, round + 1),
            }
        } else {
            RoundPlan::Skipped
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            RoundPlan::Single { label } | RoundPlan::Double { label } => Some(label.as_str()),
            RoundPlan::Skipped => None,
        }
    }
}

/// Fixture produced for one division
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivisionFixture {
    pub division: String,
    pub round_label: String,
    pub rows: Vec<FixtureRow>,
    /// Set for double rounds: the teams that sat out round one and round two
    pub bye_teams: Option<(TeamId, TeamId)>,
}

/// Runs the schedulers for every division of a league
#[derive(Debug, Clone, Default)]
pub struct LeaguePlanner {
    scheduling: SchedulingConfig,
    scoring: ScoringConfig,
}

impl LeaguePlanner {
    pub fn new(scheduling: SchedulingConfig, scoring: ScoringConfig) -> Self {
        Self {
            scheduling,
            scoring,
        }
    }

    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(config.scheduling.clone(), config.scoring.clone())
    }

    /// Fixture one division for `round`; `None` when the round is skipped
    pub fn plan_division<R: Rng + ?Sized>(
        &self,
        division: &DivisionInput,
        round: u32,
        rng: &mut R,
    ) -> Result<Option<DivisionFixture>> {
        if round == 0 {
            return Err(FixturingError::ConfigurationError {
                message: "round numbers start at 1".to_string(),
            }
            .into());
        }

        let teams = division.roster();
        let history = division
            .history()
            .with_context(|| format!("Invalid game codes in {} division", division.name))?;

        let mut book = division.rating_book()?;
        book.fold_results(&division.results)
            .with_context(|| format!("Failed to fold {} division results", division.name))?;
        let elos = book.elos();
        info!(
            "{} division: {} teams, {} results folded",
            division.name,
            teams.len(),
            division.results.len()
        );

        let mut scheduling = self.scheduling.clone();
        if let Some(allowed) = division.max_allowed_rematches {
            scheduling.max_allowed_rematches = allowed;
        }

        let plan = RoundPlan::for_round(teams.len(), round);
        let fixture = match plan {
            RoundPlan::Single { label } => {
                let rows = RoundScheduler::new(scheduling, self.scoring.clone())
                    .schedule_round(&teams, &elos, &history, rng)?
                    .into_result()
                    .with_context(|| format!("{} division round {}", division.name, label))?
                    .rows;
                DivisionFixture {
                    division: division.name.clone(),
                    round_label: label,
                    rows,
                    bye_teams: None,
                }
            }
            RoundPlan::Double { label } => {
                let bye = ByeRoundScheduler::new(scheduling, self.scoring.clone())
                    .schedule_double_round(&teams, &elos, &history, rng)?
                    .into_result()
                    .with_context(|| format!("{} division rounds {}", division.name, label))?;
                DivisionFixture {
                    division: division.name.clone(),
                    round_label: label,
                    rows: bye.rows(),
                    bye_teams: Some(bye.bye_teams),
                }
            }
            RoundPlan::Skipped => {
                info!(
                    "{} division has an odd team count; round {} was fixtured with round {}",
                    division.name,
                    round,
                    round - 1
                );
                return Ok(None);
            }
        };

        info!(
            "{} division round {}: {} games",
            fixture.division,
            fixture.round_label,
            fixture.rows.len()
        );
        Ok(Some(fixture))
    }

    /// Fixture every division in file order; skipped divisions are left out
    pub fn plan_league<R: Rng + ?Sized>(
        &self,
        league: &LeagueFile,
        round: u32,
        rng: &mut R,
    ) -> Result<Vec<DivisionFixture>> {
        let mut fixtures = Vec::new();
        for division in &league.divisions {
            if let Some(fixture) = self.plan_division(division, round, rng)? {
                fixtures.push(fixture);
            }
        }
        Ok(fixtures)
    }
}
