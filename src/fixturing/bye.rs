//! Double rounds for odd team counts
//!
//! With an odd roster one team has to sit out each round. Two rounds are
//! fixtured together against a synthetic [`BYE_TEAM`]; the two teams that
//! drew the bye then play each other, so every team plays exactly twice.

use crate::config::{SchedulingConfig, ScoringConfig};
use crate::error::{FixturingError, Result};
use crate::fixturing::history::FixtureHistory;
use crate::fixturing::scheduler::{
    perturb_elos, working_elos, RoundScheduler, ScheduleFailure, ScheduleOutcome,
};
use crate::types::{ByeFixture, EloTable, Fixture, FixtureRow, TeamId, BYE_TEAM};
use anyhow::anyhow;
use rand::Rng;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Schedules two rounds plus a decider for an odd roster
#[derive(Debug, Clone)]
pub struct ByeRoundScheduler {
    rounds: RoundScheduler,
}

impl ByeRoundScheduler {
    pub fn new(config: SchedulingConfig, scoring: ScoringConfig) -> Self {
        Self {
            rounds: RoundScheduler::new(config, scoring),
        }
    }

    pub fn from_round_scheduler(rounds: RoundScheduler) -> Self {
        Self { rounds }
    }

    pub fn config(&self) -> &SchedulingConfig {
        self.rounds.config()
    }

    /// Schedule a double round, restarting with perturbed elos while the
    /// combined fixture repeats a pairing more often than allowed
    pub fn schedule_double_round<R: Rng + ?Sized>(
        &self,
        teams: &BTreeSet<TeamId>,
        elos: &EloTable,
        history: &FixtureHistory,
        rng: &mut R,
    ) -> Result<ScheduleOutcome<ByeFixture>> {
        self.rounds.config().validate()?;
        if teams.contains(BYE_TEAM) {
            return Err(FixturingError::ReservedTeamName {
                name: BYE_TEAM.to_string(),
            }
            .into());
        }
        if teams.len() < 3 {
            return Err(FixturingError::InsufficientTeams { count: teams.len() }.into());
        }
        if teams.len() % 2 == 0 {
            return Err(FixturingError::EvenTeamCount { count: teams.len() }.into());
        }
        history.validate_teams(teams)?;

        let config = self.rounds.config();
        let allowed = config.max_allowed_rematches;
        let mut working = working_elos(teams, elos)?;
        let mut best_rematches = u32::MAX;

        for attempt in 1..=config.max_double_round_attempts {
            match self.try_double_round(teams, &working, history, rng)? {
                ScheduleOutcome::Scheduled { fixture, .. } => {
                    let rematches = history.fixtured.max_rematches(&fixture.rows());
                    if rematches <= allowed {
                        info!(
                            "Scheduled double round for {} teams after {} attempt(s), byes: {} and {}",
                            teams.len(),
                            attempt,
                            fixture.bye_teams.0,
                            fixture.bye_teams.1
                        );
                        return Ok(ScheduleOutcome::Scheduled {
                            fixture,
                            attempts: attempt,
                        });
                    }
                    best_rematches = best_rematches.min(rematches);
                    warn!(
                        "Double round attempt {} repeats a pairing {} time(s) (allowed {})",
                        attempt, rematches, allowed
                    );
                }
                ScheduleOutcome::Failed(failure) => {
                    best_rematches = best_rematches.min(failure.worst_rematches);
                    warn!(
                        "Double round attempt {} could not schedule one of its rounds",
                        attempt
                    );
                }
            }
            perturb_elos(&mut working, config.perturbation_range, rng);
        }

        Ok(ScheduleOutcome::Failed(ScheduleFailure {
            attempts: config.max_double_round_attempts,
            worst_rematches: best_rematches,
            allowed,
        }))
    }

    /// Both rounds and the decider for one set of working elos
    fn try_double_round<R: Rng + ?Sized>(
        &self,
        teams: &BTreeSet<TeamId>,
        working: &EloTable,
        history: &FixtureHistory,
        rng: &mut R,
    ) -> Result<ScheduleOutcome<ByeFixture>> {
        let bye_elo = sample_bye_elo(working, rng)?;
        debug!("Bye team takes elo {:.1}", bye_elo);

        let mut round_elos = working.clone();
        round_elos.insert(BYE_TEAM.to_string(), bye_elo);
        let mut roster = teams.clone();
        roster.insert(BYE_TEAM.to_string());

        let first = match self.rounds.schedule_round(&roster, &round_elos, history, rng)? {
            ScheduleOutcome::Scheduled { fixture, .. } => fixture,
            ScheduleOutcome::Failed(failure) => return Ok(ScheduleOutcome::Failed(failure)),
        };

        // Round two must see round one, bye pairing included
        let second_history = history.with_fixtured(&first.rows);
        let second = match self
            .rounds
            .schedule_round(&roster, &round_elos, &second_history, rng)?
        {
            ScheduleOutcome::Scheduled { fixture, .. } => fixture,
            ScheduleOutcome::Failed(failure) => return Ok(ScheduleOutcome::Failed(failure)),
        };

        let (first_round, first_bye) = split_bye(first)?;
        let (second_round, second_bye) = split_bye(second)?;
        if first_bye == second_bye {
            return Err(FixturingError::RepeatedByeTeam { team: first_bye }.into());
        }

        // Home counts over everything played so far, bye pairings excluded
        let played = history.with_fixtured(first_round.iter().chain(second_round.iter()));
        let first_home = played.fixtured.home_count(&first_bye);
        let second_home = played.fixtured.home_count(&second_bye);
        let decider = if second_home < first_home {
            FixtureRow::new(&second_bye, &first_bye)
        } else {
            FixtureRow::new(&first_bye, &second_bye)
        };

        Ok(ScheduleOutcome::Scheduled {
            fixture: ByeFixture {
                first_round,
                second_round,
                decider,
                bye_teams: (first_bye, second_bye),
            },
            attempts: 1,
        })
    }
}

/// Remove the bye pairing from a round, returning the team that drew it
fn split_bye(fixture: Fixture) -> Result<(Fixture, TeamId)> {
    let mut bye_team = None;
    let mut rows = Vec::with_capacity(fixture.len().saturating_sub(1));
    for row in fixture.rows {
        if row.involves(BYE_TEAM) {
            bye_team = row.opponent_of(BYE_TEAM).map(str::to_string);
        } else {
            rows.push(row);
        }
    }

    let bye_team = bye_team.ok_or_else(|| anyhow!("Round has no {} pairing", BYE_TEAM))?;
    Ok((Fixture::new(rows), bye_team))
}

/// Elo of one real team, picked uniformly
fn sample_bye_elo<R: Rng + ?Sized>(working: &EloTable, rng: &mut R) -> Result<f64> {
    if working.is_empty() {
        return Err(FixturingError::InsufficientTeams { count: 0 }.into());
    }
    let index = rng.gen_range(0..working.len());
    working
        .values()
        .nth(index)
        .copied()
        .ok_or_else(|| anyhow!("No elo at index {}", index))
}
