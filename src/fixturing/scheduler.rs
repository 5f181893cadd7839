//! Single-round scheduling
//!
//! A round is the maximum-weight matching of the candidate graph, turned into
//! home/away rows. When the best matching repeats a pairing more often than
//! allowed, the working elos are nudged by a small random amount and the
//! matching is recomputed, up to a fixed number of attempts.

use crate::config::{SchedulingConfig, ScoringConfig, MAX_PERTURBATION_RANGE};
use crate::error::{FixturingError, Result};
use crate::fixturing::graph::CandidateGraph;
use crate::fixturing::history::{FixtureHistory, GameLog};
use crate::fixturing::matching::{BlossomMatcher, WeightedMatcher};
use crate::fixturing::quality::GameQualityScorer;
use crate::types::{EloTable, Fixture, FixtureRow, TeamId};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Why a bounded scheduling loop gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleFailure {
    pub attempts: u32,
    /// Lowest rematch level seen across all attempts
    pub worst_rematches: u32,
    pub allowed: u32,
}

impl From<ScheduleFailure> for FixturingError {
    fn from(failure: ScheduleFailure) -> Self {
        FixturingError::RematchConstraintUnsatisfiable {
            attempts: failure.attempts,
            worst_rematches: failure.worst_rematches,
            allowed: failure.allowed,
        }
    }
}

/// Result of a bounded scheduling loop
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleOutcome<T> {
    /// A fixture within the rematch allowance was found
    Scheduled { fixture: T, attempts: u32 },
    /// Every attempt exceeded the rematch allowance
    Failed(ScheduleFailure),
}

impl<T> ScheduleOutcome<T> {
    pub fn is_scheduled(&self) -> bool {
        matches!(self, ScheduleOutcome::Scheduled { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            ScheduleOutcome::Scheduled { attempts, .. } => *attempts,
            ScheduleOutcome::Failed(failure) => failure.attempts,
        }
    }

    pub fn fixture(&self) -> Option<&T> {
        match self {
            ScheduleOutcome::Scheduled { fixture, .. } => Some(fixture),
            ScheduleOutcome::Failed(_) => None,
        }
    }

    /// Turn a failed outcome into `RematchConstraintUnsatisfiable`
    pub fn into_result(self) -> Result<T> {
        match self {
            ScheduleOutcome::Scheduled { fixture, .. } => Ok(fixture),
            ScheduleOutcome::Failed(failure) => Err(FixturingError::from(failure).into()),
        }
    }
}

/// Copy the elos of the given teams into a working table
pub(crate) fn working_elos(teams: &BTreeSet<TeamId>, elos: &EloTable) -> Result<EloTable> {
    teams
        .iter()
        .map(|team| match elos.get(team) {
            Some(elo) => Ok((team.clone(), *elo)),
            None => Err(FixturingError::UnknownTeam { team: team.clone() }.into()),
        })
        .collect()
}

/// Shift every working elo by an independent uniform offset in `[-range, range]`
pub(crate) fn perturb_elos<R: Rng + ?Sized>(elos: &mut EloTable, range: f64, rng: &mut R) {
    if !(range > 0.0 && range <= MAX_PERTURBATION_RANGE) {
        return;
    }
    for elo in elos.values_mut() {
        *elo += rng.gen_range(-range..=range);
    }
}

/// Home side of a pairing: fewer previous home games, then the smaller name
fn home_and_away<'a>(log: &GameLog, team_a: &'a str, team_b: &'a str) -> (&'a str, &'a str) {
    let home_a = log.home_count(team_a);
    let home_b = log.home_count(team_b);
    if home_a < home_b || (home_a == home_b && team_a <= team_b) {
        (team_a, team_b)
    } else {
        (team_b, team_a)
    }
}

/// Schedules one round for a set of teams
#[derive(Clone)]
pub struct RoundScheduler {
    scorer: GameQualityScorer,
    matcher: Arc<dyn WeightedMatcher>,
    config: SchedulingConfig,
}

impl RoundScheduler {
    pub fn new(config: SchedulingConfig, scoring: ScoringConfig) -> Self {
        Self::with_matcher(config, scoring, Arc::new(BlossomMatcher::default()))
    }

    pub fn with_matcher(
        config: SchedulingConfig,
        scoring: ScoringConfig,
        matcher: Arc<dyn WeightedMatcher>,
    ) -> Self {
        Self {
            scorer: GameQualityScorer::new(scoring),
            matcher,
            config,
        }
    }

    pub fn config(&self) -> &SchedulingConfig {
        &self.config
    }

    pub fn scorer(&self) -> &GameQualityScorer {
        &self.scorer
    }

    /// Schedule a round with at most `max_allowed_rematches` repeats per pair
    ///
    /// The caller's elo table is never modified; perturbation happens on a
    /// working copy and accumulates across attempts.
    pub fn schedule_round<R: Rng + ?Sized>(
        &self,
        teams: &BTreeSet<TeamId>,
        elos: &EloTable,
        history: &FixtureHistory,
        rng: &mut R,
    ) -> Result<ScheduleOutcome<Fixture>> {
        self.config.validate()?;
        self.scorer.config().validate()?;
        if teams.len() < 2 {
            return Err(FixturingError::InsufficientTeams { count: teams.len() }.into());
        }
        history.validate_teams(teams)?;

        let mut working = working_elos(teams, elos)?;
        let allowed = self.config.max_allowed_rematches;
        let mut best_rematches = u32::MAX;

        for attempt in 1..=self.config.max_round_attempts {
            let fixture = self.pair_round(teams, &working, history)?;
            let rematches = history.fixtured.max_rematches(&fixture.rows);

            if rematches <= allowed {
                info!(
                    "Scheduled {} games for {} teams after {} attempt(s)",
                    fixture.len(),
                    teams.len(),
                    attempt
                );
                return Ok(ScheduleOutcome::Scheduled {
                    fixture,
                    attempts: attempt,
                });
            }

            best_rematches = best_rematches.min(rematches);
            warn!(
                "Attempt {} repeats a pairing {} time(s) (allowed {}), perturbing ratings",
                attempt, rematches, allowed
            );
            perturb_elos(&mut working, self.config.perturbation_range, rng);
        }

        warn!(
            "Could not find a fixture within {} rematches after {} attempts",
            allowed, self.config.max_round_attempts
        );
        Ok(ScheduleOutcome::Failed(ScheduleFailure {
            attempts: self.config.max_round_attempts,
            worst_rematches: best_rematches,
            allowed,
        }))
    }

    /// One matching pass with no rematch check
    ///
    /// Rows are ordered by the smaller team name of each pairing. With an odd
    /// team count one team is left out.
    pub fn pair_round(
        &self,
        teams: &BTreeSet<TeamId>,
        elos: &EloTable,
        history: &FixtureHistory,
    ) -> Result<Fixture> {
        let graph = CandidateGraph::build(teams, elos, history, &self.scorer)?;
        let matching = self.matcher.match_maximum_weight(&graph);

        debug!(
            "Matched {} pairs with total weight {:.3}",
            matching.len(),
            matching.total_weight(&graph)
        );
        for unmatched in matching.unmatched() {
            debug!("Team {} left unmatched this round", graph.node(unmatched));
        }

        let rows = matching
            .pairs()
            .into_iter()
            .map(|(u, v)| {
                let (home, away) = home_and_away(&history.fixtured, graph.node(u), graph.node(v));
                FixtureRow::new(home, away)
            })
            .collect();

        Ok(Fixture::new(rows))
    }
}

impl std::fmt::Debug for RoundScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundScheduler")
            .field("scorer", &self.scorer)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn roster(names: &[&str]) -> BTreeSet<TeamId> {
        names.iter().map(|t| t.to_string()).collect()
    }

    fn flat_elos(names: &[&str], elo: f64) -> EloTable {
        names.iter().map(|t| (t.to_string(), elo)).collect()
    }

    fn scheduler(allowed: u32, attempts: u32) -> RoundScheduler {
        RoundScheduler::new(
            SchedulingConfig {
                max_allowed_rematches: allowed,
                max_round_attempts: attempts,
                ..Default::default()
            },
            ScoringConfig::default(),
        )
    }

    fn appearances(fixture: &Fixture) -> HashMap<&str, usize> {
        let mut counts = HashMap::new();
        for team in fixture.teams() {
            *counts.entry(team).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn test_four_equal_teams() {
        let names = ["A", "B", "C", "D"];
        let mut rng = StdRng::seed_from_u64(7);
        let outcome = scheduler(0, 10)
            .schedule_round(
                &roster(&names),
                &flat_elos(&names, 1000.0),
                &FixtureHistory::default(),
                &mut rng,
            )
            .unwrap();

        assert_eq!(outcome.attempts(), 1);
        let fixture = outcome.into_result().unwrap();
        assert_eq!(fixture.len(), 2);
        let counts = appearances(&fixture);
        assert_eq!(counts.len(), 4);
        assert!(counts.values().all(|&c| c == 1));
        for row in fixture.iter() {
            assert_eq!(row.game_code, format!("{} vs {}", row.home_team, row.away_team));
        }
    }

    #[test]
    fn test_avoids_previous_pairings() {
        let names = ["A", "B", "C", "D"];
        let history = FixtureHistory::from_codes(&["A vs B", "D vs C"], &[], &[]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let fixture = scheduler(0, 10)
            .schedule_round(&roster(&names), &flat_elos(&names, 1000.0), &history, &mut rng)
            .unwrap()
            .into_result()
            .unwrap();

        for row in fixture.iter() {
            assert!(!history.fixtured.contains(&row.home_team, &row.away_team));
        }
    }

    #[test]
    fn test_home_goes_to_team_with_fewer_home_games() {
        let names = ["A", "B", "C", "D"];
        let history = FixtureHistory::from_codes(&["A vs C"], &[], &[]).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let fixture = scheduler(0, 10)
            .schedule_round(&roster(&names), &flat_elos(&names, 1000.0), &history, &mut rng)
            .unwrap()
            .into_result()
            .unwrap();

        for row in fixture.iter() {
            if row.involves("A") {
                assert_eq!(row.away_team, "A");
            } else {
                // Neither side has hosted yet, so the smaller name is home
                assert!(row.home_team < row.away_team);
            }
        }
    }

    #[test]
    fn test_unsatisfiable_rematch_constraint() {
        let names = ["A", "B"];
        let history = FixtureHistory::from_codes(&["A vs B"], &[], &[]).unwrap();
        let mut rng = StdRng::seed_from_u64(11);

        let outcome = scheduler(0, 5)
            .schedule_round(&roster(&names), &flat_elos(&names, 1000.0), &history, &mut rng)
            .unwrap();

        assert_eq!(
            outcome,
            ScheduleOutcome::Failed(ScheduleFailure {
                attempts: 5,
                worst_rematches: 1,
                allowed: 0,
            })
        );
        let err = outcome.into_result().unwrap_err();
        assert_eq!(
            err.downcast_ref::<FixturingError>(),
            Some(&FixturingError::RematchConstraintUnsatisfiable {
                attempts: 5,
                worst_rematches: 1,
                allowed: 0,
            })
        );
    }

    #[test]
    fn test_rematch_allowance_accepts_repeat() {
        let names = ["A", "B"];
        let history = FixtureHistory::from_codes(&["A vs B"], &[], &[]).unwrap();
        let mut rng = StdRng::seed_from_u64(11);

        let fixture = scheduler(1, 5)
            .schedule_round(&roster(&names), &flat_elos(&names, 1000.0), &history, &mut rng)
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(fixture.rows, vec![FixtureRow::new("B", "A")]);
    }

    #[test]
    fn test_input_errors() {
        let mut rng = StdRng::seed_from_u64(0);
        let sched = scheduler(0, 5);

        let err = sched
            .schedule_round(
                &roster(&["A"]),
                &flat_elos(&["A"], 1000.0),
                &FixtureHistory::default(),
                &mut rng,
            )
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<FixturingError>(),
            Some(&FixturingError::InsufficientTeams { count: 1 })
        );

        let history = FixtureHistory::from_codes(&["A vs Stranger"], &[], &[]).unwrap();
        let err = sched
            .schedule_round(
                &roster(&["A", "B"]),
                &flat_elos(&["A", "B"], 1000.0),
                &history,
                &mut rng,
            )
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<FixturingError>(),
            Some(&FixturingError::UnknownTeam {
                team: "Stranger".to_string()
            })
        );

        let err = sched
            .schedule_round(
                &roster(&["A", "B"]),
                &flat_elos(&["A"], 1000.0),
                &FixtureHistory::default(),
                &mut rng,
            )
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FixturingError>(),
            Some(FixturingError::UnknownTeam { .. })
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let names = ["A", "B"];
        let history = FixtureHistory::from_codes(&["A vs B"], &[], &[]).unwrap();
        let configs = [
            (
                SchedulingConfig {
                    perturbation_range: 1e308,
                    ..Default::default()
                },
                ScoringConfig::default(),
            ),
            (
                SchedulingConfig {
                    perturbation_range: f64::NAN,
                    ..Default::default()
                },
                ScoringConfig::default(),
            ),
            (
                SchedulingConfig::default(),
                ScoringConfig {
                    base_weight: 1e13,
                    ..Default::default()
                },
            ),
        ];

        for (scheduling, scoring) in configs {
            let err = RoundScheduler::new(scheduling, scoring)
                .schedule_round(
                    &roster(&names),
                    &flat_elos(&names, 1000.0),
                    &history,
                    &mut StdRng::seed_from_u64(4),
                )
                .unwrap_err();
            assert!(matches!(
                err.downcast_ref::<FixturingError>(),
                Some(FixturingError::ConfigurationError { .. })
            ));
        }
    }

    #[test]
    fn test_perturbation_recovers_from_rematch() {
        // Without a rematch penalty the close pairs A-B and C-D win the first
        // matching, so only perturbation can move away from the A-B repeat
        let names = ["A", "B", "C", "D"];
        let elos: EloTable = [("A", 1000.0), ("B", 1000.0), ("C", 1100.0), ("D", 1100.0)]
            .into_iter()
            .map(|(team, elo)| (team.to_string(), elo))
            .collect();
        let history = FixtureHistory::from_codes(&["A vs B"], &[], &[]).unwrap();
        let sched = RoundScheduler::new(
            SchedulingConfig {
                max_allowed_rematches: 0,
                max_round_attempts: 50,
                perturbation_range: 300.0,
                ..Default::default()
            },
            ScoringConfig {
                rematch_penalty: 0.0,
                ..Default::default()
            },
        );

        let first_pass = sched.pair_round(&roster(&names), &elos, &history).unwrap();
        assert!(first_pass.rows.iter().any(|row| row.involves("A") && row.involves("B")));

        let outcome = sched
            .schedule_round(&roster(&names), &elos, &history, &mut StdRng::seed_from_u64(13))
            .unwrap();
        assert!(outcome.is_scheduled());
        assert!(outcome.attempts() > 1);

        let fixture = outcome.into_result().unwrap();
        assert_eq!(fixture.len(), 2);
        assert!(!fixture
            .rows
            .iter()
            .any(|row| row.involves("A") && row.involves("B")));
        assert_eq!(elos["A"], 1000.0);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let names = ["A", "B", "C", "D", "E", "F"];
        let elos: EloTable = names
            .iter()
            .enumerate()
            .map(|(i, t)| (t.to_string(), 1000.0 + 40.0 * i as f64))
            .collect();
        let history =
            FixtureHistory::from_codes(&["A vs B", "C vs D", "E vs F", "A vs C"], &[], &[]).unwrap();
        let sched = scheduler(0, 50);

        let first = sched
            .schedule_round(&roster(&names), &elos, &history, &mut StdRng::seed_from_u64(99))
            .unwrap();
        let second = sched
            .schedule_round(&roster(&names), &elos, &history, &mut StdRng::seed_from_u64(99))
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_perturbation_stays_in_range() {
        let mut elos = flat_elos(&["A", "B", "C"], 1000.0);
        let mut rng = StdRng::seed_from_u64(5);
        perturb_elos(&mut elos, 2.5, &mut rng);
        assert!(elos.values().all(|e| (e - 1000.0).abs() <= 2.5));

        let mut untouched = flat_elos(&["A"], 1000.0);
        perturb_elos(&mut untouched, 0.0, &mut rng);
        assert_eq!(untouched["A"], 1000.0);
    }

    proptest! {
        #[test]
        fn prop_even_round_covers_every_team_once(
            elos in prop::collection::vec(800.0f64..1400.0, 1..=6),
            seed in any::<u64>(),
        ) {
            let table: EloTable = elos
                .iter()
                .flat_map(|elo| [*elo, elo + 17.0])
                .enumerate()
                .map(|(i, elo)| (format!("Team {:02}", i), elo))
                .collect();
            let teams: BTreeSet<TeamId> = table.keys().cloned().collect();

            let fixture = scheduler(0, 10)
                .schedule_round(&teams, &table, &FixtureHistory::default(), &mut StdRng::seed_from_u64(seed))
                .unwrap()
                .into_result()
                .unwrap();

            prop_assert_eq!(fixture.len(), teams.len() / 2);
            let counts = appearances(&fixture);
            prop_assert_eq!(counts.len(), teams.len());
            prop_assert!(counts.values().all(|&c| c == 1));
        }
    }
}
