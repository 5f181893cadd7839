//! Integration tests for the league fixturer
//!
//! These tests run whole divisions through the public API:
//! - Rating folds feeding the schedulers
//! - Single rounds for even divisions and double rounds for odd ones
//! - Rematch avoidance against recorded history
//! - Fixture tables written to disk

mod fixtures;

use league_fixturer::config::{AppConfig, SchedulingConfig, ScoringConfig};
use league_fixturer::fixturing::{ByeRoundScheduler, FixtureHistory, RoundScheduler};
use league_fixturer::league::{
    fixture_file_name, read_fixture_csv, write_division_fixture, LeagueFile, LeaguePlanner,
};
use league_fixturer::{FixturingError, RatingBook, BYE_TEAM};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeSet;

use fixtures::{appearances, division, result, sample_league, write_league_toml};

#[test]
fn test_league_round_one_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let league_path = write_league_toml(dir.path(), &sample_league());
    let league = LeagueFile::from_path(&league_path).unwrap();

    let mut rng = StdRng::seed_from_u64(2018);
    let fixtures = LeaguePlanner::default()
        .plan_league(&league, 1, &mut rng)
        .unwrap();
    assert_eq!(fixtures.len(), 2);

    let out = dir.path().join("fixtures");
    for fixture in &fixtures {
        let path = write_division_fixture(&out, fixture, &league.season).unwrap();
        assert_eq!(read_fixture_csv(&path).unwrap(), fixture.rows);
    }

    assert!(out.join(fixture_file_name("Mixed", "1", "2018b")).exists());
    assert!(out.join(fixture_file_name("Ladies", "1-2", "2018b")).exists());
}

#[test]
fn test_mixed_round_avoids_recorded_games() {
    let league = sample_league();
    let mixed = league.division("Mixed").unwrap();
    let history = mixed.history().unwrap();

    let fixture = LeaguePlanner::default()
        .plan_division(mixed, 2, &mut StdRng::seed_from_u64(5))
        .unwrap()
        .unwrap();

    assert_eq!(fixture.rows.len(), 3);
    for row in &fixture.rows {
        assert!(!history.fixtured.contains(&row.home_team, &row.away_team));
        assert_eq!(row.game_code, format!("{} vs {}", row.home_team, row.away_team));
    }
    let counts = appearances(&fixture.rows);
    assert_eq!(counts.len(), 6);
    assert!(counts.values().all(|&c| c == 1));
}

#[test]
fn test_ladies_double_round_covers_everyone_twice() {
    let league = sample_league();
    let ladies = league.division("Ladies").unwrap();

    let fixture = LeaguePlanner::default()
        .plan_division(ladies, 3, &mut StdRng::seed_from_u64(9))
        .unwrap()
        .unwrap();

    assert_eq!(fixture.round_label, "3-4");
    assert_eq!(fixture.rows.len(), 5);
    let (first_bye, second_bye) = fixture.bye_teams.clone().unwrap();
    assert_ne!(first_bye, second_bye);

    let decider = fixture.rows.last().unwrap();
    assert!(decider.involves(&first_bye) && decider.involves(&second_bye));

    let counts = appearances(&fixture.rows);
    assert_eq!(counts.len(), 5);
    assert!(!counts.contains_key(BYE_TEAM));
    assert!(counts.values().all(|&c| c == 2));

    // Nothing inside the double round repeats
    let pairs: BTreeSet<_> = fixture.rows.iter().map(|row| row.pair_key()).collect();
    assert_eq!(pairs.len(), fixture.rows.len());
}

#[test]
fn test_consecutive_rounds_build_on_history() {
    let mut mixed = division("Mixed", "Team", 6);
    let planner = LeaguePlanner::default();
    let mut rng = StdRng::seed_from_u64(77);

    for round in 1..=3 {
        let before = mixed.history().unwrap();
        let fixture = planner.plan_division(&mixed, round, &mut rng).unwrap().unwrap();

        for row in &fixture.rows {
            // The side with fewer home games so far hosts
            assert!(
                before.fixtured.home_count(&row.home_team)
                    <= before.fixtured.home_count(&row.away_team)
            );
            mixed.fixtured_games.push(row.game_code.clone());
            mixed.results.push(result(round, &row.home_team, &row.away_team, 20, 10));
        }
    }

    let history = mixed.history().unwrap();
    let teams = mixed.roster();
    assert_eq!(history.fixtured.len(), 9);
    for a in &teams {
        for b in &teams {
            if a < b {
                assert!(history.fixtured.count(a, b) <= 1, "{} / {} met twice", a, b);
            }
        }
    }
}

#[test]
fn test_ratings_feed_closeness() {
    let mut book = RatingBook::new();
    for (team, elo) in [("A", 1000.0), ("B", 1000.0), ("C", 1000.0), ("D", 1000.0)] {
        book.insert(team.to_string(), league_fixturer::TeamRating::new(elo, 40.0))
            .unwrap();
    }
    book.fold_results(&[
        result(1, "A", "B", 50, 10),
        result(1, "C", "D", 50, 10),
        result(2, "A", "C", 30, 29),
        result(2, "B", "D", 30, 29),
    ])
    .unwrap();

    // A and C won big, B and D lost big; the closest games pair winners together
    let elos = book.elos();
    let history = FixtureHistory::from_codes(&["A vs B", "C vs D"], &[], &[]).unwrap();
    let scheduler = RoundScheduler::new(
        SchedulingConfig {
            max_allowed_rematches: 1,
            ..Default::default()
        },
        ScoringConfig::default(),
    );
    let fixture = scheduler
        .schedule_round(&book.teams(), &elos, &history, &mut StdRng::seed_from_u64(1))
        .unwrap()
        .into_result()
        .unwrap();

    let pairs: BTreeSet<_> = fixture.iter().map(|row| row.pair_key().to_string()).collect();
    assert!(pairs.contains("A / C"));
    assert!(pairs.contains("B / D"));
}

#[test]
fn test_unsatisfiable_division_reports_failure() {
    let mut tiny = division("Mixed", "Team", 2);
    tiny.fixtured_games = vec!["Team 0 vs Team 1".to_string()];

    let mut config = AppConfig::default();
    config.scheduling.max_round_attempts = 3;
    let err = LeaguePlanner::from_app_config(&config)
        .plan_division(&tiny, 2, &mut StdRng::seed_from_u64(0))
        .unwrap_err();

    assert_eq!(
        err.downcast_ref::<FixturingError>(),
        Some(&FixturingError::RematchConstraintUnsatisfiable {
            attempts: 3,
            worst_rematches: 1,
            allowed: 0,
        })
    );

    // A per-division allowance lets the same round through
    tiny.max_allowed_rematches = Some(1);
    assert!(LeaguePlanner::from_app_config(&config)
        .plan_division(&tiny, 2, &mut StdRng::seed_from_u64(0))
        .is_ok());
}

#[test]
fn test_scheduler_entry_points_agree_on_errors() {
    let names: BTreeSet<String> = ["A", "B", "C"].iter().map(|t| t.to_string()).collect();
    let elos = names.iter().map(|t| (t.clone(), 1000.0)).collect();
    let history = FixtureHistory::default();
    let mut rng = StdRng::seed_from_u64(3);

    let bye = ByeRoundScheduler::new(SchedulingConfig::default(), ScoringConfig::default())
        .schedule_double_round(&names, &elos, &history, &mut rng)
        .unwrap();
    assert!(bye.is_scheduled());

    let result_history = FixtureHistory::from_codes(&["A vs Z"], &[], &[]).unwrap();
    let err = RoundScheduler::new(SchedulingConfig::default(), ScoringConfig::default())
        .schedule_round(&names, &elos, &result_history, &mut rng)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<FixturingError>(),
        Some(FixturingError::UnknownTeam { .. })
    ));
}
