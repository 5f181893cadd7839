//! Test fixtures for integration testing

#![allow(dead_code)]

use league_fixturer::league::{DivisionInput, LeagueFile, TeamInput};
use league_fixturer::types::MatchResult;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Division with `count` teams named `"<prefix> <i>"` and spread-out elos
pub fn division(name: &str, prefix: &str, count: usize) -> DivisionInput {
    DivisionInput {
        name: name.to_string(),
        teams: (0..count)
            .map(|i| TeamInput {
                name: format!("{} {}", prefix, i),
                starting_elo: 950.0 + 30.0 * i as f64,
                k_value: 32.0,
            })
            .collect(),
        results: Vec::new(),
        fixtured_games: Vec::new(),
        requested_games: Vec::new(),
        anti_requested_games: Vec::new(),
        max_allowed_rematches: None,
    }
}

pub fn result(round: u32, home: &str, away: &str, home_score: u32, away_score: u32) -> MatchResult {
    MatchResult {
        round,
        home_team: home.to_string(),
        away_team: away.to_string(),
        home_score,
        away_score,
    }
}

/// A season with an even mixed division and an odd ladies division
pub fn sample_league() -> LeagueFile {
    let mut mixed = division("Mixed", "Mixed", 6);
    mixed.fixtured_games = vec![
        "Mixed 0 vs Mixed 1".to_string(),
        "Mixed 2 vs Mixed 3".to_string(),
        "Mixed 4 vs Mixed 5".to_string(),
    ];
    mixed.results = vec![
        result(1, "Mixed 0", "Mixed 1", 42, 30),
        result(1, "Mixed 2", "Mixed 3", 25, 25),
        result(1, "Mixed 4", "Mixed 5", 18, 36),
    ];
    mixed.requested_games = vec!["Mixed 0 vs Mixed 5".to_string()];
    mixed.anti_requested_games = vec!["Mixed 1 vs Mixed 2".to_string()];

    let ladies = division("Ladies", "Ladies", 5);

    LeagueFile {
        season: "2018b".to_string(),
        divisions: vec![mixed, ladies],
    }
}

/// Write the league as TOML into `dir`
pub fn write_league_toml(dir: &Path, league: &LeagueFile) -> PathBuf {
    let path = dir.join("league.toml");
    std::fs::write(&path, toml::to_string(league).unwrap()).unwrap();
    path
}

/// How often each team appears in a list of rows
pub fn appearances<'a, I>(rows: I) -> HashMap<String, usize>
where
    I: IntoIterator<Item = &'a league_fixturer::FixtureRow>,
{
    let mut counts = HashMap::new();
    for row in rows {
        *counts.entry(row.home_team.clone()).or_insert(0) += 1;
        *counts.entry(row.away_team.clone()).or_insert(0) += 1;
    }
    counts
}
