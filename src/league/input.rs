//! League data files
//!
//! A league file holds the season name and, per division, the starting
//! ratings, recorded results and the game-code lists the schedulers need.
//! Files are TOML or JSON, picked by extension.

use crate::error::{FixturingError, Result};
use crate::fixturing::FixtureHistory;
use crate::rating::RatingBook;
use crate::types::{MatchResult, TeamId, TeamRating};
use crate::utils::GAME_CODE_SEPARATOR;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

/// Starting rating for one team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamInput {
    pub name: TeamId,
    pub starting_elo: f64,
    pub k_value: f64,
}

/// Everything recorded for one division
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivisionInput {
    pub name: String,
    pub teams: Vec<TeamInput>,
    #[serde(default)]
    pub results: Vec<MatchResult>,
    #[serde(default)]
    pub fixtured_games: Vec<String>,
    #[serde(default)]
    pub requested_games: Vec<String>,
    #[serde(default)]
    pub anti_requested_games: Vec<String>,
    /// Overrides the configured rematch allowance for this division
    #[serde(default)]
    pub max_allowed_rematches: Option<u32>,
}

impl DivisionInput {
    /// Team names; repeated entries collapse into one
    pub fn roster(&self) -> BTreeSet<TeamId> {
        self.teams.iter().map(|team| team.name.clone()).collect()
    }

    /// Starting ratings, before any results are folded in
    pub fn rating_book(&self) -> Result<RatingBook> {
        let mut book = RatingBook::new();
        for team in &self.teams {
            book.insert(
                team.name.clone(),
                TeamRating::new(team.starting_elo, team.k_value),
            )?;
        }
        Ok(book)
    }

    /// Parsed game-code lists, checked against the roster
    pub fn history(&self) -> Result<FixtureHistory> {
        let history = FixtureHistory::from_codes(
            &self.fixtured_games,
            &self.requested_games,
            &self.anti_requested_games,
        )?;
        history.validate_teams(&self.roster())?;
        Ok(history)
    }
}

/// A whole league for one season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueFile {
    pub season: String,
    pub divisions: Vec<DivisionInput>,
}

impl LeagueFile {
    /// Load a `.toml` or `.json` league file
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read league file {}", path.display()))?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let league = match extension.as_deref() {
            Some("toml") => Self::from_toml_str(&raw),
            Some("json") => Self::from_json_str(&raw),
            _ => Err(FixturingError::LeagueFileError {
                message: format!(
                    "Unsupported league file extension for {} (expected .toml or .json)",
                    path.display()
                ),
            }
            .into()),
        };

        league.with_context(|| format!("Failed to load league file {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let league: LeagueFile = toml::from_str(raw).map_err(|e| FixturingError::LeagueFileError {
            message: e.to_string(),
        })?;
        league.validate()?;
        Ok(league)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let league: LeagueFile =
            serde_json::from_str(raw).map_err(|e| FixturingError::LeagueFileError {
                message: e.to_string(),
            })?;
        league.validate()?;
        Ok(league)
    }

    pub fn division(&self, name: &str) -> Option<&DivisionInput> {
        self.divisions.iter().find(|division| division.name == name)
    }

    fn validate(&self) -> Result<()> {
        if self.season.trim().is_empty() {
            return Err(FixturingError::LeagueFileError {
                message: "season cannot be empty".to_string(),
            }
            .into());
        }

        let mut names = HashSet::new();
        for division in &self.divisions {
            if division.name.trim().is_empty() {
                return Err(FixturingError::LeagueFileError {
                    message: "division name cannot be empty".to_string(),
                }
                .into());
            }
            if !names.insert(division.name.as_str()) {
                return Err(FixturingError::LeagueFileError {
                    message: format!("division {} is listed twice", division.name),
                }
                .into());
            }
            for team in &division.teams {
                validate_team_name(&team.name).with_context(|| {
                    format!("Invalid team name in division {}", division.name)
                })?;
            }
        }

        Ok(())
    }
}

/// Team names must survive a trip through a game code unchanged
fn validate_team_name(name: &str) -> Result<()> {
    let problem = if name.trim().is_empty() {
        Some("team name cannot be empty")
    } else if name.trim() != name {
        Some("team name has leading or trailing whitespace")
    } else if name.contains(GAME_CODE_SEPARATOR) {
        Some("team name contains the game code separator")
    } else {
        None
    };

    match problem {
        Some(problem) => Err(FixturingError::LeagueFileError {
            message: format!("{}: {:?}", problem, name),
        }
        .into()),
        None => Ok(()),
    }
}
