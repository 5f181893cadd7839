//! Common types used throughout the fixturing engine

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque team identifier
pub type TeamId = String;

/// Elo per team, ordered by team name
pub type EloTable = BTreeMap<TeamId, f64>;

/// Name of the synthetic participant used to balance odd team counts
pub const BYE_TEAM: &str = "Bye Team";

/// Rating information for a team
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeamRating {
    pub elo: f64,
    /// Sensitivity factor applied to every rating update for this team
    pub k_value: f64,
}

impl TeamRating {
    pub fn new(elo: f64, k_value: f64) -> Self {
        Self { elo, k_value }
    }
}

/// A recorded match result, folded into ratings in round order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub round: u32,
    pub home_team: TeamId,
    pub away_team: TeamId,
    pub home_score: u32,
    pub away_score: u32,
}

/// Unordered pair of teams, stored with the smaller name first
///
/// Used for every "have these two played" lookup so that `A vs B` and
/// `B vs A` land on the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    first: TeamId,
    second: TeamId,
}

impl PairKey {
    pub fn new(team_a: &str, team_b: &str) -> Self {
        let (first, second) = if team_a <= team_b {
            (team_a, team_b)
        } else {
            (team_b, team_a)
        };
        Self {
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }

    pub fn contains(&self, team: &str) -> bool {
        self.first == team || self.second == team
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.first, self.second)
    }
}

/// One scheduled game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureRow {
    #[serde(rename = "Home Team")]
    pub home_team: TeamId,
    #[serde(rename = "Away Team")]
    pub away_team: TeamId,
    #[serde(rename = "Game Code")]
    pub game_code: String,
}

impl FixtureRow {
    pub fn new(home_team: &str, away_team: &str) -> Self {
        Self {
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            game_code: crate::utils::game_code(home_team, away_team),
        }
    }

    pub fn pair_key(&self) -> PairKey {
        PairKey::new(&self.home_team, &self.away_team)
    }

    pub fn involves(&self, team: &str) -> bool {
        self.home_team == team || self.away_team == team
    }

    /// The other side of the game, if `team` plays in it
    pub fn opponent_of(&self, team: &str) -> Option<&str> {
        if self.home_team == team {
            Some(&self.away_team)
        } else if self.away_team == team {
            Some(&self.home_team)
        } else {
            None
        }
    }
}

/// Ordered set of games for one round
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub rows: Vec<FixtureRow>,
}

impl Fixture {
    pub fn new(rows: Vec<FixtureRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FixtureRow> {
        self.rows.iter()
    }

    /// Every team that appears in the fixture, home sides first
    pub fn teams(&self) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .flat_map(|row| [row.home_team.as_str(), row.away_team.as_str()])
    }

    pub fn contains_team(&self, team: &str) -> bool {
        self.rows.iter().any(|row| row.involves(team))
    }
}

/// Two rounds fixtured together for an odd team count, plus the decider
/// game between the teams that drew the bye in each half
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ByeFixture {
    pub first_round: Fixture,
    pub second_round: Fixture,
    pub decider: FixtureRow,
    /// Teams that drew the bye in round one and round two respectively
    pub bye_teams: (TeamId, TeamId),
}

impl ByeFixture {
    /// Round one, round two, then the decider
    pub fn rows(&self) -> Vec<FixtureRow> {
        self.first_round
            .rows
            .iter()
            .chain(self.second_round.rows.iter())
            .chain(std::iter::once(&self.decider))
            .cloned()
            .collect()
    }

    pub fn into_fixture(self) -> Fixture {
        Fixture::new(self.rows())
    }
}
