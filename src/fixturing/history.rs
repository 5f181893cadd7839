//! Game history bookkeeping
//!
//! Game codes are ordered (`"home vs away"`) but "have these teams played"
//! is an unordered question, so every lookup goes through [`PairKey`].

use crate::error::{FixturingError, Result};
use crate::types::{FixtureRow, PairKey, TeamId};
use crate::utils::{game_code, parse_game_code};
use std::collections::{BTreeSet, HashMap};

/// Append-only multiset of games
#[derive(Debug, Clone, Default)]
pub struct GameLog {
    games: Vec<(TeamId, TeamId)>,
    pair_counts: HashMap<PairKey, u32>,
    home_counts: HashMap<TeamId, u32>,
}

impl GameLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a list of `"home vs away"` codes
    pub fn from_codes<I, S>(codes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut log = Self::new();
        for code in codes {
            let (home, away) = parse_game_code(code.as_ref())?;
            log.record(home, away);
        }
        Ok(log)
    }

    pub fn record(&mut self, home_team: &str, away_team: &str) {
        *self
            .pair_counts
            .entry(PairKey::new(home_team, away_team))
            .or_insert(0) += 1;
        *self.home_counts.entry(home_team.to_string()).or_insert(0) += 1;
        self.games
            .push((home_team.to_string(), away_team.to_string()));
    }

    pub fn record_rows<'a, I>(&mut self, rows: I)
    where
        I: IntoIterator<Item = &'a FixtureRow>,
    {
        for row in rows {
            self.record(&row.home_team, &row.away_team);
        }
    }

    /// How many times the pair has met, in either order
    pub fn count(&self, team_a: &str, team_b: &str) -> u32 {
        self.pair_counts
            .get(&PairKey::new(team_a, team_b))
            .copied()
            .unwrap_or(0)
    }

    pub fn contains(&self, team_a: &str, team_b: &str) -> bool {
        self.count(team_a, team_b) > 0
    }

    /// Number of games in which `team` was listed as the home side
    pub fn home_count(&self, team: &str) -> u32 {
        self.home_counts.get(team).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Game codes in insertion order
    pub fn codes(&self) -> impl Iterator<Item = String> + '_ {
        self.games.iter().map(|(home, away)| game_code(home, away))
    }

    /// Every team mentioned in the log
    pub fn teams(&self) -> BTreeSet<&str> {
        self.games
            .iter()
            .flat_map(|(home, away)| [home.as_str(), away.as_str()])
            .collect()
    }

    /// Fail with `UnknownTeam` if the log mentions a team outside the roster
    pub fn validate_teams(&self, roster: &BTreeSet<TeamId>) -> Result<()> {
        match self.teams().into_iter().find(|team| !roster.contains(*team)) {
            Some(team) => Err(FixturingError::UnknownTeam {
                team: team.to_string(),
            }
            .into()),
            None => Ok(()),
        }
    }

    /// Worst rematch count across a fixture
    ///
    /// Each row counts its pair's appearances in this log plus any earlier
    /// row of the same fixture with the same pair.
    pub fn max_rematches(&self, rows: &[FixtureRow]) -> u32 {
        let mut seen: HashMap<PairKey, u32> = HashMap::new();
        rows.iter()
            .map(|row| {
                let key = row.pair_key();
                let earlier = seen.entry(key.clone()).or_insert(0);
                let count = self.pair_counts.get(&key).copied().unwrap_or(0) + *earlier;
                *earlier += 1;
                count
            })
            .max()
            .unwrap_or(0)
    }
}

/// Everything a scheduler needs to know about past and wished-for games
#[derive(Debug, Clone, Default)]
pub struct FixtureHistory {
    /// Games already fixtured this season
    pub fixtured: GameLog,
    /// Games teams asked for
    pub requested: GameLog,
    /// Games teams asked not to play
    pub anti_requested: GameLog,
}

impl FixtureHistory {
    pub fn new(fixtured: GameLog, requested: GameLog, anti_requested: GameLog) -> Self {
        Self {
            fixtured,
            requested,
            anti_requested,
        }
    }

    pub fn from_codes<S: AsRef<str>>(
        fixtured: &[S],
        requested: &[S],
        anti_requested: &[S],
    ) -> Result<Self> {
        Ok(Self::new(
            GameLog::from_codes(fixtured)?,
            GameLog::from_codes(requested)?,
            GameLog::from_codes(anti_requested)?,
        ))
    }

    pub fn validate_teams(&self, roster: &BTreeSet<TeamId>) -> Result<()> {
        self.fixtured.validate_teams(roster)?;
        self.requested.validate_teams(roster)?;
        self.anti_requested.validate_teams(roster)
    }

    /// Copy of this history with extra games appended to the fixtured log
    pub fn with_fixtured<'a, I>(&self, rows: I) -> Self
    where
        I: IntoIterator<Item = &'a FixtureRow>,
    {
        let mut extended = self.clone();
        extended.fixtured.record_rows(rows);
        extended
    }
}
