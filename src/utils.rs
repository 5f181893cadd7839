//! Utility functions for the fixturing engine

use crate::error::{FixturingError, Result};

/// Separator between the home and away side of a game code
pub const GAME_CODE_SEPARATOR: &str = " vs ";

/// Build the canonical `"<home> vs <away>"` code for a game
pub fn game_code(home_team: &str, away_team: &str) -> String {
    format!("{}{}{}", home_team, GAME_CODE_SEPARATOR, away_team)
}

/// Split a game code into `(home, away)` on the first separator
pub fn parse_game_code(code: &str) -> Result<(&str, &str)> {
    match code.trim().split_once(GAME_CODE_SEPARATOR) {
        Some((home, away)) if !home.trim().is_empty() && !away.trim().is_empty() => {
            Ok((home.trim(), away.trim()))
        }
        _ => Err(FixturingError::InvalidGameCode {
            code: code.to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_code_round_trip() {
        let code = game_code("Red Lions", "Blue Sharks");
        assert_eq!(code, "Red Lions vs Blue Sharks");
        assert_eq!(
            parse_game_code(&code).unwrap(),
            ("Red Lions", "Blue Sharks")
        );
    }

    #[test]
    fn test_parse_game_code_trims_whitespace() {
        assert_eq!(parse_game_code("  A vs B ").unwrap(), ("A", "B"));
    }

    #[test]
    fn test_parse_game_code_rejects_malformed() {
        for code in ["A v B", "A vs ", " vs B", ""] {
            let err = parse_game_code(code).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<FixturingError>(),
                Some(FixturingError::InvalidGameCode { .. })
            ));
        }
    }
}
