//! Elo expected-outcome and update math
//!
//! Expected outcomes come from the skillratings Elo implementation; the
//! update step is our own because results are folded as score shares with a
//! per-team K-value rather than as win/draw/loss outcomes.

use crate::error::{FixturingError, Result};
use skillratings::elo::{expected_score, EloRating};

/// Expected outcome of a game between two ratings as `(p_a, p_b)`
///
/// `p_a + p_b == 1` and equal ratings give exactly `(0.5, 0.5)`.
pub fn expected_outcome(elo_a: f64, elo_b: f64) -> (f64, f64) {
    if elo_a == elo_b {
        return (0.5, 0.5);
    }

    let (p_a, _) = expected_score(&EloRating { rating: elo_a }, &EloRating { rating: elo_b });
    (p_a, 1.0 - p_a)
}

/// Map an expected-outcome probability to how close the contest is, in `[0, 1]`
pub fn scaled_closeness(probability: f64) -> f64 {
    2.0 * (0.5 - (probability - 0.5).abs())
}

/// Share of the combined score won by each side
///
/// Fails with [`FixturingError::DivisionUndefined`] for a 0-0 game.
pub fn score_share(score_a: u32, score_b: u32) -> Result<(f64, f64)> {
    let total = score_a as f64 + score_b as f64;
    if total == 0.0 {
        return Err(FixturingError::DivisionUndefined.into());
    }

    let share_a = score_a as f64 / total;
    Ok((share_a, 1.0 - share_a))
}

/// New rating after a game: `elo + k * (actual_share - expected)`
///
/// A side that won more than half of the score never drops below its
/// pre-match rating.
pub fn update_rating(expected: f64, actual_share: f64, elo: f64, k_value: f64) -> f64 {
    let updated = elo + k_value * (actual_share - expected);
    if actual_share > 0.5 {
        updated.max(elo)
    } else {
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_equal_ratings_are_even() {
        assert_eq!(expected_outcome(1000.0, 1000.0), (0.5, 0.5));
        assert_eq!(scaled_closeness(0.5), 1.0);
    }

    #[test]
    fn test_expected_outcome_400_points() {
        let (p_a, p_b) = expected_outcome(1400.0, 1000.0);
        assert!((p_a - 10.0 / 11.0).abs() < 1e-12);
        assert!((p_b - 1.0 / 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_scaled_closeness_bounds() {
        assert_eq!(scaled_closeness(0.0), 0.0);
        assert_eq!(scaled_closeness(1.0), 0.0);
        assert!((scaled_closeness(0.75) - 0.5).abs() < 1e-12);
        assert!((scaled_closeness(0.25) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_score_share() {
        assert_eq!(score_share(3, 0).unwrap(), (1.0, 0.0));
        assert_eq!(score_share(0, 3).unwrap(), (0.0, 1.0));
        assert_eq!(score_share(3, 1).unwrap(), (0.75, 0.25));

        let err = score_share(0, 0).unwrap_err();
        assert_eq!(
            err.downcast_ref::<FixturingError>(),
            Some(&FixturingError::DivisionUndefined)
        );
    }

    #[test]
    fn test_update_rating_moves_towards_result() {
        // Even game, won 3-1 with K = 32
        assert!((update_rating(0.5, 0.75, 1000.0, 32.0) - 1008.0).abs() < 1e-9);
        // Even game, lost 1-3
        assert!((update_rating(0.5, 0.25, 1000.0, 32.0) - 992.0).abs() < 1e-9);
    }

    #[test]
    fn test_update_rating_winner_floor() {
        // Heavy favourite that only just won would lose rating without the floor
        let expected = expected_outcome(1600.0, 1000.0).0;
        assert_eq!(update_rating(expected, 0.55, 1600.0, 32.0), 1600.0);

        // Losers are not floored
        let expected = expected_outcome(1000.0, 1600.0).0;
        assert!(update_rating(expected, 0.45, 1000.0, 32.0) > 1000.0);
        assert!(update_rating(0.9, 0.45, 1000.0, 32.0) < 1000.0);
    }

    proptest! {
        #[test]
        fn prop_expected_outcome_sums_to_one(a in 0.0f64..3000.0, b in 0.0f64..3000.0) {
            let (p_a, p_b) = expected_outcome(a, b);
            prop_assert!((p_a + p_b - 1.0).abs() < 1e-12);
            prop_assert!(p_a > 0.0 && p_a < 1.0);
            prop_assert!(p_b > 0.0 && p_b < 1.0);
        }

        #[test]
        fn prop_closeness_in_unit_interval(p in 0.0f64..=1.0) {
            let c = scaled_closeness(p);
            prop_assert!((0.0..=1.0).contains(&c));
        }

        #[test]
        fn prop_winner_never_loses_rating(
            elo_a in 0.0f64..3000.0,
            elo_b in 0.0f64..3000.0,
            k in 0.0f64..100.0,
            winner_score in 1u32..50,
            margin in 1u32..50,
        ) {
            let loser_score = winner_score.saturating_sub(margin);
            let (share, _) = score_share(winner_score, loser_score).unwrap();
            let (expected, _) = expected_outcome(elo_a, elo_b);
            prop_assert!(update_rating(expected, share, elo_a, k) >= elo_a);
        }
    }
}
