//! Pure scoring rules.
//!
//! Nothing here touches session state; the engine passes in the values it has already
//! updated (streak after increment, time left after the timer stopped).

use crate::models::SessionConfig;

/// Points for the time left on the clock, rounded down.
pub fn time_bonus_points(config: &SessionConfig, time_left_secs: f64) -> u64 {
    (time_left_secs.max(0.0) * config.points_per_time_bonus_unit as f64).floor() as u64
}

/// Streak bonus once the streak reaches the threshold, capped at
/// `max_streak_bonus_multiple` streak units.
pub fn streak_bonus_points(config: &SessionConfig, streak: u32) -> u64 {
    if streak < config.streak_threshold {
        return 0;
    }
    let bonus = streak as u64 * config.points_per_streak_unit;
    let cap = config.max_streak_bonus_multiple * config.points_per_streak_unit;
    bonus.min(cap)
}

/// Total points for a correct answer.
///
/// # Arguments
/// * `streak` - Streak including this answer
/// * `time_left_secs` - Remaining time when the answer was submitted
/// * `combo_multiplier` - Applied to the sum of base, time and streak points
pub fn points_for_correct(
    config: &SessionConfig,
    streak: u32,
    time_left_secs: f64,
    combo_multiplier: u64,
) -> u64 {
    let points = config.points_per_correct
        + time_bonus_points(config, time_left_secs)
        + streak_bonus_points(config, streak);
    points * combo_multiplier
}

/// True when `streak` is a positive multiple of the streak threshold.
pub fn is_streak_milestone(config: &SessionConfig, streak: u32) -> bool {
    config.streak_threshold > 0 && streak > 0 && streak % config.streak_threshold == 0
}

/// Completion bonus for lives left.
pub fn lives_bonus(config: &SessionConfig, lives: u32) -> u64 {
    lives as u64 * config.lives_bonus_points
}

/// Completion bonus for finishing under the time budget, rounded down, never negative.
pub fn completion_time_bonus(config: &SessionConfig, elapsed_secs: f64) -> u64 {
    (config.time_budget_secs as f64 - elapsed_secs).max(0.0).floor() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reference_score() {
        let config = SessionConfig::default();
        assert_eq!(points_for_correct(&config, 3, 8.0, 1), 330);
    }

    #[test]
    fn test_no_streak_bonus_below_threshold() {
        let config = SessionConfig::default();
        assert_eq!(streak_bonus_points(&config, 2), 0);
        assert_eq!(points_for_correct(&config, 1, 10.0, 1), 200);
    }

    #[test]
    fn test_streak_bonus_capped() {
        let config = SessionConfig::default();
        assert_eq!(streak_bonus_points(&config, 5), 250);
        assert_eq!(streak_bonus_points(&config, 12), 250);
    }

    #[test]
    fn test_time_bonus_rounds_down() {
        let config = SessionConfig::default();
        assert_eq!(time_bonus_points(&config, 7.96), 79);
        assert_eq!(time_bonus_points(&config, 0.0), 0);
    }

    #[test]
    fn test_streak_milestones() {
        let config = SessionConfig::default();
        assert!(!is_streak_milestone(&config, 0));
        assert!(!is_streak_milestone(&config, 2));
        assert!(is_streak_milestone(&config, 3));
        assert!(!is_streak_milestone(&config, 4));
        assert!(is_streak_milestone(&config, 6));
    }

    #[test]
    fn test_completion_bonuses() {
        let config = SessionConfig::default();
        assert_eq!(lives_bonus(&config, 2), 1000);
        assert_eq!(completion_time_bonus(&config, 250.4), 749);
        assert_eq!(completion_time_bonus(&config, 1500.0), 0);
    }

    proptest! {
        #[test]
        fn prop_combo_multiplier_scales_linearly(
            streak in 0u32..20,
            time_left in 0.0f64..30.0,
            combo in 1u64..5,
        ) {
            let config = SessionConfig::default();
            let base = points_for_correct(&config, streak, time_left, 1);
            prop_assert_eq!(points_for_correct(&config, streak, time_left, combo), base * combo);
        }

        #[test]
        fn prop_correct_answer_earns_at_least_base(streak in 0u32..50, time_left in 0.0f64..60.0) {
            let config = SessionConfig::default();
            let points = points_for_correct(&config, streak, time_left, 1);
            prop_assert!(points >= config.points_per_correct);
            prop_assert!(points <= config.points_per_correct
                + time_bonus_points(&config, time_left)
                + config.max_streak_bonus_multiple * config.points_per_streak_unit);
        }
    }
}
