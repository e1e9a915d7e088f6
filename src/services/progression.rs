use serde::{Deserialize, Serialize};

pub const INITIAL_LEVEL: i32 = 1;
pub const INITIAL_MAX_XP: i32 = 100;
pub const INITIAL_STREAK: i32 = 1;
pub const INITIAL_TOKENS: i32 = 5;

pub const SCAN_XP_AWARD: i32 = 15;
pub const COACH_XP_AWARD: i32 = 10;

const LEVEL_GROWTH_NUM: i64 = 3;
const LEVEL_GROWTH_DEN: i64 = 2;

/// In-memory progression state, camelCase on the wire to match the
/// client payloads, snake_case columns in the `profiles` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub level: i32,
    pub xp: i32,
    pub max_xp: i32,
    pub streak: i32,
    pub tokens: i32,
    pub is_premium: bool,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub daily_scans: i32,
    pub daily_coach_uses: i32,
    pub usage_date: String,
}

impl UserProgress {
    pub fn initial(name: &str, today: &str) -> Self {
        Self {
            level: INITIAL_LEVEL,
            xp: 0,
            max_xp: INITIAL_MAX_XP,
            streak: INITIAL_STREAK,
            tokens: INITIAL_TOKENS,
            is_premium: false,
            name: name.to_string(),
            avatar_url: None,
            daily_scans: 0,
            daily_coach_uses: 0,
            usage_date: today.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpOutcome {
    pub level: i32,
    pub xp: i32,
    pub max_xp: i32,
    pub leveled_up: bool,
}

/// Folds an XP award into a consistent (level, xp, max_xp) triple.
///
/// Overflow resolves to a fixpoint: xp large enough to clear several level
/// thresholds grants several levels in one call, each growing max_xp by
/// factor 1.5 (floored). Always leaves `xp < max_xp`.
pub fn apply_xp(current: &UserProgress, amount: i32) -> XpOutcome {
    let mut xp = i64::from(current.xp) + i64::from(amount.max(0));
    let mut level = current.level;
    let mut max_xp = i64::from(current.max_xp);
    let mut leveled_up = false;

    while xp >= max_xp {
        xp -= max_xp;
        level += 1;
        max_xp = max_xp * LEVEL_GROWTH_NUM / LEVEL_GROWTH_DEN;
        leveled_up = true;
    }

    // Both fields clamp to i32 range together so `xp < max_xp` holds even
    // when the loop saturates max_xp past i32::MAX.
    let max_xp = max_xp.min(i64::from(i32::MAX));
    let xp = xp.clamp(0, max_xp - 1);

    XpOutcome {
        level,
        xp: xp as i32,
        max_xp: max_xp as i32,
        leveled_up,
    }
}

/// Applies the outcome back onto the progress record.
pub fn grant_xp(progress: &mut UserProgress, amount: i32) -> bool {
    let outcome = apply_xp(progress, amount);
    progress.level = outcome.level;
    progress.xp = outcome.xp;
    progress.max_xp = outcome.max_xp;
    outcome.leveled_up
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn progress(level: i32, xp: i32, max_xp: i32) -> UserProgress {
        let mut p = UserProgress::initial("Agent", "2026-01-01");
        p.level = level;
        p.xp = xp;
        p.max_xp = max_xp;
        p
    }

    #[test]
    fn test_no_overflow_keeps_level() {
        let out = apply_xp(&progress(1, 10, 100), 50);
        assert_eq!(out.level, 1);
        assert_eq!(out.xp, 60);
        assert_eq!(out.max_xp, 100);
        assert!(!out.leveled_up);
    }

    #[test]
    fn test_fresh_user_single_level_up() {
        let out = apply_xp(&progress(1, 0, 100), 150);
        assert_eq!(out.level, 2);
        assert_eq!(out.xp, 50);
        assert_eq!(out.max_xp, 150);
        assert!(out.leveled_up);
    }

    #[test]
    fn test_exact_threshold_levels_up_to_zero_xp() {
        let out = apply_xp(&progress(1, 0, 100), 100);
        assert_eq!(out.level, 2);
        assert_eq!(out.xp, 0);
        assert_eq!(out.max_xp, 150);
        assert!(out.leveled_up);
    }

    #[test]
    fn test_quest_reward_near_threshold() {
        let out = apply_xp(&progress(1, 90, 100), 20);
        assert_eq!(out.level, 2);
        assert_eq!(out.xp, 10);
        assert_eq!(out.max_xp, 150);
        assert!(out.leveled_up);
    }

    #[test]
    fn test_large_award_resolves_multiple_levels() {
        // 100 + 150 = 250 clears two thresholds, lands at level 3
        let out = apply_xp(&progress(1, 0, 100), 260);
        assert_eq!(out.level, 3);
        assert_eq!(out.xp, 10);
        assert_eq!(out.max_xp, 225);
        assert!(out.leveled_up);
    }

    #[test]
    fn test_grant_xp_mutates_in_place() {
        let mut p = progress(1, 90, 100);
        let leveled = grant_xp(&mut p, SCAN_XP_AWARD);
        assert!(leveled);
        assert_eq!(p.level, 2);
        assert_eq!(p.xp, 5);
        assert_eq!(p.max_xp, 150);
    }

    #[test]
    fn test_residual_clamps_when_max_xp_saturates() {
        // A progress row already at the i32 ceiling: the residual after the
        // last level-up would exceed i32::MAX, so both fields clamp together.
        let out = apply_xp(&progress(1, 2_147_483_646, 2_000_000_000), i32::MAX);
        assert_eq!(out.max_xp, i32::MAX);
        assert_eq!(out.xp, i32::MAX - 1);
        assert!(out.xp >= 0);
        assert!(out.xp < out.max_xp);
    }

    proptest! {
        #[test]
        fn prop_xp_stays_below_max(xp in 0i32..10_000, max_xp in 1i32..10_000, amount in 0i32..100_000) {
            let xp = xp.min(max_xp - 1);
            let out = apply_xp(&progress(1, xp, max_xp), amount);
            prop_assert!(out.xp >= 0);
            prop_assert!(out.xp < out.max_xp);
        }

        #[test]
        fn prop_level_monotone(level in 1i32..100, xp in 0i32..99, amount in 0i32..100_000) {
            let out = apply_xp(&progress(level, xp, 100), amount);
            prop_assert!(out.level >= level);
            prop_assert!(out.max_xp >= 100);
        }

        #[test]
        fn prop_max_xp_grows_by_fixed_factor(amount in 0i32..10_000) {
            let before = progress(1, 0, 100);
            let out = apply_xp(&before, amount);
            let mut expected = 100i64;
            for _ in before.level..out.level {
                expected = expected * 3 / 2;
            }
            prop_assert_eq!(i64::from(out.max_xp), expected);
        }
    }
}
