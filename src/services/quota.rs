use serde::{Deserialize, Serialize};

use crate::services::progression::UserProgress;

/// Free-tier allowance per feature per calendar day.
pub const FREE_DAILY_LIMIT: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageKind {
    Scan,
    Coach,
}

impl UsageKind {
    pub fn count(self, progress: &UserProgress) -> i32 {
        match self {
            UsageKind::Scan => progress.daily_scans,
            UsageKind::Coach => progress.daily_coach_uses,
        }
    }

    pub fn record(self, progress: &mut UserProgress) -> i32 {
        match self {
            UsageKind::Scan => {
                progress.daily_scans += 1;
                progress.daily_scans
            }
            UsageKind::Coach => {
                progress.daily_coach_uses += 1;
                progress.daily_coach_uses
            }
        }
    }
}

/// Premium accounts are never locked; free accounts lock once the daily
/// allowance is spent.
pub fn is_locked(is_premium: bool, usage_count: i32) -> bool {
    !is_premium && usage_count >= FREE_DAILY_LIMIT
}

/// Resets both daily counters when the stored usage date no longer matches
/// today. The comparison is a literal "YYYY-MM-DD" string equality check;
/// callers must run this before any lock check on a loaded profile.
///
/// Returns true when a reset happened (the caller persists it).
pub fn reconcile_date(progress: &mut UserProgress, today: &str) -> bool {
    if progress.usage_date == today {
        return false;
    }
    progress.daily_scans = 0;
    progress.daily_coach_uses = 0;
    progress.usage_date = today.to_string();
    true
}

/// Today's date as the "YYYY-MM-DD" string the store compares against.
pub fn today_string() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::progression::UserProgress;

    #[test]
    fn test_premium_never_locked() {
        assert!(!is_locked(true, 0));
        assert!(!is_locked(true, 1));
        assert!(!is_locked(true, 9999));
    }

    #[test]
    fn test_free_tier_locks_after_one_use() {
        assert!(!is_locked(false, 0));
        assert!(is_locked(false, 1));
        assert!(is_locked(false, 2));
    }

    #[test]
    fn test_reconcile_resets_on_new_day() {
        let mut p = UserProgress::initial("Agent", "2026-08-25");
        p.daily_scans = 1;
        p.daily_coach_uses = 1;

        assert!(reconcile_date(&mut p, "2026-08-26"));
        assert_eq!(p.daily_scans, 0);
        assert_eq!(p.daily_coach_uses, 0);
        assert_eq!(p.usage_date, "2026-08-26");
    }

    #[test]
    fn test_reconcile_same_day_is_noop() {
        let mut p = UserProgress::initial("Agent", "2026-08-26");
        p.daily_scans = 1;

        assert!(!reconcile_date(&mut p, "2026-08-26"));
        assert_eq!(p.daily_scans, 1);

        // idempotent on a second call
        assert!(!reconcile_date(&mut p, "2026-08-26"));
        assert_eq!(p.daily_scans, 1);
    }

    #[test]
    fn test_locked_all_day_until_rollover() {
        let mut p = UserProgress::initial("Agent", "2026-08-26");
        UsageKind::Scan.record(&mut p);
        assert!(is_locked(p.is_premium, UsageKind::Scan.count(&p)));

        reconcile_date(&mut p, "2026-08-26");
        assert!(is_locked(p.is_premium, UsageKind::Scan.count(&p)));

        reconcile_date(&mut p, "2026-08-27");
        assert!(!is_locked(p.is_premium, UsageKind::Scan.count(&p)));
    }

    #[test]
    fn test_record_usage_increments_one_counter() {
        let mut p = UserProgress::initial("Agent", "2026-08-26");
        assert_eq!(UsageKind::Coach.record(&mut p), 1);
        assert_eq!(p.daily_coach_uses, 1);
        assert_eq!(p.daily_scans, 0);
    }
}
