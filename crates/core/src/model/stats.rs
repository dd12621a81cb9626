//! Derived progress statistics.
//!
//! Everything in this module is computed from progress and catalog records,
//! never stored as a source of truth. The shapes derive serde so services
//! can park them in the cache as JSON.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{CategoryId, QuestionId, UserId};
use crate::model::level::Level;

//
// ─── LEVEL BREAKDOWN ───────────────────────────────────────────────────────────
//

/// Per-difficulty counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelBreakdown {
    pub easy: u64,
    pub medium: u64,
    pub hard: u64,
}

impl LevelBreakdown {
    #[must_use]
    pub fn get(&self, level: Level) -> u64 {
        match level {
            Level::Easy => self.easy,
            Level::Medium => self.medium,
            Level::Hard => self.hard,
        }
    }

    /// Increment the count for one level.
    pub fn bump(&mut self, level: Level) {
        match level {
            Level::Easy => self.easy += 1,
            Level::Medium => self.medium += 1,
            Level::Hard => self.hard += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.easy + self.medium + self.hard
    }
}

//
// ─── STATS SHAPES ──────────────────────────────────────────────────────────────
//

/// Aggregate statistics for one user across the whole catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressStats {
    pub total_solved: u64,
    pub total_questions: u64,
    /// 0–100, rounded to 2 decimals; 0.0 for an empty catalog.
    pub progress_percentage: f64,
    pub solved_by_level: LevelBreakdown,
    /// Consecutive calendar days ending today with at least one solve.
    pub streak_days: u32,
    /// Solves within the recent-activity window.
    pub recent_solved: u64,
}

/// Question counts for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionTotals {
    pub total: u64,
    pub by_level: LevelBreakdown,
}

/// One user's progress within one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCategoryProgress {
    pub solved: u64,
    pub solved_by_level: LevelBreakdown,
    pub progress_percentage: f64,
}

/// Category metadata joined with question totals and one user's progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category_id: CategoryId,
    pub name: String,
    pub totals: QuestionTotals,
    pub user: UserCategoryProgress,
}

/// Per-question progress as seen inside a bulk snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub solved: bool,
    pub level: Level,
    pub solved_at: Option<DateTime<Utc>>,
}

/// Cached aggregate of all progress plus stats for one user.
///
/// Exclusively owned by its cache entry: recomputed wholesale on a miss,
/// never partially patched. `stats.total_solved` always matches the number
/// of solved entries in `progress` because both come from the same fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkProgressSnapshot {
    pub user_id: UserId,
    pub progress: HashMap<QuestionId, ProgressEntry>,
    pub stats: ProgressStats,
    pub computed_at: DateTime<Utc>,
}

//
// ─── PURE HELPERS ──────────────────────────────────────────────────────────────
//

/// Percentage of `part` in `whole`, rounded to 2 decimals.
///
/// Returns `0.0` when `whole` is zero; an empty catalog is a valid state,
/// not an error.
#[must_use]
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let raw = part as f64 / whole as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

/// Consecutive calendar days ending at `today` on which the user solved
/// at least one question.
///
/// Walks backwards from `today` one day at a time and stops at the first
/// date missing from `solved_dates`. Nothing solved today means streak 0,
/// regardless of history.
#[must_use]
pub fn streak_days(solved_dates: &HashSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut day = today;
    while solved_dates.contains(&day) {
        streak += 1;
        match day.checked_sub_days(Days::new(1)) {
            Some(prev) => day = prev,
            None => break,
        }
    }
    streak
}

/// Number of timestamps that fall within the last `window_days` before `now`.
#[must_use]
pub fn count_recent(timestamps: &[DateTime<Utc>], now: DateTime<Utc>, window_days: u32) -> u64 {
    let cutoff = now - chrono::Duration::days(i64::from(window_days));
    timestamps.iter().filter(|t| **t >= cutoff).count() as u64
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    #[test]
    fn percentage_guards_division_by_zero() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 0), 0.0);
    }

    #[test]
    fn percentage_rounds_to_two_decimals() {
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(5, 10), 50.0);
        assert_eq!(percentage(10, 10), 100.0);
    }

    #[test]
    fn streak_counts_consecutive_days_and_stops_at_gap() {
        let today = fixed_now().date_naive();
        let dates: HashSet<NaiveDate> = [
            today,
            today - Duration::days(1),
            today - Duration::days(2),
            // gap at today-3
            today - Duration::days(4),
        ]
        .into_iter()
        .collect();

        assert_eq!(streak_days(&dates, today), 3);
    }

    #[test]
    fn streak_is_zero_without_a_solve_today() {
        let today = fixed_now().date_naive();
        let dates: HashSet<NaiveDate> =
            [today - Duration::days(1), today - Duration::days(2)].into_iter().collect();

        assert_eq!(streak_days(&dates, today), 0);
    }

    #[test]
    fn streak_handles_empty_set() {
        assert_eq!(streak_days(&HashSet::new(), fixed_now().date_naive()), 0);
    }

    #[test]
    fn count_recent_filters_by_window() {
        let now = fixed_now();
        let timestamps = vec![
            now,
            now - Duration::days(3),
            now - Duration::days(6),
            now - Duration::days(8),
            now - Duration::days(30),
        ];
        assert_eq!(count_recent(&timestamps, now, 7), 3);
    }

    #[test]
    fn level_breakdown_bump_and_total() {
        let mut breakdown = LevelBreakdown::default();
        breakdown.bump(Level::Easy);
        breakdown.bump(Level::Easy);
        breakdown.bump(Level::Hard);
        assert_eq!(breakdown.get(Level::Easy), 2);
        assert_eq!(breakdown.get(Level::Medium), 0);
        assert_eq!(breakdown.total(), 3);
    }
}
