use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use progress_core::Clock;
use progress_core::model::stats::{count_recent, percentage, streak_days};
use progress_core::model::{Level, LevelBreakdown, ProgressRecord, ProgressStats, UserId};
use storage::repository::{CatalogRepository, ProgressRepository};

use crate::error::StatsError;

/// Computes a single user's aggregate statistics.
///
/// Pure read: no side effects. The bulk-snapshot and category read paths
/// call this behind their caches; `compute_stats` itself never touches one.
#[derive(Clone)]
pub struct ProgressStatsService {
    clock: Clock,
    progress: Arc<dyn ProgressRepository>,
    catalog: Arc<dyn CatalogRepository>,
}

impl ProgressStatsService {
    /// Streak and recency look at the most recent solved records only,
    /// not the full history. A cap of 30 records mirrors the behavior this
    /// system replaced: a very active user whose last 30 solves span fewer
    /// calendar days can see a shorter streak than their true history.
    /// Deliberate and tunable, not a bug to fix silently.
    pub const STREAK_LOOKBACK_RECORDS: usize = 30;

    /// Window for the recent-activity count, in days.
    pub const RECENT_WINDOW_DAYS: u32 = 7;

    #[must_use]
    pub fn new(
        clock: Clock,
        progress: Arc<dyn ProgressRepository>,
        catalog: Arc<dyn CatalogRepository>,
    ) -> Self {
        Self {
            clock,
            progress,
            catalog,
        }
    }

    /// Compute the user's aggregate statistics from the stores.
    ///
    /// Totals come from count queries; streak and recency from the bounded
    /// recent solved set.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` if any store read fails.
    pub async fn compute_stats(&self, user_id: UserId) -> Result<ProgressStats, StatsError> {
        let (total_questions, total_solved, easy, medium, hard, solved_records) = tokio::join!(
            self.catalog.total_question_count(),
            self.progress.count_solved_by_user(user_id),
            self.progress
                .count_solved_by_user_and_level(user_id, Level::Easy),
            self.progress
                .count_solved_by_user_and_level(user_id, Level::Medium),
            self.progress
                .count_solved_by_user_and_level(user_id, Level::Hard),
            self.progress.find_solved_by_user(user_id),
        );

        let total_questions = total_questions?;
        let total_solved = total_solved?;
        let solved_by_level = LevelBreakdown {
            easy: easy?,
            medium: medium?,
            hard: hard?,
        };

        let now = self.clock.now();
        let timestamps = solved_records?
            .iter()
            .filter_map(ProgressRecord::solved_at)
            .collect();
        let (streak, recent) = Self::recent_activity(timestamps, now);

        Ok(ProgressStats {
            total_solved,
            total_questions,
            progress_percentage: percentage(total_solved, total_questions),
            solved_by_level,
            streak_days: streak,
            recent_solved: recent,
        })
    }

    /// Derive the same stats shape from an already-fetched record set.
    ///
    /// The bulk snapshot uses this so its `total_solved` is by construction
    /// the number of solved entries in the map it ships with, with no skew
    /// from a second round of count queries.
    #[must_use]
    pub(crate) fn stats_from_records(
        records: &[ProgressRecord],
        total_questions: u64,
        now: DateTime<Utc>,
    ) -> ProgressStats {
        let mut solved_by_level = LevelBreakdown::default();
        let mut timestamps = Vec::new();
        for rec in records.iter().filter(|r| r.solved()) {
            solved_by_level.bump(rec.level());
            if let Some(at) = rec.solved_at() {
                timestamps.push(at);
            }
        }
        let total_solved = solved_by_level.total();

        let (streak, recent) = Self::recent_activity(timestamps, now);

        ProgressStats {
            total_solved,
            total_questions,
            progress_percentage: percentage(total_solved, total_questions),
            solved_by_level,
            streak_days: streak,
            recent_solved: recent,
        }
    }

    /// Streak and recent-activity figures from solve timestamps, capped to
    /// the most recent `STREAK_LOOKBACK_RECORDS` solves.
    fn recent_activity(mut timestamps: Vec<DateTime<Utc>>, now: DateTime<Utc>) -> (u32, u64) {
        timestamps.sort_unstable_by(|a, b| b.cmp(a));
        timestamps.truncate(Self::STREAK_LOOKBACK_RECORDS);

        let dates: HashSet<NaiveDate> = timestamps.iter().map(DateTime::date_naive).collect();

        let streak = streak_days(&dates, now.date_naive());
        let recent = count_recent(&timestamps, now, Self::RECENT_WINDOW_DAYS);
        (streak, recent)
    }
}
