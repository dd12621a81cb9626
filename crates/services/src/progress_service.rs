use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use progress_core::Clock;
use progress_core::model::{
    BulkProgressSnapshot, ProgressEntry, ProgressRecord, QuestionId, UserId,
};
use storage::repository::{CatalogRepository, ProgressRepository};

use crate::cache::{CacheLayer, keys};
use crate::error::ProgressServiceError;
use crate::invalidation::CacheInvalidator;
use crate::stats_service::ProgressStatsService;

/// Per-user progress reads and writes.
///
/// Reads go cache-aside: check the cache, compute from the stores on a
/// miss, populate, return. Writes persist to the store first and invalidate
/// second; a caller that just wrote should trust its returned record rather
/// than immediately re-reading through the cache.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    progress: Arc<dyn ProgressRepository>,
    catalog: Arc<dyn CatalogRepository>,
    cache: CacheLayer,
    invalidator: Arc<CacheInvalidator>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        progress: Arc<dyn ProgressRepository>,
        catalog: Arc<dyn CatalogRepository>,
        cache: CacheLayer,
        invalidator: Arc<CacheInvalidator>,
    ) -> Self {
        Self {
            clock,
            progress,
            catalog,
            cache,
            invalidator,
        }
    }

    /// The user's full progress map plus aggregate stats, as one cacheable
    /// unit.
    ///
    /// The snapshot is recomputed wholesale on a miss and never patched in
    /// place. Its `stats.total_solved` is derived from the same record fetch
    /// that built the map, so the two cannot disagree within one snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if a store read fails; cache
    /// failures degrade to a direct computation.
    pub async fn bulk_progress(
        &self,
        user_id: UserId,
    ) -> Result<BulkProgressSnapshot, ProgressServiceError> {
        let key = keys::bulk_progress(user_id);
        if let Some(snapshot) = self.cache.get_json::<BulkProgressSnapshot>(&key).await {
            debug!(%user_id, "bulk progress served from cache");
            return Ok(snapshot);
        }

        let (records, total_questions) = tokio::join!(
            self.progress.find_by_user(user_id),
            self.catalog.total_question_count(),
        );
        let records = records?;
        let total_questions = total_questions?;

        let now = self.clock.now();
        let stats = ProgressStatsService::stats_from_records(&records, total_questions, now);

        let mut progress: HashMap<QuestionId, ProgressEntry> =
            HashMap::with_capacity(records.len());
        for rec in records {
            progress.insert(
                rec.question_id(),
                ProgressEntry {
                    solved: rec.solved(),
                    level: rec.level(),
                    solved_at: rec.solved_at(),
                },
            );
        }

        let snapshot = BulkProgressSnapshot {
            user_id,
            progress,
            stats,
            computed_at: now,
        };
        self.cache.put_json(&key, &snapshot).await;
        Ok(snapshot)
    }

    /// Record a solved/unsolved transition for one question.
    ///
    /// Creates the record on first touch. Idempotent: re-submitting
    /// `solved = true` keeps the original `solved_at`; `solved = false`
    /// clears it. Persists first, then evicts the user's cached views.
    ///
    /// # Errors
    ///
    /// Returns `QuestionNotFound` if the question does not exist, or
    /// `Storage` if persistence fails.
    pub async fn update_progress(
        &self,
        user_id: UserId,
        question_id: QuestionId,
        solved: bool,
    ) -> Result<ProgressRecord, ProgressServiceError> {
        let question = self
            .catalog
            .question_by_id(question_id)
            .await?
            .ok_or(ProgressServiceError::QuestionNotFound)?;

        let mut record = self
            .progress
            .find_by_user_and_question(user_id, question_id)
            .await?
            .unwrap_or_else(|| ProgressRecord::new(user_id, question_id, question.level()));

        if solved {
            record.mark_solved(self.clock.now());
        } else {
            record.mark_unsolved();
        }

        self.progress.upsert(&record).await?;
        self.invalidator.on_progress_write(user_id).await;
        Ok(record)
    }

    /// Direct store read of one `(user, question)` record.
    ///
    /// Bypasses the cache entirely, so it observes the caller's own writes
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the store read fails.
    pub async fn progress_for_question(
        &self,
        user_id: UserId,
        question_id: QuestionId,
    ) -> Result<Option<ProgressRecord>, ProgressServiceError> {
        let record = self
            .progress
            .find_by_user_and_question(user_id, question_id)
            .await?;
        Ok(record)
    }

    /// Whether the user has solved one specific question, behind a point
    /// cache entry. A missing record reads as unsolved.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the store read fails on a
    /// cache miss.
    pub async fn is_question_solved(
        &self,
        user_id: UserId,
        question_id: QuestionId,
    ) -> Result<bool, ProgressServiceError> {
        let key = keys::question_solved(user_id, question_id);
        if let Some(solved) = self.cache.get_json::<bool>(&key).await {
            return Ok(solved);
        }

        let solved = self
            .progress
            .find_by_user_and_question(user_id, question_id)
            .await?
            .is_some_and(|r| r.solved());

        self.cache.put_json(&key, &solved).await;
        Ok(solved)
    }
}
