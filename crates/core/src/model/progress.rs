use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{QuestionId, UserId};
use crate::model::level::Level;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("solved flag and solved_at timestamp disagree")]
    InconsistentSolvedAt,
}

//
// ─── PROGRESS RECORD ───────────────────────────────────────────────────────────
//

/// Solved/unsolved state of one user for one question.
///
/// Identity is the `(user_id, question_id)` pair. The type maintains the
/// invariant that `solved_at` is set if and only if `solved` is true; the
/// only mutators are `mark_solved` and `mark_unsolved`, so an inconsistent
/// pair cannot be constructed outside `from_persisted`, which rejects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    user_id: UserId,
    question_id: QuestionId,
    level: Level,
    solved: bool,
    solved_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    /// Create a fresh, unsolved record for a `(user, question)` pair.
    #[must_use]
    pub fn new(user_id: UserId, question_id: QuestionId, level: Level) -> Self {
        Self {
            user_id,
            question_id,
            level,
            solved: false,
            solved_at: None,
        }
    }

    /// Rebuild a record from persisted fields.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::InconsistentSolvedAt` when `solved` and
    /// `solved_at` disagree (a solved record without a timestamp, or an
    /// unsolved record with one).
    pub fn from_persisted(
        user_id: UserId,
        question_id: QuestionId,
        level: Level,
        solved: bool,
        solved_at: Option<DateTime<Utc>>,
    ) -> Result<Self, ProgressError> {
        if solved != solved_at.is_some() {
            return Err(ProgressError::InconsistentSolvedAt);
        }
        Ok(Self {
            user_id,
            question_id,
            level,
            solved,
            solved_at,
        })
    }

    /// Mark the question solved at `now`.
    ///
    /// Idempotent: re-solving an already-solved question keeps the original
    /// `solved_at`, so only the false→true transition stamps the time.
    pub fn mark_solved(&mut self, now: DateTime<Utc>) {
        if !self.solved {
            self.solved = true;
            self.solved_at = Some(now);
        }
    }

    /// Mark the question unsolved, clearing `solved_at`.
    pub fn mark_unsolved(&mut self) {
        self.solved = false;
        self.solved_at = None;
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub fn solved(&self) -> bool {
        self.solved
    }

    #[must_use]
    pub fn solved_at(&self) -> Option<DateTime<Utc>> {
        self.solved_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
