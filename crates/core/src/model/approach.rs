use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{ApproachId, QuestionId, UserId};

/// One submitted solution attempt for a question.
///
/// The progress subsystem only ever counts these; the approach text itself
/// lives elsewhere and `content_size` is the stored byte length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproachRecord {
    id: ApproachId,
    user_id: UserId,
    question_id: QuestionId,
    content_size: u64,
    submitted_at: DateTime<Utc>,
}

impl ApproachRecord {
    /// Create a record with a freshly generated id.
    #[must_use]
    pub fn new(
        user_id: UserId,
        question_id: QuestionId,
        content_size: u64,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ApproachId::generate(),
            user_id,
            question_id,
            content_size,
            submitted_at,
        }
    }

    /// Rebuild a record from persisted fields.
    #[must_use]
    pub fn from_persisted(
        id: ApproachId,
        user_id: UserId,
        question_id: QuestionId,
        content_size: u64,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            question_id,
            content_size,
            submitted_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> ApproachId {
        self.id
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
    pub fn content_size(&self) -> u64 {
        self.content_size
    }

    #[must_use]
    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn fresh_records_get_distinct_ids() {
        let a = ApproachRecord::new(UserId::new(1), QuestionId::new(1), 10, fixed_now());
        let b = ApproachRecord::new(UserId::new(1), QuestionId::new(1), 10, fixed_now());
        assert_ne!(a.id(), b.id());
    }
}
