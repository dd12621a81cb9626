use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use progress_core::model::{QuestionId, UserId};
use storage::repository::ApproachRepository;

/// Per-question approach counts for list views.
///
/// Primary path is one grouped query for the whole id set; if that fails,
/// the service degrades to one count query per question. Either way the
/// caller gets a complete map, so a broken aggregation path can slow a
/// list view down but never break it.
#[derive(Clone)]
pub struct ApproachCountService {
    approaches: Arc<dyn ApproachRepository>,
}

impl ApproachCountService {
    #[must_use]
    pub fn new(approaches: Arc<dyn ApproachRepository>) -> Self {
        Self { approaches }
    }

    /// Approach counts for `question_ids`, one entry per requested id.
    ///
    /// Every requested id is present in the result, zero-filled when the
    /// user has no approaches for it. Infallible by design: store errors on
    /// both paths degrade to zeros rather than surfacing.
    pub async fn bulk_counts(
        &self,
        user_id: UserId,
        question_ids: &[QuestionId],
    ) -> HashMap<QuestionId, u64> {
        let mut counts: HashMap<QuestionId, u64> =
            question_ids.iter().map(|id| (*id, 0)).collect();
        if counts.is_empty() {
            return counts;
        }

        match self.approaches.grouped_counts(user_id, question_ids).await {
            Ok(grouped) => {
                for (question_id, count) in grouped {
                    // Overlay only requested ids; a misbehaving backend must
                    // not grow the map.
                    if let Some(slot) = counts.get_mut(&question_id) {
                        *slot = count;
                    }
                }
            }
            Err(err) => {
                warn!(
                    %user_id,
                    requested = question_ids.len(),
                    error = %err,
                    "grouped approach count failed, degrading to per-question queries"
                );
                self.fill_per_question(user_id, &mut counts).await;
            }
        }

        counts
    }

    async fn fill_per_question(&self, user_id: UserId, counts: &mut HashMap<QuestionId, u64>) {
        for (question_id, slot) in counts.iter_mut() {
            match self
                .approaches
                .count_by_user_and_question(user_id, *question_id)
                .await
            {
                Ok(count) => *slot = count,
                Err(err) => {
                    warn!(%user_id, %question_id, error = %err, "approach count failed, using 0");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use progress_core::model::ApproachRecord;
    use progress_core::time::fixed_now;
    use storage::repository::{InMemoryRepository, StorageError};

    async fn seeded_repo() -> InMemoryRepository {
        let repo = InMemoryRepository::new();
        let user = UserId::new(1);
        for q in [1u64, 1, 1, 2] {
            repo.insert(&ApproachRecord::new(user, QuestionId::new(q), 256, fixed_now()))
                .await
                .unwrap();
        }
        repo
    }

    /// Delegates single counts but fails every grouped query, simulating a
    /// store without aggregation support.
    struct NoAggregation(InMemoryRepository);

    #[async_trait]
    impl ApproachRepository for NoAggregation {
        async fn grouped_counts(
            &self,
            _user_id: UserId,
            _question_ids: &[QuestionId],
        ) -> Result<Vec<(QuestionId, u64)>, StorageError> {
            Err(StorageError::Aggregation("grouping unsupported".into()))
        }

        async fn count_by_user_and_question(
            &self,
            user_id: UserId,
            question_id: QuestionId,
        ) -> Result<u64, StorageError> {
            self.0.count_by_user_and_question(user_id, question_id).await
        }

        async fn insert(&self, record: &ApproachRecord) -> Result<(), StorageError> {
            self.0.insert(record).await
        }
    }

    fn ids(raw: &[u64]) -> Vec<QuestionId> {
        raw.iter().map(|id| QuestionId::new(*id)).collect()
    }

    #[tokio::test]
    async fn every_requested_id_gets_an_entry() {
        let service = ApproachCountService::new(Arc::new(seeded_repo().await));
        let requested = ids(&[1, 2, 3]);
        let counts = service.bulk_counts(UserId::new(1), &requested).await;

        assert_eq!(counts.len(), 3);
        assert_eq!(counts[&QuestionId::new(1)], 3);
        assert_eq!(counts[&QuestionId::new(2)], 1);
        assert_eq!(counts[&QuestionId::new(3)], 0);
    }

    #[tokio::test]
    async fn empty_request_returns_empty_map() {
        let service = ApproachCountService::new(Arc::new(seeded_repo().await));
        assert!(service.bulk_counts(UserId::new(1), &[]).await.is_empty());
    }

    #[tokio::test]
    async fn fallback_agrees_with_the_grouped_path() {
        let repo = seeded_repo().await;
        let requested = ids(&[1, 2, 3]);

        let grouped = ApproachCountService::new(Arc::new(repo.clone()))
            .bulk_counts(UserId::new(1), &requested)
            .await;
        let degraded = ApproachCountService::new(Arc::new(NoAggregation(repo)))
            .bulk_counts(UserId::new(1), &requested)
            .await;

        assert_eq!(grouped, degraded);
    }

    #[tokio::test]
    async fn other_users_approaches_do_not_leak() {
        let repo = seeded_repo().await;
        repo.insert(&ApproachRecord::new(
            UserId::new(2),
            QuestionId::new(1),
            256,
            fixed_now(),
        ))
        .await
        .unwrap();

        let counts = ApproachCountService::new(Arc::new(repo))
            .bulk_counts(UserId::new(1), &ids(&[1]))
            .await;
        assert_eq!(counts[&QuestionId::new(1)], 3);
    }
}
