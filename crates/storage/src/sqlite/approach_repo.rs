use progress_core::model::{ApproachRecord, QuestionId, UserId};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{question_id_from_i64, question_id_to_i64, user_id_to_i64},
};
use crate::repository::{ApproachRepository, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl ApproachRepository for SqliteRepository {
    async fn grouped_counts(
        &self,
        user_id: UserId,
        question_ids: &[QuestionId],
    ) -> Result<Vec<(QuestionId, u64)>, StorageError> {
        if question_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut sql = String::from(
            r"
            SELECT question_id, COUNT(*) AS n
            FROM approach_records
            WHERE user_id = ?1 AND question_id IN (
            ",
        );

        for i in 0..question_ids.len() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push('?');
            sql.push_str(&(i + 2).to_string());
        }
        sql.push_str(")\nGROUP BY question_id\n");

        let mut q = sqlx::query(&sql).bind(user_id_to_i64(user_id)?);
        for id in question_ids {
            q = q.bind(question_id_to_i64(*id)?);
        }

        // A failed grouped query is reported as Aggregation so callers can
        // degrade to the per-question path instead of failing the request.
        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Aggregation(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let question_id = question_id_from_i64(row.try_get("question_id").map_err(conn)?)?;
            let n: i64 = row.try_get("n").map_err(conn)?;
            let n = u64::try_from(n)
                .map_err(|_| StorageError::Serialization("negative count".into()))?;
            out.push((question_id, n));
        }
        Ok(out)
    }

    async fn count_by_user_and_question(
        &self,
        user_id: UserId,
        question_id: QuestionId,
    ) -> Result<u64, StorageError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM approach_records WHERE user_id = ?1 AND question_id = ?2",
        )
        .bind(user_id_to_i64(user_id)?)
        .bind(question_id_to_i64(question_id)?)
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;

        let n: i64 = row.try_get("n").map_err(conn)?;
        u64::try_from(n).map_err(|_| StorageError::Serialization("negative count".into()))
    }

    async fn insert(&self, record: &ApproachRecord) -> Result<(), StorageError> {
        let content_size = i64::try_from(record.content_size())
            .map_err(|_| StorageError::Serialization("content_size overflow".into()))?;

        sqlx::query(
            r"
            INSERT INTO approach_records (id, user_id, question_id, content_size, submitted_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(record.id().as_uuid().to_string())
        .bind(user_id_to_i64(record.user_id())?)
        .bind(question_id_to_i64(record.question_id())?)
        .bind(content_size)
        .bind(record.submitted_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
