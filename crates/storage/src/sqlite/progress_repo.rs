use progress_core::model::{Level, ProgressRecord, QuestionId, UserId};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{map_progress_row, question_id_to_i64, user_id_to_i64},
};
use crate::repository::{ProgressRepository, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<ProgressRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT user_id, question_id, level, solved, solved_at
            FROM progress_records
            WHERE user_id = ?1
            ",
        )
        .bind(user_id_to_i64(user_id)?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_progress_row).collect()
    }

    async fn find_by_user_and_question(
        &self,
        user_id: UserId,
        question_id: QuestionId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, question_id, level, solved, solved_at
            FROM progress_records
            WHERE user_id = ?1 AND question_id = ?2
            ",
        )
        .bind(user_id_to_i64(user_id)?)
        .bind(question_id_to_i64(question_id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn find_solved_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT user_id, question_id, level, solved, solved_at
            FROM progress_records
            WHERE user_id = ?1 AND solved = 1
            ",
        )
        .bind(user_id_to_i64(user_id)?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_progress_row).collect()
    }

    async fn count_solved_by_user(&self, user_id: UserId) -> Result<u64, StorageError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM progress_records WHERE user_id = ?1 AND solved = 1",
        )
        .bind(user_id_to_i64(user_id)?)
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;

        let n: i64 = row.try_get("n").map_err(conn)?;
        u64::try_from(n).map_err(|_| StorageError::Serialization("negative count".into()))
    }

    async fn count_solved_by_user_and_level(
        &self,
        user_id: UserId,
        level: Level,
    ) -> Result<u64, StorageError> {
        let row = sqlx::query(
            r"
            SELECT COUNT(*) AS n FROM progress_records
            WHERE user_id = ?1 AND solved = 1 AND level = ?2
            ",
        )
        .bind(user_id_to_i64(user_id)?)
        .bind(level.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;

        let n: i64 = row.try_get("n").map_err(conn)?;
        u64::try_from(n).map_err(|_| StorageError::Serialization("negative count".into()))
    }

    async fn upsert(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO progress_records (user_id, question_id, level, solved, solved_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id, question_id) DO UPDATE SET
                level = excluded.level,
                solved = excluded.solved,
                solved_at = excluded.solved_at
            ",
        )
        .bind(user_id_to_i64(record.user_id())?)
        .bind(question_id_to_i64(record.question_id())?)
        .bind(record.level().as_str())
        .bind(record.solved())
        .bind(record.solved_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn delete_by_question(&self, question_id: QuestionId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM progress_records WHERE question_id = ?1")
            .bind(question_id_to_i64(question_id)?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        Ok(())
    }
}
