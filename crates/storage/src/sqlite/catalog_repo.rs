use progress_core::model::{Category, CategoryId, Level, Question, QuestionId};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{category_id_to_i64, map_category_row, map_question_row, question_id_to_i64},
};
use crate::repository::{CatalogRepository, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl CatalogRepository for SqliteRepository {
    async fn all_categories(&self) -> Result<Vec<Category>, StorageError> {
        let rows = sqlx::query("SELECT id, name FROM categories ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_category_row).collect()
    }

    async fn all_questions(&self) -> Result<Vec<Question>, StorageError> {
        let rows =
            sqlx::query("SELECT id, category_id, title, level FROM questions ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(conn)?;

        rows.iter().map(map_question_row).collect()
    }

    async fn question_by_id(
        &self,
        question_id: QuestionId,
    ) -> Result<Option<Question>, StorageError> {
        let row = sqlx::query("SELECT id, category_id, title, level FROM questions WHERE id = ?1")
            .bind(question_id_to_i64(question_id)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_question_row).transpose()
    }

    async fn questions_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, category_id, title, level FROM questions
            WHERE category_id = ?1
            ORDER BY id ASC
            ",
        )
        .bind(category_id_to_i64(category_id)?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_question_row).collect()
    }

    async fn count_by_level(&self, level: Level) -> Result<u64, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM questions WHERE level = ?1")
            .bind(level.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(conn)?;

        let n: i64 = row.try_get("n").map_err(conn)?;
        u64::try_from(n).map_err(|_| StorageError::Serialization("negative count".into()))
    }

    async fn total_question_count(&self) -> Result<u64, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM questions")
            .fetch_one(&self.pool)
            .await
            .map_err(conn)?;

        let n: i64 = row.try_get("n").map_err(conn)?;
        u64::try_from(n).map_err(|_| StorageError::Serialization("negative count".into()))
    }

    async fn upsert_category(&self, category: &Category) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO categories (id, name)
            VALUES (?1, ?2)
            ON CONFLICT(id) DO UPDATE SET name = excluded.name
            ",
        )
        .bind(category_id_to_i64(category.id())?)
        .bind(category.name())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO questions (id, category_id, title, level)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                category_id = excluded.category_id,
                title = excluded.title,
                level = excluded.level
            ",
        )
        .bind(question_id_to_i64(question.id())?)
        .bind(category_id_to_i64(question.category_id())?)
        .bind(question.title())
        .bind(question.level().as_str())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn delete_question(&self, question_id: QuestionId) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM questions WHERE id = ?1")
            .bind(question_id_to_i64(question_id)?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
