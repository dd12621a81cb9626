use progress_core::model::{
    Category, CategoryId, Level, ProgressRecord, Question, QuestionId, UserId,
};
use sqlx::Row;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

pub(crate) fn category_id_from_i64(v: i64) -> Result<CategoryId, StorageError> {
    Ok(CategoryId::new(i64_to_u64("category_id", v)?))
}

pub(crate) fn user_id_to_i64(id: UserId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("user_id overflow".into()))
}

pub(crate) fn question_id_to_i64(id: QuestionId) -> Result<i64, StorageError> {
    i64::try_from(id.value())
        .map_err(|_| StorageError::Serialization("question_id overflow".into()))
}

pub(crate) fn category_id_to_i64(id: CategoryId) -> Result<i64, StorageError> {
    i64::try_from(id.value())
        .map_err(|_| StorageError::Serialization("category_id overflow".into()))
}

pub(crate) fn parse_level(s: &str) -> Result<Level, StorageError> {
    s.parse::<Level>().map_err(ser)
}

pub(crate) fn map_progress_row(row: &sqlx::sqlite::SqliteRow) -> Result<ProgressRecord, StorageError> {
    let level_str: String = row.try_get("level").map_err(ser)?;
    let solved: bool = row.try_get("solved").map_err(ser)?;

    ProgressRecord::from_persisted(
        user_id_from_i64(row.try_get("user_id").map_err(ser)?)?,
        question_id_from_i64(row.try_get("question_id").map_err(ser)?)?,
        parse_level(&level_str)?,
        solved,
        row.try_get("solved_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let level_str: String = row.try_get("level").map_err(ser)?;

    Question::new(
        question_id_from_i64(row.try_get("id").map_err(ser)?)?,
        category_id_from_i64(row.try_get("category_id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        parse_level(&level_str)?,
    )
    .map_err(ser)
}

pub(crate) fn map_category_row(row: &sqlx::sqlite::SqliteRow) -> Result<Category, StorageError> {
    Category::new(
        category_id_from_i64(row.try_get("id").map_err(ser)?)?,
        row.try_get::<String, _>("name").map_err(ser)?,
    )
    .map_err(ser)
}
