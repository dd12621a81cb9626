use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use progress_core::model::{
    ApproachId, ApproachRecord, Category, CategoryId, Level, ProgressRecord, Question, QuestionId,
    UserId,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    /// The grouped-count query path failed. Services recover from this via
    /// the per-question fallback; it never reaches a caller.
    #[error("aggregation error: {0}")]
    Aggregation(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for per-user progress records.
///
/// Identity of a record is the `(user, question)` pair; `upsert` keys on it.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch every progress record for a user, solved or not.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<ProgressRecord>, StorageError>;

    /// Fetch a single record; `Ok(None)` when the pair has no record yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn find_by_user_and_question(
        &self,
        user_id: UserId,
        question_id: QuestionId,
    ) -> Result<Option<ProgressRecord>, StorageError>;

    /// Fetch only the user's solved records.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn find_solved_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ProgressRecord>, StorageError>;

    /// Count the user's solved records.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn count_solved_by_user(&self, user_id: UserId) -> Result<u64, StorageError>;

    /// Count the user's solved records at one difficulty level.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn count_solved_by_user_and_level(
        &self,
        user_id: UserId,
        level: Level,
    ) -> Result<u64, StorageError>;

    /// Insert or update a record, keyed on `(user, question)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn upsert(&self, record: &ProgressRecord) -> Result<(), StorageError>;

    /// Drop all records for a question (cascade when the question is deleted).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the delete fails.
    async fn delete_by_question(&self, question_id: QuestionId) -> Result<(), StorageError>;
}

/// Repository contract for submitted-approach records.
#[async_trait]
pub trait ApproachRepository: Send + Sync {
    /// Per-question approach counts for one user, as a single grouped query.
    ///
    /// Only questions with at least one approach appear in the result;
    /// callers are responsible for zero-filling the rest.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Aggregation` when the grouped path fails;
    /// callers should fall back to `count_by_user_and_question`.
    async fn grouped_counts(
        &self,
        user_id: UserId,
        question_ids: &[QuestionId],
    ) -> Result<Vec<(QuestionId, u64)>, StorageError>;

    /// Count approaches for a single `(user, question)` pair.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn count_by_user_and_question(
        &self,
        user_id: UserId,
        question_id: QuestionId,
    ) -> Result<u64, StorageError>;

    /// Persist a new approach record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn insert(&self, record: &ApproachRecord) -> Result<(), StorageError>;
}

/// Read (and minimal write) access to the question/category catalog.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// All categories, ordered by name ascending.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn all_categories(&self) -> Result<Vec<Category>, StorageError>;

    /// Every question in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn all_questions(&self) -> Result<Vec<Question>, StorageError>;

    /// Fetch one question; `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn question_by_id(&self, question_id: QuestionId)
    -> Result<Option<Question>, StorageError>;

    /// Questions belonging to one category.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn questions_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Question>, StorageError>;

    /// Number of questions at one difficulty level.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn count_by_level(&self, level: Level) -> Result<u64, StorageError>;

    /// Total number of questions in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn total_question_count(&self) -> Result<u64, StorageError>;

    /// Insert or update a category.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    async fn upsert_category(&self, category: &Category) -> Result<(), StorageError>;

    /// Insert or update a question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError>;

    /// Delete a question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the question does not exist.
    async fn delete_question(&self, question_id: QuestionId) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY BACKEND ─────────────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<HashMap<(UserId, QuestionId), ProgressRecord>>>,
    approaches: Arc<Mutex<HashMap<ApproachId, ApproachRecord>>>,
    categories: Arc<Mutex<HashMap<CategoryId, Category>>>,
    questions: Arc<Mutex<HashMap<QuestionId, Question>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock<T>(m: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>, StorageError> {
        m.lock().map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<ProgressRecord>, StorageError> {
        let guard = Self::lock(&self.progress)?;
        Ok(guard
            .values()
            .filter(|r| r.user_id() == user_id)
            .cloned()
            .collect())
    }

    async fn find_by_user_and_question(
        &self,
        user_id: UserId,
        question_id: QuestionId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let guard = Self::lock(&self.progress)?;
        Ok(guard.get(&(user_id, question_id)).cloned())
    }

    async fn find_solved_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let guard = Self::lock(&self.progress)?;
        Ok(guard
            .values()
            .filter(|r| r.user_id() == user_id && r.solved())
            .cloned()
            .collect())
    }

    async fn count_solved_by_user(&self, user_id: UserId) -> Result<u64, StorageError> {
        let guard = Self::lock(&self.progress)?;
        Ok(guard
            .values()
            .filter(|r| r.user_id() == user_id && r.solved())
            .count() as u64)
    }

    async fn count_solved_by_user_and_level(
        &self,
        user_id: UserId,
        level: Level,
    ) -> Result<u64, StorageError> {
        let guard = Self::lock(&self.progress)?;
        Ok(guard
            .values()
            .filter(|r| r.user_id() == user_id && r.solved() && r.level() == level)
            .count() as u64)
    }

    async fn upsert(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.progress)?;
        guard.insert((record.user_id(), record.question_id()), record.clone());
        Ok(())
    }

    async fn delete_by_question(&self, question_id: QuestionId) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.progress)?;
        guard.retain(|(_, q), _| *q != question_id);
        Ok(())
    }
}

#[async_trait]
impl ApproachRepository for InMemoryRepository {
    async fn grouped_counts(
        &self,
        user_id: UserId,
        question_ids: &[QuestionId],
    ) -> Result<Vec<(QuestionId, u64)>, StorageError> {
        let guard = Self::lock(&self.approaches)?;
        let wanted: std::collections::HashSet<QuestionId> = question_ids.iter().copied().collect();
        let mut counts: HashMap<QuestionId, u64> = HashMap::new();
        for rec in guard.values() {
            if rec.user_id() == user_id && wanted.contains(&rec.question_id()) {
                *counts.entry(rec.question_id()).or_insert(0) += 1;
            }
        }
        Ok(counts.into_iter().collect())
    }

    async fn count_by_user_and_question(
        &self,
        user_id: UserId,
        question_id: QuestionId,
    ) -> Result<u64, StorageError> {
        let guard = Self::lock(&self.approaches)?;
        Ok(guard
            .values()
            .filter(|r| r.user_id() == user_id && r.question_id() == question_id)
            .count() as u64)
    }

    async fn insert(&self, record: &ApproachRecord) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.approaches)?;
        if guard.contains_key(&record.id()) {
            return Err(StorageError::Conflict);
        }
        guard.insert(record.id(), record.clone());
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for InMemoryRepository {
    async fn all_categories(&self) -> Result<Vec<Category>, StorageError> {
        let guard = Self::lock(&self.categories)?;
        let mut cats: Vec<Category> = guard.values().cloned().collect();
        cats.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(cats)
    }

    async fn all_questions(&self) -> Result<Vec<Question>, StorageError> {
        let guard = Self::lock(&self.questions)?;
        let mut questions: Vec<Question> = guard.values().cloned().collect();
        questions.sort_by_key(Question::id);
        Ok(questions)
    }

    async fn question_by_id(
        &self,
        question_id: QuestionId,
    ) -> Result<Option<Question>, StorageError> {
        let guard = Self::lock(&self.questions)?;
        Ok(guard.get(&question_id).cloned())
    }

    async fn questions_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Question>, StorageError> {
        let guard = Self::lock(&self.questions)?;
        let mut questions: Vec<Question> = guard
            .values()
            .filter(|q| q.category_id() == category_id)
            .cloned()
            .collect();
        questions.sort_by_key(Question::id);
        Ok(questions)
    }

    async fn count_by_level(&self, level: Level) -> Result<u64, StorageError> {
        let guard = Self::lock(&self.questions)?;
        Ok(guard.values().filter(|q| q.level() == level).count() as u64)
    }

    async fn total_question_count(&self) -> Result<u64, StorageError> {
        let guard = Self::lock(&self.questions)?;
        Ok(guard.len() as u64)
    }

    async fn upsert_category(&self, category: &Category) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.categories)?;
        guard.insert(category.id(), category.clone());
        Ok(())
    }

    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.questions)?;
        guard.insert(question.id(), question.clone());
        Ok(())
    }

    async fn delete_question(&self, question_id: QuestionId) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.questions)?;
        guard.remove(&question_id).ok_or(StorageError::NotFound)?;
        Ok(())
    }
}

//
// ─── STORAGE AGGREGATE ─────────────────────────────────────────────────────────
//

/// Aggregates the three repositories behind trait objects for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
    pub approaches: Arc<dyn ApproachRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let approaches: Arc<dyn ApproachRepository> = Arc::new(repo.clone());
        let catalog: Arc<dyn CatalogRepository> = Arc::new(repo);
        Self {
            progress,
            approaches,
            catalog,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
