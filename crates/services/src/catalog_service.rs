use std::sync::Arc;

use progress_core::model::{Category, Question, QuestionId};
use storage::repository::{CatalogRepository, ProgressRepository, StorageError};

use crate::error::CatalogServiceError;
use crate::invalidation::CacheInvalidator;

/// Catalog writes, wired to cache invalidation.
///
/// Catalog editing proper lives outside this subsystem; this service exists
/// so that the few writes that do happen (admin upserts and deletes) evict
/// every derived view before reporting success.
#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogRepository>,
    progress: Arc<dyn ProgressRepository>,
    invalidator: Arc<CacheInvalidator>,
}

impl CatalogService {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        progress: Arc<dyn ProgressRepository>,
        invalidator: Arc<CacheInvalidator>,
    ) -> Self {
        Self {
            catalog,
            progress,
            invalidator,
        }
    }

    /// Create or update a category, then evict derived views.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Storage` if the write fails.
    pub async fn upsert_category(&self, category: &Category) -> Result<(), CatalogServiceError> {
        self.catalog.upsert_category(category).await?;
        self.invalidator.on_catalog_write().await;
        Ok(())
    }

    /// Create or update a question, then evict derived views.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Storage` if the write fails.
    pub async fn upsert_question(&self, question: &Question) -> Result<(), CatalogServiceError> {
        self.catalog.upsert_question(question).await?;
        self.invalidator.on_catalog_write().await;
        Ok(())
    }

    /// Delete a question, cascading its progress records, then evict.
    ///
    /// The explicit progress cascade keeps backends without foreign-key
    /// enforcement consistent; on SQLite it is a no-op after the FK cascade.
    ///
    /// # Errors
    ///
    /// Returns `QuestionNotFound` if the question does not exist, or
    /// `Storage` for other persistence failures.
    pub async fn delete_question(&self, question_id: QuestionId) -> Result<(), CatalogServiceError> {
        match self.catalog.delete_question(question_id).await {
            Ok(()) => {}
            Err(StorageError::NotFound) => return Err(CatalogServiceError::QuestionNotFound),
            Err(err) => return Err(err.into()),
        }
        self.progress.delete_by_question(question_id).await?;
        self.invalidator.on_catalog_write().await;
        Ok(())
    }
}
