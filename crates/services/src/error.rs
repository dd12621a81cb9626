//! Shared error types for the services crate.
//!
//! Only failures in paths of record appear here. Cache errors and grouped
//! aggregation failures are absorbed where they occur (logged, degraded),
//! so no service error variant carries them.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error("question not found")]
    QuestionNotFound,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProgressStatsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CategoryProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CategoryProgressError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuestionListService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionListError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogServiceError {
    #[error("question not found")]
    QuestionNotFound,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
