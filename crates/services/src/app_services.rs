use std::sync::Arc;

use progress_core::Clock;
use storage::repository::Storage;

use crate::approach_service::ApproachCountService;
use crate::cache::{Cache, CacheConfig, CacheLayer, InMemoryCache};
use crate::catalog_service::CatalogService;
use crate::category_service::CategoryProgressService;
use crate::error::AppServicesError;
use crate::invalidation::CacheInvalidator;
use crate::progress_service::ProgressService;
use crate::question_service::QuestionListService;
use crate::stats_service::ProgressStatsService;

/// Assembles the progress services over a storage backend and a cache.
#[derive(Clone)]
pub struct AppServices {
    progress: Arc<ProgressService>,
    stats: Arc<ProgressStatsService>,
    categories: Arc<CategoryProgressService>,
    questions: Arc<QuestionListService>,
    catalog: Arc<CatalogService>,
    approach_counts: Arc<ApproachCountService>,
}

impl AppServices {
    /// Wire every service over the given collaborators.
    #[must_use]
    pub fn new(storage: &Storage, cache_backend: Arc<dyn Cache>, clock: Clock) -> Self {
        Self::with_cache_config(storage, cache_backend, clock, CacheConfig::default())
    }

    /// Like [`AppServices::new`] with explicit cache tuning.
    #[must_use]
    pub fn with_cache_config(
        storage: &Storage,
        cache_backend: Arc<dyn Cache>,
        clock: Clock,
        cache_config: CacheConfig,
    ) -> Self {
        let cache = CacheLayer::new(cache_backend).with_config(cache_config);
        let invalidator = Arc::new(CacheInvalidator::new(cache.clone()));

        let stats = Arc::new(ProgressStatsService::new(
            clock,
            Arc::clone(&storage.progress),
            Arc::clone(&storage.catalog),
        ));
        let approach_counts = Arc::new(ApproachCountService::new(Arc::clone(&storage.approaches)));
        let progress = Arc::new(ProgressService::new(
            clock,
            Arc::clone(&storage.progress),
            Arc::clone(&storage.catalog),
            cache.clone(),
            Arc::clone(&invalidator),
        ));
        let categories = Arc::new(CategoryProgressService::new(
            Arc::clone(&storage.progress),
            Arc::clone(&storage.catalog),
            cache.clone(),
        ));
        let questions = Arc::new(QuestionListService::new(
            Arc::clone(&storage.progress),
            Arc::clone(&storage.catalog),
            ApproachCountService::new(Arc::clone(&storage.approaches)),
            cache,
        ));
        let catalog = Arc::new(CatalogService::new(
            Arc::clone(&storage.catalog),
            Arc::clone(&storage.progress),
            invalidator,
        ));

        Self {
            progress,
            stats,
            categories,
            questions,
            catalog,
            approach_counts,
        }
    }

    /// Build services backed by `SQLite` storage and an in-process cache.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(&storage, Arc::new(InMemoryCache::new()), clock))
    }

    /// In-memory storage and cache, for tests and prototyping.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        let storage = Storage::in_memory();
        Self::new(&storage, Arc::new(InMemoryCache::new()), clock)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn stats(&self) -> Arc<ProgressStatsService> {
        Arc::clone(&self.stats)
    }

    #[must_use]
    pub fn categories(&self) -> Arc<CategoryProgressService> {
        Arc::clone(&self.categories)
    }

    #[must_use]
    pub fn questions(&self) -> Arc<QuestionListService> {
        Arc::clone(&self.questions)
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn approach_counts(&self) -> Arc<ApproachCountService> {
        Arc::clone(&self.approach_counts)
    }
}
