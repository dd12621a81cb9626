#![forbid(unsafe_code)]

pub mod app_services;
pub mod approach_service;
pub mod cache;
pub mod catalog_service;
pub mod category_service;
pub mod error;
pub mod invalidation;
pub mod progress_service;
pub mod question_service;
pub mod stats_service;

pub use progress_core::Clock;

pub use app_services::AppServices;
pub use approach_service::ApproachCountService;
pub use cache::{Cache, CacheConfig, CacheError, CacheLayer, InMemoryCache};
pub use catalog_service::CatalogService;
pub use category_service::CategoryProgressService;
pub use error::{
    AppServicesError, CatalogServiceError, CategoryProgressError, ProgressServiceError,
    QuestionListError, StatsError,
};
pub use invalidation::CacheInvalidator;
pub use progress_service::ProgressService;
pub use question_service::{AnnotatedQuestion, QuestionFilter, QuestionListService, QuestionPage};
pub use stats_service::ProgressStatsService;
