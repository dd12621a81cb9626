use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use progress_core::model::{CategoryId, Level, Question, QuestionId, UserId};
use storage::repository::{CatalogRepository, ProgressRepository};

use crate::approach_service::ApproachCountService;
use crate::cache::{CacheLayer, keys};
use crate::error::QuestionListError;

/// Filter and pagination for question list views. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionFilter {
    pub category: Option<CategoryId>,
    pub level: Option<Level>,
    pub solved: Option<bool>,
    pub page: u32,
    pub per_page: u32,
}

impl Default for QuestionFilter {
    fn default() -> Self {
        Self {
            category: None,
            level: None,
            solved: None,
            page: 1,
            per_page: 20,
        }
    }
}

impl QuestionFilter {
    /// Stable key fragment so each distinct filter caches separately.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let category = self
            .category
            .map_or_else(|| "-".to_string(), |c| c.to_string());
        let level = self.level.map_or("-", |l| l.as_str());
        let solved = match self.solved {
            Some(true) => "y",
            Some(false) => "n",
            None => "-",
        };
        format!(
            "c{category}:l{level}:s{solved}:p{}:n{}",
            self.page, self.per_page
        )
    }
}

/// One question annotated with the requesting user's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedQuestion {
    pub question: Question,
    pub solved: bool,
    pub approach_count: u64,
}

/// A page of annotated questions. `total` counts all matches, not just the
/// returned page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionPage {
    pub items: Vec<AnnotatedQuestion>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

/// Question list views annotated with per-item solved flags and approach
/// counts.
///
/// Annotation never goes one query per row: the user's progress comes from
/// a single fetch joined by id in memory, and approach counts come from the
/// grouped bulk path, scoped to the page being returned.
#[derive(Clone)]
pub struct QuestionListService {
    progress: Arc<dyn ProgressRepository>,
    catalog: Arc<dyn CatalogRepository>,
    approach_counts: ApproachCountService,
    cache: CacheLayer,
}

impl QuestionListService {
    #[must_use]
    pub fn new(
        progress: Arc<dyn ProgressRepository>,
        catalog: Arc<dyn CatalogRepository>,
        approach_counts: ApproachCountService,
        cache: CacheLayer,
    ) -> Self {
        Self {
            progress,
            catalog,
            approach_counts,
            cache,
        }
    }

    /// One page of questions matching `filter`, annotated for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionListError::Storage` if the catalog or progress read
    /// fails. A failed approach-count aggregation does not fail the page;
    /// it degrades inside [`ApproachCountService`].
    pub async fn questions_with_progress(
        &self,
        user_id: UserId,
        filter: &QuestionFilter,
    ) -> Result<QuestionPage, QuestionListError> {
        let key = keys::question_list(user_id, &filter.cache_key());
        if let Some(page) = self.cache.get_json::<QuestionPage>(&key).await {
            debug!(%user_id, "question list served from cache");
            return Ok(page);
        }

        let (questions, records) = tokio::join!(
            self.catalog.all_questions(),
            self.progress.find_by_user(user_id),
        );
        let questions = questions?;

        let solved_by_question: HashMap<QuestionId, bool> = records?
            .iter()
            .map(|r| (r.question_id(), r.solved()))
            .collect();

        let matching: Vec<(Question, bool)> = questions
            .into_iter()
            .filter(|q| filter.category.is_none_or(|c| q.category_id() == c))
            .filter(|q| filter.level.is_none_or(|l| q.level() == l))
            .map(|q| {
                let solved = solved_by_question.get(&q.id()).copied().unwrap_or(false);
                (q, solved)
            })
            .filter(|(_, solved)| filter.solved.is_none_or(|wanted| *solved == wanted))
            .collect();

        let total = matching.len() as u64;
        let per_page = filter.per_page.max(1);
        let offset = (filter.page.max(1) - 1) as usize * per_page as usize;

        let page_items: Vec<(Question, bool)> = matching
            .into_iter()
            .skip(offset)
            .take(per_page as usize)
            .collect();

        // Approach counts only for the rows actually shipped.
        let page_ids: Vec<QuestionId> = page_items.iter().map(|(q, _)| q.id()).collect();
        let counts = self.approach_counts.bulk_counts(user_id, &page_ids).await;

        let items = page_items
            .into_iter()
            .map(|(question, solved)| {
                let approach_count = counts.get(&question.id()).copied().unwrap_or(0);
                AnnotatedQuestion {
                    question,
                    solved,
                    approach_count,
                }
            })
            .collect();

        let page = QuestionPage {
            items,
            total,
            page: filter.page.max(1),
            per_page,
        };
        self.cache.put_json(&key, &page).await;
        Ok(page)
    }
}
