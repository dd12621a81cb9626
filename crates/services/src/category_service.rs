use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use progress_core::model::stats::percentage;
use progress_core::model::{
    CategoryId, CategorySummary, LevelBreakdown, QuestionId, QuestionTotals, UserCategoryProgress,
    UserId,
};
use storage::repository::{CatalogRepository, ProgressRepository};

use crate::cache::{CacheLayer, keys};
use crate::error::CategoryProgressError;

/// Per-category progress listings.
///
/// The join runs over exactly three fetches (categories, questions, the
/// user's solved records) regardless of how many categories exist; each
/// category is then resolved against in-memory indexes. The per-category
/// loop never issues a query.
#[derive(Clone)]
pub struct CategoryProgressService {
    progress: Arc<dyn ProgressRepository>,
    catalog: Arc<dyn CatalogRepository>,
    cache: CacheLayer,
}

impl CategoryProgressService {
    #[must_use]
    pub fn new(
        progress: Arc<dyn ProgressRepository>,
        catalog: Arc<dyn CatalogRepository>,
        cache: CacheLayer,
    ) -> Self {
        Self {
            progress,
            catalog,
            cache,
        }
    }

    /// Every category with its question totals and the user's progress,
    /// ordered by category name ascending.
    ///
    /// # Errors
    ///
    /// Returns `CategoryProgressError::Storage` if a store read fails; cache
    /// failures degrade to a direct computation.
    pub async fn categories_with_progress(
        &self,
        user_id: UserId,
    ) -> Result<Vec<CategorySummary>, CategoryProgressError> {
        let key = keys::category_progress(user_id);
        if let Some(summaries) = self.cache.get_json::<Vec<CategorySummary>>(&key).await {
            debug!(%user_id, "category progress served from cache");
            return Ok(summaries);
        }

        // The three inputs are independent; fetch them concurrently and
        // join in memory.
        let (categories, questions, solved_records) = tokio::join!(
            self.catalog.all_categories(),
            self.catalog.all_questions(),
            self.progress.find_solved_by_user(user_id),
        );
        let categories = categories?;
        let questions = questions?;

        let solved_ids: HashSet<QuestionId> = solved_records?
            .iter()
            .map(|r| r.question_id())
            .collect();

        let mut by_category: HashMap<CategoryId, (QuestionTotals, LevelBreakdown)> =
            HashMap::with_capacity(categories.len());
        for question in &questions {
            let (totals, solved_by_level) = by_category.entry(question.category_id()).or_default();
            totals.total += 1;
            totals.by_level.bump(question.level());
            if solved_ids.contains(&question.id()) {
                solved_by_level.bump(question.level());
            }
        }

        let summaries: Vec<CategorySummary> = categories
            .into_iter()
            .map(|category| {
                let (totals, solved_by_level) =
                    by_category.get(&category.id()).copied().unwrap_or_default();
                let solved = solved_by_level.total();
                CategorySummary {
                    category_id: category.id(),
                    name: category.name().to_owned(),
                    totals,
                    user: UserCategoryProgress {
                        solved,
                        solved_by_level,
                        progress_percentage: percentage(solved, totals.total),
                    },
                }
            })
            .collect();

        self.cache.put_json(&key, &summaries).await;
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use progress_core::model::{Category, Level, ProgressRecord, Question};
    use progress_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    use crate::cache::{Cache, InMemoryCache};

    async fn seed(repo: &InMemoryRepository) {
        let arrays = Category::new(CategoryId::new(1), "Arrays").unwrap();
        let graphs = Category::new(CategoryId::new(2), "Graphs").unwrap();
        let empty = Category::new(CategoryId::new(3), "Bit Tricks").unwrap();
        for cat in [&arrays, &graphs, &empty] {
            repo.upsert_category(cat).await.unwrap();
        }

        // Arrays: 5 easy, 3 medium, 2 hard.
        let mut id = 1u64;
        for (count, level) in [(5, Level::Easy), (3, Level::Medium), (2, Level::Hard)] {
            for _ in 0..count {
                repo.upsert_question(
                    &Question::new(QuestionId::new(id), arrays.id(), format!("A{id}"), level)
                        .unwrap(),
                )
                .await
                .unwrap();
                id += 1;
            }
        }

        // Graphs: 2 hard.
        for _ in 0..2 {
            repo.upsert_question(
                &Question::new(QuestionId::new(id), graphs.id(), format!("G{id}"), Level::Hard)
                    .unwrap(),
            )
            .await
            .unwrap();
            id += 1;
        }
    }

    async fn solve(repo: &InMemoryRepository, user: UserId, q: u64, level: Level) {
        let mut rec = ProgressRecord::new(user, QuestionId::new(q), level);
        rec.mark_solved(fixed_now());
        repo.upsert(&rec).await.unwrap();
    }

    fn service(repo: &InMemoryRepository, backend: Arc<InMemoryCache>) -> CategoryProgressService {
        CategoryProgressService::new(
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            CacheLayer::new(backend as Arc<dyn Cache>),
        )
    }

    #[tokio::test]
    async fn joins_totals_and_user_progress_per_category() {
        let repo = InMemoryRepository::new();
        seed(&repo).await;
        let user = UserId::new(1);

        // 4 easy + 1 medium solved in Arrays.
        for q in 1..=4 {
            solve(&repo, user, q, Level::Easy).await;
        }
        solve(&repo, user, 6, Level::Medium).await;

        let service = service(&repo, Arc::new(InMemoryCache::new()));
        let summaries = service.categories_with_progress(user).await.unwrap();

        let names: Vec<&str> = summaries.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Arrays", "Bit Tricks", "Graphs"]);

        let arrays = &summaries[0];
        assert_eq!(arrays.totals.total, 10);
        assert_eq!(
            arrays.totals.by_level,
            LevelBreakdown {
                easy: 5,
                medium: 3,
                hard: 2
            }
        );
        assert_eq!(arrays.user.solved, 5);
        assert_eq!(
            arrays.user.solved_by_level,
            LevelBreakdown {
                easy: 4,
                medium: 1,
                hard: 0
            }
        );
        assert_eq!(arrays.user.progress_percentage, 50.0);
    }

    #[tokio::test]
    async fn empty_category_has_zero_percentage() {
        let repo = InMemoryRepository::new();
        seed(&repo).await;

        let service = service(&repo, Arc::new(InMemoryCache::new()));
        let summaries = service
            .categories_with_progress(UserId::new(1))
            .await
            .unwrap();

        let bit_tricks = summaries.iter().find(|s| s.name == "Bit Tricks").unwrap();
        assert_eq!(bit_tricks.totals.total, 0);
        assert_eq!(bit_tricks.user.progress_percentage, 0.0);
    }

    #[tokio::test]
    async fn second_read_comes_from_the_cache() {
        let repo = InMemoryRepository::new();
        seed(&repo).await;
        let user = UserId::new(1);
        let backend = Arc::new(InMemoryCache::new());

        let service = service(&repo, Arc::clone(&backend));
        let first = service.categories_with_progress(user).await.unwrap();

        // Mutate the store behind the cache's back: the cached listing is
        // served until something invalidates it.
        solve(&repo, user, 1, Level::Easy).await;
        let second = service.categories_with_progress(user).await.unwrap();
        assert_eq!(first, second);

        backend
            .delete(&keys::category_progress(user))
            .await
            .unwrap();
        let third = service.categories_with_progress(user).await.unwrap();
        assert_ne!(first, third);
    }
}
