//! End-to-end flows over in-memory storage and cache: write, invalidate,
//! re-read; list annotation; category breakdowns.

use std::sync::Arc;

use progress_core::model::{
    ApproachRecord, Category, CategoryId, Level, Question, QuestionId, UserId,
};
use progress_core::time::{fixed_clock, fixed_now};
use services::{AppServices, QuestionFilter};
use storage::repository::{ApproachRepository, CatalogRepository, ProgressRepository, Storage};

async fn seed_catalog(catalog: &Arc<dyn CatalogRepository>) {
    let arrays = Category::new(CategoryId::new(1), "Arrays").unwrap();
    let graphs = Category::new(CategoryId::new(2), "Graphs").unwrap();
    catalog.upsert_category(&arrays).await.unwrap();
    catalog.upsert_category(&graphs).await.unwrap();

    // Arrays: 5 easy, 3 medium, 2 hard. Graphs: 2 medium.
    let mut id = 1u64;
    for (count, level) in [(5, Level::Easy), (3, Level::Medium), (2, Level::Hard)] {
        for _ in 0..count {
            catalog
                .upsert_question(
                    &Question::new(QuestionId::new(id), arrays.id(), format!("A{id}"), level)
                        .unwrap(),
                )
                .await
                .unwrap();
            id += 1;
        }
    }
    for _ in 0..2 {
        catalog
            .upsert_question(
                &Question::new(QuestionId::new(id), graphs.id(), format!("G{id}"), Level::Medium)
                    .unwrap(),
            )
            .await
            .unwrap();
        id += 1;
    }
}

async fn setup() -> (Storage, AppServices) {
    let storage = Storage::in_memory();
    seed_catalog(&storage.catalog).await;
    let services = AppServices::new(
        &storage,
        Arc::new(services::InMemoryCache::new()),
        fixed_clock(),
    );
    (storage, services)
}

#[tokio::test]
async fn solve_flow_updates_stats_through_the_cache() {
    let (_storage, services) = setup().await;
    let user = UserId::new(1);
    let progress = services.progress();

    // Prime the cache with the empty snapshot.
    let empty = progress.bulk_progress(user).await.unwrap();
    assert_eq!(empty.stats.total_solved, 0);
    assert_eq!(empty.stats.total_questions, 12);
    assert_eq!(empty.stats.progress_percentage, 0.0);

    // 4 easy + 1 medium solved in Arrays.
    for q in 1..=4u64 {
        progress
            .update_progress(user, QuestionId::new(q), true)
            .await
            .unwrap();
    }
    progress
        .update_progress(user, QuestionId::new(6), true)
        .await
        .unwrap();

    // The write invalidated the snapshot; the next read recomputes.
    let snapshot = progress.bulk_progress(user).await.unwrap();
    assert_eq!(snapshot.stats.total_solved, 5);
    assert_eq!(snapshot.stats.solved_by_level.easy, 4);
    assert_eq!(snapshot.stats.solved_by_level.medium, 1);
    assert_eq!(snapshot.stats.streak_days, 1);

    // Standalone stats agree with the snapshot's embedded stats.
    let stats = services.stats().compute_stats(user).await.unwrap();
    assert_eq!(stats.total_solved, snapshot.stats.total_solved);
    assert_eq!(stats.solved_by_level, snapshot.stats.solved_by_level);
    assert_eq!(stats.progress_percentage, snapshot.stats.progress_percentage);
}

#[tokio::test]
async fn category_view_matches_the_worked_example() {
    let (_storage, services) = setup().await;
    let user = UserId::new(1);
    let progress = services.progress();

    // Category with 10 questions (5/3/2); user solves 4 easy and 1 medium.
    for q in 1..=4u64 {
        progress
            .update_progress(user, QuestionId::new(q), true)
            .await
            .unwrap();
    }
    progress
        .update_progress(user, QuestionId::new(6), true)
        .await
        .unwrap();

    let summaries = services
        .categories()
        .categories_with_progress(user)
        .await
        .unwrap();
    assert_eq!(summaries.len(), 2);

    let arrays = summaries.iter().find(|s| s.name == "Arrays").unwrap();
    assert_eq!(arrays.totals.total, 10);
    assert_eq!(arrays.user.solved, 5);
    assert_eq!(arrays.user.solved_by_level.easy, 4);
    assert_eq!(arrays.user.solved_by_level.medium, 1);
    assert_eq!(arrays.user.solved_by_level.hard, 0);
    assert_eq!(arrays.user.progress_percentage, 50.0);
}

#[tokio::test]
async fn category_view_is_invalidated_by_progress_writes() {
    let (_storage, services) = setup().await;
    let user = UserId::new(1);

    let before = services
        .categories()
        .categories_with_progress(user)
        .await
        .unwrap();
    assert_eq!(before[0].user.solved, 0);

    services
        .progress()
        .update_progress(user, QuestionId::new(1), true)
        .await
        .unwrap();

    let after = services
        .categories()
        .categories_with_progress(user)
        .await
        .unwrap();
    assert_eq!(after[0].user.solved, 1);
}

#[tokio::test]
async fn catalog_writes_invalidate_every_cached_view() {
    let (_storage, services) = setup().await;
    let user = UserId::new(1);

    let before = services.progress().bulk_progress(user).await.unwrap();
    assert_eq!(before.stats.total_questions, 12);

    // Admin adds a question; every user's totals change.
    services
        .catalog()
        .upsert_question(
            &Question::new(QuestionId::new(13), CategoryId::new(2), "G13", Level::Hard).unwrap(),
        )
        .await
        .unwrap();

    let after = services.progress().bulk_progress(user).await.unwrap();
    assert_eq!(after.stats.total_questions, 13);
}

#[tokio::test]
async fn question_delete_drops_progress_and_refreshes_views() {
    let (_storage, services) = setup().await;
    let user = UserId::new(1);
    let progress = services.progress();

    progress
        .update_progress(user, QuestionId::new(1), true)
        .await
        .unwrap();
    assert_eq!(progress.bulk_progress(user).await.unwrap().stats.total_solved, 1);

    services
        .catalog()
        .delete_question(QuestionId::new(1))
        .await
        .unwrap();

    let snapshot = progress.bulk_progress(user).await.unwrap();
    assert_eq!(snapshot.stats.total_solved, 0);
    assert_eq!(snapshot.stats.total_questions, 11);
    assert!(snapshot.progress.is_empty());
}

#[tokio::test]
async fn list_view_annotations_survive_cache_round_trips() {
    let (storage, services) = setup().await;
    let user = UserId::new(1);

    services
        .progress()
        .update_progress(user, QuestionId::new(2), true)
        .await
        .unwrap();
    for _ in 0..3 {
        storage
            .approaches
            .insert(&ApproachRecord::new(user, QuestionId::new(2), 512, fixed_now()))
            .await
            .unwrap();
    }

    let filter = QuestionFilter {
        category: Some(CategoryId::new(1)),
        ..QuestionFilter::default()
    };

    let computed = services
        .questions()
        .questions_with_progress(user, &filter)
        .await
        .unwrap();
    let cached = services
        .questions()
        .questions_with_progress(user, &filter)
        .await
        .unwrap();
    assert_eq!(computed, cached);

    assert_eq!(computed.total, 10);
    let q2 = computed
        .items
        .iter()
        .find(|item| item.question.id() == QuestionId::new(2))
        .unwrap();
    assert!(q2.solved);
    assert_eq!(q2.approach_count, 3);
}

#[tokio::test]
async fn bulk_counts_sum_matches_individual_counts() {
    let (storage, services) = setup().await;
    let user = UserId::new(1);

    for q in [1u64, 1, 2, 3, 3, 3] {
        storage
            .approaches
            .insert(&ApproachRecord::new(user, QuestionId::new(q), 64, fixed_now()))
            .await
            .unwrap();
    }

    let ids: Vec<QuestionId> = (1..=4u64).map(QuestionId::new).collect();
    let bulk = services.approach_counts().bulk_counts(user, &ids).await;
    assert_eq!(bulk.len(), ids.len());

    let mut individual_sum = 0;
    for id in &ids {
        individual_sum += storage
            .approaches
            .count_by_user_and_question(user, *id)
            .await
            .unwrap();
    }
    assert_eq!(bulk.values().sum::<u64>(), individual_sum);
}

#[tokio::test]
async fn own_write_is_visible_to_a_direct_read() {
    let (_storage, services) = setup().await;
    let user = UserId::new(1);
    let progress = services.progress();

    // Cache a stale solved flag first.
    assert!(!progress
        .is_question_solved(user, QuestionId::new(1))
        .await
        .unwrap());

    progress
        .update_progress(user, QuestionId::new(1), true)
        .await
        .unwrap();

    // Direct read bypasses the cache entirely.
    let record = progress
        .progress_for_question(user, QuestionId::new(1))
        .await
        .unwrap()
        .expect("record exists");
    assert!(record.solved());

    // And the point cache was evicted by the write.
    assert!(progress
        .is_question_solved(user, QuestionId::new(1))
        .await
        .unwrap());
}

#[tokio::test]
async fn concurrent_updates_never_leave_a_half_state() {
    let (storage, services) = setup().await;
    let user = UserId::new(1);
    let q = QuestionId::new(1);

    let mut handles = Vec::new();
    for i in 0..8u32 {
        let progress = services.progress();
        handles.push(tokio::spawn(async move {
            progress.update_progress(user, q, i % 2 == 0).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let record = storage
        .progress
        .find_by_user_and_question(user, q)
        .await
        .unwrap()
        .expect("record exists");
    // Whatever interleaving won, the invariant holds.
    assert_eq!(record.solved(), record.solved_at().is_some());
}
