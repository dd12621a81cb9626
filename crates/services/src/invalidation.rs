//! Write-side cache eviction.
//!
//! Every write path that can change an input to the progress computations
//! calls exactly one of the two entry points here after the store write has
//! succeeded. Persist first, evict second: the reverse order would let a
//! reader repopulate the cache with the pre-write value.

use tracing::debug;

use progress_core::model::UserId;

use crate::cache::{CacheLayer, keys};

/// Maps writes to the cache entries they invalidate.
#[derive(Clone)]
pub struct CacheInvalidator {
    cache: CacheLayer,
}

impl CacheInvalidator {
    #[must_use]
    pub fn new(cache: CacheLayer) -> Self {
        Self { cache }
    }

    /// A progress record for `user_id` was written.
    ///
    /// Drops the user's bulk snapshot, category listing, solved-flag point
    /// entries, and cached question-list pages. Other users' entries are
    /// untouched; their derived views do not depend on this user's progress.
    pub async fn on_progress_write(&self, user_id: UserId) {
        debug!(%user_id, "evicting cached progress views after progress write");
        self.cache.evict(&keys::bulk_progress(user_id)).await;
        self.cache.evict(&keys::category_progress(user_id)).await;
        self.cache
            .evict_prefix(&keys::question_solved_prefix(user_id))
            .await;
        self.cache
            .evict_prefix(&keys::question_list_prefix(user_id))
            .await;
    }

    /// A category or question was created, updated, or deleted.
    ///
    /// Catalog shape changes every user's derived view, so this drops the
    /// category, question-list, and bulk-snapshot namespaces wholesale
    /// (snapshots embed catalog totals). Catalog writes are admin-rare, so
    /// the broad eviction costs little compared to tracking per-user keys.
    pub async fn on_catalog_write(&self) {
        debug!("evicting all cached derived views after catalog write");
        self.cache.evict_prefix(keys::CATEGORY_NS).await;
        self.cache.evict_prefix(keys::QUESTION_LIST_NS).await;
        self.cache.evict_prefix(keys::BULK_NS).await;
        self.cache.evict_prefix(keys::SOLVED_NS).await;
    }
}
