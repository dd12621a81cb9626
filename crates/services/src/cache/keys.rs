//! Composite cache keys.
//!
//! Keys are structured as `namespace:userId[:extra]` so that logical groups
//! ("everything for user X", "every category view") can be dropped with one
//! prefix delete instead of enumerating composite variants.

use progress_core::model::{QuestionId, UserId};

/// Namespace holding one bulk progress snapshot per user.
pub const BULK_NS: &str = "progress:bulk:";

/// Namespace holding one category-progress listing per user.
pub const CATEGORY_NS: &str = "progress:categories:";

/// Namespace holding per-question solved-flag point entries.
pub const SOLVED_NS: &str = "progress:solved:";

/// Namespace holding annotated question-list pages.
pub const QUESTION_LIST_NS: &str = "questions:list:";

#[must_use]
pub fn bulk_progress(user_id: UserId) -> String {
    format!("{BULK_NS}{user_id}")
}

#[must_use]
pub fn category_progress(user_id: UserId) -> String {
    format!("{CATEGORY_NS}{user_id}")
}

#[must_use]
pub fn question_solved(user_id: UserId, question_id: QuestionId) -> String {
    format!("{SOLVED_NS}{user_id}:{question_id}")
}

/// Prefix covering every solved-flag entry for one user.
#[must_use]
pub fn question_solved_prefix(user_id: UserId) -> String {
    format!("{SOLVED_NS}{user_id}:")
}

#[must_use]
pub fn question_list(user_id: UserId, filter_key: &str) -> String {
    format!("{QUESTION_LIST_NS}{user_id}:{filter_key}")
}

/// Prefix covering every cached question-list page for one user.
#[must_use]
pub fn question_list_prefix(user_id: UserId) -> String {
    format!("{QUESTION_LIST_NS}{user_id}:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_keys_sit_under_their_prefix() {
        let user = UserId::new(42);
        let key = question_solved(user, QuestionId::new(7));
        assert!(key.starts_with(&question_solved_prefix(user)));

        let list = question_list(user, "c-:l-:s-:p1:n20");
        assert!(list.starts_with(&question_list_prefix(user)));
    }

    #[test]
    fn namespaces_do_not_collide() {
        let user = UserId::new(1);
        let keys = [
            bulk_progress(user),
            category_progress(user),
            question_solved(user, QuestionId::new(1)),
            question_list(user, "x"),
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in keys.iter().skip(i + 1) {
                assert_ne!(a, b);
                assert!(!a.starts_with(b.as_str()) && !b.starts_with(a.as_str()));
            }
        }
    }
}
