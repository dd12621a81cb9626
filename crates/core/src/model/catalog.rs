use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{CategoryId, QuestionId};
use crate::model::level::Level;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CategoryError {
    #[error("category name cannot be empty")]
    EmptyName,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question title cannot be empty")]
    EmptyTitle,
}

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

/// A grouping of questions (e.g. "Arrays", "Dynamic Programming").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    id: CategoryId,
    name: String,
}

impl Category {
    /// Create a category with a validated, trimmed name.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::EmptyName` if the name is blank.
    pub fn new(id: CategoryId, name: impl Into<String>) -> Result<Self, CategoryError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(CategoryError::EmptyName);
        }
        Ok(Self { id, name })
    }

    #[must_use]
    pub fn id(&self) -> CategoryId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// One exercise in the catalog. Belongs to exactly one category and carries
/// one difficulty level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    category_id: CategoryId,
    title: String,
    level: Level,
}

impl Question {
    /// Create a question with a validated, trimmed title.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyTitle` if the title is blank.
    pub fn new(
        id: QuestionId,
        category_id: CategoryId,
        title: impl Into<String>,
        level: Level,
    ) -> Result<Self, QuestionError> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(QuestionError::EmptyTitle);
        }
        Ok(Self {
            id,
            category_id,
            title,
            level,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn category_id(&self) -> CategoryId {
        self.category_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_rejects_blank_name() {
        let err = Category::new(CategoryId::new(1), "   ").unwrap_err();
        assert_eq!(err, CategoryError::EmptyName);
    }

    #[test]
    fn category_trims_name() {
        let cat = Category::new(CategoryId::new(1), " Arrays ").unwrap();
        assert_eq!(cat.name(), "Arrays");
    }

    #[test]
    fn question_rejects_blank_title() {
        let err =
            Question::new(QuestionId::new(1), CategoryId::new(1), "", Level::Easy).unwrap_err();
        assert_eq!(err, QuestionError::EmptyTitle);
    }

    #[test]
    fn question_keeps_level_and_category() {
        let q = Question::new(
            QuestionId::new(7),
            CategoryId::new(3),
            "Two Sum",
            Level::Medium,
        )
        .unwrap();
        assert_eq!(q.level(), Level::Medium);
        assert_eq!(q.category_id(), CategoryId::new(3));
    }
}
