mod approach;
mod catalog;
mod ids;
mod level;
mod progress;
pub mod stats;

pub use approach::ApproachRecord;
pub use catalog::{Category, CategoryError, Question, QuestionError};
pub use ids::{ApproachId, CategoryId, QuestionId, UserId};
pub use level::{Level, LevelParseError};
pub use progress::{ProgressError, ProgressRecord};

pub use stats::{
    BulkProgressSnapshot, CategorySummary, LevelBreakdown, ProgressEntry, ProgressStats,
    QuestionTotals, UserCategoryProgress,
};
