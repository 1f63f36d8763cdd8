//! Database row models.

use chrono::{DateTime, Utc};

use crate::domain::{Question, QuestionId, QuestionStatus};
use crate::error::ServiceError;

/// Column list shared by every `SELECT` / `RETURNING` on `questions`.
pub const QUESTION_COLUMNS: &str = "id, message, status, answer, created_at, updated_at";

/// Raw tuple for a row of the `questions` table, in [`QUESTION_COLUMNS`] order.
pub type QuestionTuple = (
    i64,
    String,
    String,
    Option<String>,
    DateTime<Utc>,
    DateTime<Utc>,
);

/// A stored row from the `questions` table.
#[derive(Debug, Clone)]
pub struct QuestionRow {
    /// `BIGSERIAL` primary key.
    pub id: i64,
    /// Question text.
    pub message: String,
    /// Status column, one of the [`QuestionStatus`] wire values.
    pub status: String,
    /// Nullable answer.
    pub answer: Option<String>,
    /// Insert timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<QuestionTuple> for QuestionRow {
    fn from((id, message, status, answer, created_at, updated_at): QuestionTuple) -> Self {
        Self {
            id,
            message,
            status,
            answer,
            created_at,
            updated_at,
        }
    }
}

impl TryFrom<QuestionRow> for Question {
    type Error = ServiceError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let status: QuestionStatus = row.status.parse().map_err(|_| {
            ServiceError::PersistenceError(format!(
                "question {} has unknown status {:?}",
                row.id, row.status
            ))
        })?;
        Ok(Self {
            id: QuestionId::new(row.id),
            message: row.message,
            status,
            answer: row.answer,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
