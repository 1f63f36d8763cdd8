//! Question DTOs for create, answer, status and read endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Question, QuestionId, QuestionStatus};

/// Request body for `POST /questions`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateQuestionRequest {
    /// Question text. Must contain a non-whitespace character.
    pub message: String,
}

/// Request body for `POST /questions/:id/answer`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AnswerQuestionRequest {
    /// Answer text. Must contain a non-whitespace character.
    pub answer: String,
}

/// Request body for `PATCH /questions/:id/status`.
///
/// `status` is kept as a raw string so unknown values produce the service's
/// own `invalid status` error rather than a deserialization rejection.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// One of `pending`, `escalated`, `answered`.
    pub status: String,
}

/// Question representation returned by every question endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionResponse {
    /// Question identifier.
    pub id: QuestionId,
    /// Question text.
    pub message: String,
    /// Current status.
    pub status: QuestionStatus,
    /// Operator answer, `null` until one is posted.
    pub answer: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<Question> for QuestionResponse {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            message: q.message,
            status: q.status,
            answer: q.answer,
            created_at: q.created_at,
            updated_at: q.updated_at,
        }
    }
}

/// Confirmation body returned after a deletion.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteQuestionResponse {
    /// Always `"Question deleted"`.
    pub message: String,
}

impl DeleteQuestionResponse {
    /// The one confirmation the API sends.
    #[must_use]
    pub fn deleted() -> Self {
        Self {
            message: "Question deleted".to_string(),
        }
    }
}
