//! Domain events reflecting question state mutations.
//!
//! Every committed change emits a [`QuestionEvent`] through the
//! [`crate::ws::BroadcastHub`]. Events are never stored.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Question, QuestionId, QuestionStatus};

/// Domain event emitted after every committed question mutation.
///
/// Serializes as `{"type": "<event type>", "data": {...}}`. Each variant
/// carries the full fields clients need to reconcile idempotently, so
/// events racing from different handlers may arrive in either order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum QuestionEvent {
    /// A question was created.
    NewQuestion {
        /// Question identifier.
        id: QuestionId,
        /// Question text.
        message: String,
        /// Status at creation (always `pending` today).
        status: QuestionStatus,
        /// Creation timestamp, ISO-8601.
        created_at: DateTime<Utc>,
    },

    /// An answer was recorded.
    QuestionAnswered {
        /// Question identifier.
        id: QuestionId,
        /// Answer text.
        answer: String,
    },

    /// The status changed.
    StatusUpdated {
        /// Question identifier.
        id: QuestionId,
        /// New status.
        status: QuestionStatus,
    },
}

impl QuestionEvent {
    /// Builds a `new_question` event from a freshly inserted question.
    #[must_use]
    pub fn new_question(question: &Question) -> Self {
        Self::NewQuestion {
            id: question.id,
            message: question.message.clone(),
            status: question.status,
            created_at: question.created_at,
        }
    }

    /// Builds a `question_answered` event, or `None` if no answer is set.
    #[must_use]
    pub fn question_answered(question: &Question) -> Option<Self> {
        question.answer.as_ref().map(|answer| Self::QuestionAnswered {
            id: question.id,
            answer: answer.clone(),
        })
    }

    /// Builds a `status_updated` event from the committed question.
    #[must_use]
    pub fn status_updated(question: &Question) -> Self {
        Self::StatusUpdated {
            id: question.id,
            status: question.status,
        }
    }

    /// Returns the question ID associated with this event.
    #[must_use]
    pub const fn question_id(&self) -> QuestionId {
        match self {
            Self::NewQuestion { id, .. }
            | Self::QuestionAnswered { id, .. }
            | Self::StatusUpdated { id, .. } => *id,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::NewQuestion { .. } => "new_question",
            Self::QuestionAnswered { .. } => "question_answered",
            Self::StatusUpdated { .. } => "status_updated",
        }
    }
}
