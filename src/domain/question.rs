//! Question record and its status enumeration.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::QuestionId;
use crate::error::ServiceError;

/// Lifecycle status of a question.
///
/// Closed set: anything else is rejected by [`QuestionStatus::from_str`]
/// before a store mutation or event is attempted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStatus {
    /// Waiting for an operator.
    #[default]
    Pending,
    /// Flagged for priority handling; listed first.
    Escalated,
    /// Closed out by an operator.
    Answered,
}

impl QuestionStatus {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Escalated => "escalated",
            Self::Answered => "answered",
        }
    }
}

impl fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionStatus {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "escalated" => Ok(Self::Escalated),
            "answered" => Ok(Self::Answered),
            other => Err(ServiceError::InvalidStatus(other.to_string())),
        }
    }
}

/// A question as committed to the store.
///
/// Values of this type are only ever produced by a store operation, so an
/// event built from one always reflects committed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Question {
    /// Store-assigned identifier.
    pub id: QuestionId,
    /// Question text as submitted.
    pub message: String,
    /// Current status.
    pub status: QuestionStatus,
    /// Operator answer, if one has been posted.
    pub answer: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last mutation.
    pub updated_at: DateTime<Utc>,
}

impl Question {
    /// Creates a fresh `pending` question with both timestamps set to now.
    #[must_use]
    pub fn new(id: QuestionId, message: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            message,
            status: QuestionStatus::Pending,
            answer: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Orders questions for display: escalated first, then newest first.
pub fn sort_for_display(questions: &mut [Question]) {
    questions.sort_by(|a, b| {
        let a_escalated = a.status == QuestionStatus::Escalated;
        let b_escalated = b.status == QuestionStatus::Escalated;
        b_escalated
            .cmp(&a_escalated)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| b.id.cmp(&a.id))
    });
}
