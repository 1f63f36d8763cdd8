//! Question service: orchestrates question mutations and emits events.

use std::sync::Arc;

use crate::domain::question::sort_for_display;
use crate::domain::{Question, QuestionEvent, QuestionId, QuestionStatus};
use crate::error::ServiceError;
use crate::persistence::QuestionStore;
use crate::ws::BroadcastHub;

/// Orchestration layer for all question operations.
///
/// Every mutation follows the same pattern: validate → commit to the store →
/// build the event from the committed question → broadcast → return. A
/// failed validation or store call returns before any event exists, and the
/// broadcast itself cannot fail.
#[derive(Debug, Clone)]
pub struct QuestionService {
    store: Arc<QuestionStore>,
    hub: Arc<BroadcastHub>,
}

impl QuestionService {
    /// Creates a new `QuestionService`.
    #[must_use]
    pub fn new(store: Arc<QuestionStore>, hub: Arc<BroadcastHub>) -> Self {
        Self { store, hub }
    }

    /// Returns a reference to the broadcast hub.
    #[must_use]
    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    /// Returns a reference to the question store.
    #[must_use]
    pub fn store(&self) -> &Arc<QuestionStore> {
        &self.store
    }

    /// Creates a question and broadcasts `new_question`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidRequest`] for a blank message, or a
    /// store error.
    pub async fn create_question(&self, message: &str) -> Result<Question, ServiceError> {
        if message.trim().is_empty() {
            return Err(ServiceError::InvalidRequest(
                "question cannot be empty".to_string(),
            ));
        }

        let question = self.store.insert(message).await?;
        self.hub
            .broadcast(&QuestionEvent::new_question(&question))
            .await;

        tracing::info!(question_id = %question.id, "question created");
        Ok(question)
    }

    /// Records an answer and broadcasts `question_answered`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidRequest`] for a blank answer,
    /// [`ServiceError::QuestionNotFound`], or a store error.
    pub async fn answer_question(
        &self,
        id: QuestionId,
        answer: &str,
    ) -> Result<Question, ServiceError> {
        if answer.trim().is_empty() {
            return Err(ServiceError::InvalidRequest(
                "answer cannot be empty".to_string(),
            ));
        }

        let question = self.store.set_answer(id, answer).await?;
        let event = QuestionEvent::question_answered(&question).ok_or_else(|| {
            ServiceError::Internal(format!("question {id} has no answer after commit"))
        })?;
        self.hub.broadcast(&event).await;

        tracing::info!(question_id = %id, "question answered");
        Ok(question)
    }

    /// Changes a question's status and broadcasts `status_updated`.
    ///
    /// `status` is validated before the store is touched, so an unknown
    /// value never produces an event.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidStatus`],
    /// [`ServiceError::QuestionNotFound`], or a store error.
    pub async fn update_status(
        &self,
        id: QuestionId,
        status: &str,
    ) -> Result<Question, ServiceError> {
        let status: QuestionStatus = status.parse()?;

        let question = self.store.set_status(id, status).await?;
        self.hub
            .broadcast(&QuestionEvent::status_updated(&question))
            .await;

        tracing::info!(question_id = %id, %status, "question status updated");
        Ok(question)
    }

    /// Deletes a question. No event is emitted.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::QuestionNotFound`] or a store error.
    pub async fn delete_question(&self, id: QuestionId) -> Result<(), ServiceError> {
        self.store.delete(id).await?;
        tracing::info!(question_id = %id, "question deleted");
        Ok(())
    }

    /// Returns one question.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::QuestionNotFound`] or a store error.
    pub async fn get_question(&self, id: QuestionId) -> Result<Question, ServiceError> {
        self.store.get(id).await
    }

    /// Returns all questions, escalated first, then newest first.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub async fn list_questions(&self) -> Result<Vec<Question>, ServiceError> {
        let mut questions = self.store.list().await?;
        sort_for_display(&mut questions);
        Ok(questions)
    }
}
