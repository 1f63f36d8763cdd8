//! In-memory question store.
//!
//! Questions live in a [`BTreeMap`] behind a [`tokio::sync::RwLock`].
//! Reads run concurrently; writes are serialized. Contents are lost on
//! restart.

use std::collections::BTreeMap;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::{Question, QuestionId, QuestionStatus};
use crate::error::ServiceError;

#[derive(Debug, Default)]
struct Table {
    last_id: i64,
    rows: BTreeMap<QuestionId, Question>,
}

/// Process-local question store.
#[derive(Debug, Default)]
pub struct MemoryQuestionStore {
    table: RwLock<Table>,
}

impl MemoryQuestionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new `pending` question and returns it.
    pub async fn insert(&self, message: &str) -> Question {
        let mut table = self.table.write().await;
        table.last_id = table.last_id.saturating_add(1);
        let question = Question::new(QuestionId::new(table.last_id), message.to_string());
        table.rows.insert(question.id, question.clone());
        question
    }

    /// Returns a copy of the question.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::QuestionNotFound`] if no such question exists.
    pub async fn get(&self, id: QuestionId) -> Result<Question, ServiceError> {
        self.table
            .read()
            .await
            .rows
            .get(&id)
            .cloned()
            .ok_or(ServiceError::QuestionNotFound(id))
    }

    /// Returns every question, newest first.
    pub async fn list(&self) -> Vec<Question> {
        let table = self.table.read().await;
        let mut questions: Vec<Question> = table.rows.values().cloned().collect();
        questions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        questions
    }

    /// Records an answer and returns the updated question.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::QuestionNotFound`] if no such question exists.
    pub async fn set_answer(&self, id: QuestionId, answer: &str) -> Result<Question, ServiceError> {
        self.update(id, |q| q.answer = Some(answer.to_string()))
            .await
    }

    /// Changes the status and returns the updated question.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::QuestionNotFound`] if no such question exists.
    pub async fn set_status(
        &self,
        id: QuestionId,
        status: QuestionStatus,
    ) -> Result<Question, ServiceError> {
        self.update(id, |q| q.status = status).await
    }

    /// Deletes a question.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::QuestionNotFound`] if no such question exists.
    pub async fn delete(&self, id: QuestionId) -> Result<(), ServiceError> {
        self.table
            .write()
            .await
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(ServiceError::QuestionNotFound(id))
    }

    async fn update(
        &self,
        id: QuestionId,
        apply: impl FnOnce(&mut Question),
    ) -> Result<Question, ServiceError> {
        let mut table = self.table.write().await;
        let question = table
            .rows
            .get_mut(&id)
            .ok_or(ServiceError::QuestionNotFound(id))?;
        apply(question);
        question.updated_at = Utc::now();
        Ok(question.clone())
    }
}
