//! Persistence layer: the question store behind the service.
//!
//! [`QuestionStore`] dispatches to an in-memory map or to PostgreSQL via
//! `sqlx::PgPool`. Every mutating method returns the committed
//! [`Question`], which is what events are built from.

pub mod memory;
pub mod models;
pub mod postgres;

pub use memory::MemoryQuestionStore;
pub use postgres::PostgresQuestionStore;

use crate::config::ServiceConfig;
use crate::domain::{Question, QuestionId, QuestionStatus};
use crate::error::ServiceError;

/// Question storage backend.
#[derive(Debug)]
pub enum QuestionStore {
    /// Process-local store; contents vanish on restart.
    Memory(MemoryQuestionStore),
    /// PostgreSQL store.
    Postgres(PostgresQuestionStore),
}

impl QuestionStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::Memory(MemoryQuestionStore::new())
    }

    /// Picks the backend from configuration.
    ///
    /// PostgreSQL is used when persistence is enabled and `DATABASE_URL` is
    /// set; otherwise the in-memory store.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError::PersistenceError`] if PostgreSQL is
    /// selected but unreachable.
    pub async fn from_config(config: &ServiceConfig) -> Result<Self, ServiceError> {
        match config.database_url.as_deref() {
            Some(url) if config.persistence_enabled => {
                let store = PostgresQuestionStore::connect(url, config).await?;
                tracing::info!("using postgres question store");
                Ok(Self::Postgres(store))
            }
            _ => {
                tracing::info!("using in-memory question store");
                Ok(Self::in_memory())
            }
        }
    }

    /// Returns the backend name for logs and health output.
    #[must_use]
    pub const fn backend(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Postgres(_) => "postgres",
        }
    }

    /// Inserts a new `pending` question.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError::PersistenceError`] on database failure.
    pub async fn insert(&self, message: &str) -> Result<Question, ServiceError> {
        match self {
            Self::Memory(store) => Ok(store.insert(message).await),
            Self::Postgres(store) => store.insert(message).await,
        }
    }

    /// Loads one question.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::QuestionNotFound`] if absent.
    pub async fn get(&self, id: QuestionId) -> Result<Question, ServiceError> {
        match self {
            Self::Memory(store) => store.get(id).await,
            Self::Postgres(store) => store.get(id).await,
        }
    }

    /// Loads every question, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError::PersistenceError`] on database failure.
    pub async fn list(&self) -> Result<Vec<Question>, ServiceError> {
        match self {
            Self::Memory(store) => Ok(store.list().await),
            Self::Postgres(store) => store.list().await,
        }
    }

    /// Records an answer.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::QuestionNotFound`] if absent.
    pub async fn set_answer(&self, id: QuestionId, answer: &str) -> Result<Question, ServiceError> {
        match self {
            Self::Memory(store) => store.set_answer(id, answer).await,
            Self::Postgres(store) => store.set_answer(id, answer).await,
        }
    }

    /// Changes the status.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::QuestionNotFound`] if absent.
    pub async fn set_status(
        &self,
        id: QuestionId,
        status: QuestionStatus,
    ) -> Result<Question, ServiceError> {
        match self {
            Self::Memory(store) => store.set_status(id, status).await,
            Self::Postgres(store) => store.set_status(id, status).await,
        }
    }

    /// Deletes a question.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::QuestionNotFound`] if absent.
    pub async fn delete(&self, id: QuestionId) -> Result<(), ServiceError> {
        match self {
            Self::Memory(store) => store.delete(id).await,
            Self::Postgres(store) => store.delete(id).await,
        }
    }
}
