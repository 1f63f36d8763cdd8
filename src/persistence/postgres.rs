//! PostgreSQL implementation of the question store.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::models::{QUESTION_COLUMNS, QuestionRow, QuestionTuple};
use crate::config::ServiceConfig;
use crate::domain::{Question, QuestionId, QuestionStatus};
use crate::error::ServiceError;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS questions (\
     id BIGSERIAL PRIMARY KEY, \
     message TEXT NOT NULL, \
     status VARCHAR(20) NOT NULL DEFAULT 'pending', \
     answer TEXT, \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())";

/// PostgreSQL-backed question store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresQuestionStore {
    pool: PgPool,
}

impl PostgresQuestionStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects using the pool settings in `config` and ensures the schema.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError::PersistenceError`] if the connection or the
    /// schema setup fails.
    pub async fn connect(database_url: &str, config: &ServiceConfig) -> Result<Self, ServiceError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(database_url)
            .await?;
        let store = Self::new(pool);
        store.init_schema().await?;
        Ok(store)
    }

    /// Creates the `questions` table if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError::PersistenceError`] on database failure.
    pub async fn init_schema(&self) -> Result<(), ServiceError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    /// Inserts a new `pending` question and returns the committed row.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError::PersistenceError`] on database failure.
    pub async fn insert(&self, message: &str) -> Result<Question, ServiceError> {
        let sql = format!(
            "INSERT INTO questions (message, status) VALUES ($1, $2) RETURNING {QUESTION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, QuestionTuple>(&sql)
            .bind(message)
            .bind(QuestionStatus::Pending.as_str())
            .fetch_one(&self.pool)
            .await?;
        QuestionRow::from(row).try_into()
    }

    /// Loads one question.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::QuestionNotFound`] if absent, or a
    /// [`ServiceError::PersistenceError`] on database failure.
    pub async fn get(&self, id: QuestionId) -> Result<Question, ServiceError> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1");
        let row = sqlx::query_as::<_, QuestionTuple>(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::QuestionNotFound(id))?;
        QuestionRow::from(row).try_into()
    }

    /// Loads every question, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError::PersistenceError`] on database failure.
    pub async fn list(&self) -> Result<Vec<Question>, ServiceError> {
        let sql =
            format!("SELECT {QUESTION_COLUMNS} FROM questions ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query_as::<_, QuestionTuple>(&sql)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| Question::try_from(QuestionRow::from(row)))
            .collect()
    }

    /// Records an answer and returns the committed row.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::QuestionNotFound`] if absent, or a
    /// [`ServiceError::PersistenceError`] on database failure.
    pub async fn set_answer(&self, id: QuestionId, answer: &str) -> Result<Question, ServiceError> {
        let sql = format!(
            "UPDATE questions SET answer = $2, updated_at = now() WHERE id = $1 \
             RETURNING {QUESTION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, QuestionTuple>(&sql)
            .bind(id.get())
            .bind(answer)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::QuestionNotFound(id))?;
        QuestionRow::from(row).try_into()
    }

    /// Changes the status and returns the committed row.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::QuestionNotFound`] if absent, or a
    /// [`ServiceError::PersistenceError`] on database failure.
    pub async fn set_status(
        &self,
        id: QuestionId,
        status: QuestionStatus,
    ) -> Result<Question, ServiceError> {
        let sql = format!(
            "UPDATE questions SET status = $2, updated_at = now() WHERE id = $1 \
             RETURNING {QUESTION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, QuestionTuple>(&sql)
            .bind(id.get())
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::QuestionNotFound(id))?;
        QuestionRow::from(row).try_into()
    }

    /// Deletes a question.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::QuestionNotFound`] if absent, or a
    /// [`ServiceError::PersistenceError`] on database failure.
    pub async fn delete(&self, id: QuestionId) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::QuestionNotFound(id));
        }
        Ok(())
    }
}
