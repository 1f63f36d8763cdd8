//! Question handlers: create, list, get, answer, status, delete.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};

use crate::api::dto::{
    AnswerQuestionRequest, CreateQuestionRequest, DeleteQuestionResponse, QuestionResponse,
    UpdateStatusRequest,
};
use crate::app_state::AppState;
use crate::auth::Operator;
use crate::domain::QuestionId;
use crate::error::{ErrorResponse, ServiceError};

/// `POST /questions`: Submit a new question.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidRequest`] for a blank message.
#[utoipa::path(
    post,
    path = "/api/v1/questions",
    tag = "Questions",
    summary = "Submit a question",
    description = "Creates a pending question and broadcasts a `new_question` event to every WebSocket client.",
    request_body = CreateQuestionRequest,
    responses(
        (status = 201, description = "Question created", body = QuestionResponse),
        (status = 400, description = "Blank message", body = ErrorResponse),
    )
)]
pub async fn create_question(
    State(state): State<AppState>,
    Json(req): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let question = state
        .question_service
        .create_question(&req.message)
        .await?;
    Ok((StatusCode::CREATED, Json(QuestionResponse::from(question))))
}

/// `GET /questions`: List questions, escalated first.
///
/// # Errors
///
/// Returns [`ServiceError`] on store failures.
#[utoipa::path(
    get,
    path = "/api/v1/questions",
    tag = "Questions",
    summary = "List questions",
    description = "Returns every question: escalated ones first, then newest first.",
    responses(
        (status = 200, description = "Question list", body = Vec<QuestionResponse>),
    )
)]
pub async fn list_questions(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let questions = state.question_service.list_questions().await?;
    let data: Vec<QuestionResponse> = questions.into_iter().map(QuestionResponse::from).collect();
    Ok(Json(data))
}

/// `GET /questions/{id}`: Get one question.
///
/// # Errors
///
/// Returns [`ServiceError::QuestionNotFound`] if the question does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/questions/{id}",
    tag = "Questions",
    summary = "Get a question",
    params(
        ("id" = i64, Path, description = "Question ID"),
    ),
    responses(
        (status = 200, description = "Question", body = QuestionResponse),
        (status = 404, description = "Question not found", body = ErrorResponse),
    )
)]
pub async fn get_question(
    State(state): State<AppState>,
    Path(id): Path<QuestionId>,
) -> Result<impl IntoResponse, ServiceError> {
    let question = state.question_service.get_question(id).await?;
    Ok(Json(QuestionResponse::from(question)))
}

/// `POST /questions/{id}/answer`: Post an answer.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidRequest`] for a blank answer or
/// [`ServiceError::QuestionNotFound`].
#[utoipa::path(
    post,
    path = "/api/v1/questions/{id}/answer",
    tag = "Questions",
    summary = "Answer a question",
    description = "Stores the answer and broadcasts a `question_answered` event.",
    params(
        ("id" = i64, Path, description = "Question ID"),
    ),
    request_body = AnswerQuestionRequest,
    responses(
        (status = 200, description = "Answer recorded", body = QuestionResponse),
        (status = 400, description = "Blank answer", body = ErrorResponse),
        (status = 404, description = "Question not found", body = ErrorResponse),
    )
)]
pub async fn answer_question(
    State(state): State<AppState>,
    Path(id): Path<QuestionId>,
    Json(req): Json<AnswerQuestionRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let question = state
        .question_service
        .answer_question(id, &req.answer)
        .await?;
    Ok(Json(QuestionResponse::from(question)))
}

/// `PATCH /questions/{id}/status`: Change status (operator only).
///
/// # Errors
///
/// Returns [`ServiceError::InvalidStatus`] for values outside the closed
/// set, [`ServiceError::QuestionNotFound`], or an auth error.
#[utoipa::path(
    patch,
    path = "/api/v1/questions/{id}/status",
    tag = "Questions",
    summary = "Change question status",
    description = "Operator only. Sets `pending`, `escalated` or `answered` and broadcasts a `status_updated` event.",
    params(
        ("id" = i64, Path, description = "Question ID"),
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = QuestionResponse),
        (status = 400, description = "Invalid status", body = ErrorResponse),
        (status = 401, description = "Missing or wrong operator token", body = ErrorResponse),
        (status = 403, description = "Operator access disabled", body = ErrorResponse),
        (status = 404, description = "Question not found", body = ErrorResponse),
    ),
    security(("operator_token" = []))
)]
pub async fn update_status(
    _operator: Operator,
    State(state): State<AppState>,
    Path(id): Path<QuestionId>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let question = state
        .question_service
        .update_status(id, &req.status)
        .await?;
    Ok(Json(QuestionResponse::from(question)))
}

/// `DELETE /questions/{id}`: Remove a question (operator only).
///
/// # Errors
///
/// Returns [`ServiceError::QuestionNotFound`] or an auth error.
#[utoipa::path(
    delete,
    path = "/api/v1/questions/{id}",
    tag = "Questions",
    summary = "Delete a question",
    description = "Operator only. No event is broadcast.",
    params(
        ("id" = i64, Path, description = "Question ID"),
    ),
    responses(
        (status = 200, description = "Question deleted", body = DeleteQuestionResponse),
        (status = 401, description = "Missing or wrong operator token", body = ErrorResponse),
        (status = 403, description = "Operator access disabled", body = ErrorResponse),
        (status = 404, description = "Question not found", body = ErrorResponse),
    ),
    security(("operator_token" = []))
)]
pub async fn delete_question(
    _operator: Operator,
    State(state): State<AppState>,
    Path(id): Path<QuestionId>,
) -> Result<impl IntoResponse, ServiceError> {
    state.question_service.delete_question(id).await?;
    Ok(Json(DeleteQuestionResponse::deleted()))
}

/// Question routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/questions", post(create_question).get(list_questions))
        .route("/questions/{id}", get(get_question).delete(delete_question))
        .route("/questions/{id}/answer", post(answer_question))
        .route("/questions/{id}/status", patch(update_status))
}
