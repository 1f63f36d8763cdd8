//! OpenAPI document for the REST surface.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::dto::{
    AnswerQuestionRequest, CreateQuestionRequest, DeleteQuestionResponse, QuestionResponse,
    UpdateStatusRequest,
};
use super::handlers::{question, system};
use crate::domain::{QuestionId, QuestionStatus};
use crate::error::{ErrorBody, ErrorResponse};

/// Generated OpenAPI specification.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "askdesk",
        description = "Question/answer API. Live updates are pushed over the `/ws` WebSocket as `{type, data}` JSON frames."
    ),
    paths(
        question::create_question,
        question::list_questions,
        question::get_question,
        question::answer_question,
        question::update_status,
        question::delete_question,
        system::root_handler,
        system::health_handler,
    ),
    components(schemas(
        CreateQuestionRequest,
        AnswerQuestionRequest,
        UpdateStatusRequest,
        QuestionResponse,
        DeleteQuestionResponse,
        QuestionId,
        QuestionStatus,
        ErrorResponse,
        ErrorBody,
        system::HealthResponse,
        system::RootResponse,
    )),
    modifiers(&OperatorSecurity),
    tags(
        (name = "Questions", description = "Question lifecycle"),
        (name = "System", description = "Service metadata"),
    )
)]
pub struct ApiDoc;

/// Registers the `operator_token` bearer scheme referenced by operator routes.
#[derive(Debug)]
struct OperatorSecurity;

impl Modify for OperatorSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "operator_token",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
