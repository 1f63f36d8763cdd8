//! Operator authorization.
//!
//! Operator routes (status changes, deletions) require
//! `Authorization: Bearer <OPERATOR_TOKEN>`. User accounts and token
//! issuance live outside this service; the [`Operator`] extractor is the
//! only seam.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::app_state::AppState;
use crate::error::ServiceError;

/// Verifies operator bearer tokens against the configured secret.
#[derive(Clone)]
pub struct OperatorAuth {
    token: Option<String>,
}

impl std::fmt::Debug for OperatorAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorAuth")
            .field("enabled", &self.token.is_some())
            .finish()
    }
}

impl OperatorAuth {
    /// Creates a verifier. `None` disables operator routes entirely.
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    /// Returns `true` if an operator token is configured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    /// Checks the value of an `Authorization` header.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] when operator routes are
    /// disabled and [`ServiceError::Unauthorized`] when the header is
    /// missing, malformed or carries the wrong token.
    pub fn verify(&self, authorization: Option<&str>) -> Result<Operator, ServiceError> {
        let Some(expected) = self.token.as_deref() else {
            return Err(ServiceError::Forbidden(
                "operator access is not configured".to_string(),
            ));
        };
        let presented = authorization
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or(ServiceError::Unauthorized)?;
        if constant_time_eq(presented.as_bytes(), expected.as_bytes()) {
            Ok(Operator)
        } else {
            Err(ServiceError::Unauthorized)
        }
    }
}

/// Proof that the request carried valid operator credentials.
#[derive(Debug, Clone, Copy)]
pub struct Operator;

impl FromRequestParts<AppState> for Operator {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        state.operator_auth.verify(header)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
