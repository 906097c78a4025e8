//! API error type that maps [`AgentError`] variants to HTTP status codes.

use agent_types::AgentError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Wrapper around [`AgentError`] that implements [`IntoResponse`].
///
/// The body is always `{"error": <message>}`. Only the variant's display text
/// is sent, so rejected callers learn nothing about why.
#[derive(Debug)]
pub struct ApiError(pub AgentError);

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            AgentError::MissingCredentials | AgentError::InvalidBody(_) => {
                StatusCode::BAD_REQUEST
            }
            AgentError::Unauthorized => StatusCode::UNAUTHORIZED,
            AgentError::Http(_) | AgentError::Upstream { .. } | AgentError::KeyFetch(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (status, Json(json!({"error": self.0.to_string()}))).into_response()
    }
}

impl From<AgentError> for ApiError {
    fn from(e: AgentError) -> Self {
        Self(e)
    }
}
