//! Proxy failures and their `{error, status}` response shape.
//!
//! Every failure in the dispatch handler is converted here, once. Upstream
//! application errors keep Mailchimp's status code; local rejections are 400;
//! everything else is 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mailchimp_core::{ProxyFailure, RouteError, UpstreamFailure};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Route(#[from] RouteError),

    /// The request body is not a valid envelope.
    #[error("Invalid request envelope: {0}")]
    Envelope(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamFailure),

    /// Mailchimp could not be reached or its body could not be read.
    #[error("{0}")]
    Transport(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Route(RouteError::SerializationError(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ProxyError::Route(_) | ProxyError::Envelope(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream(UpstreamFailure::Application { status, .. }) => {
                StatusCode::from_u16(*status)
                    .ok()
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ProxyError::Upstream(UpstreamFailure::UnexpectedResponse { .. })
            | ProxyError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        if matches!(self, ProxyError::Route(RouteError::InvalidEndpoint(_))) {
            return (status, Json(json!({ "error": "Invalid endpoint" }))).into_response();
        }
        let body = ProxyFailure {
            error: self.to_string(),
            status: Some(status.as_u16()),
        };
        (status, Json(body)).into_response()
    }
}
