//! Error types for the proxy client and the dispatch table.
//!
//! # Design
//! `RouteError` covers everything decided locally before an upstream call is
//! made. `UpstreamFailure` covers what comes back from Mailchimp. `ApiError`
//! is what client actions return; proxy-reported failures carry the proxy's
//! message verbatim so callers can surface it directly.

use thiserror::Error;

/// Rejections produced while mapping an envelope to an upstream request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The endpoint tag is not in the dispatch table.
    #[error("Invalid endpoint")]
    InvalidEndpoint(String),

    /// The endpoint is known but does not accept this envelope method.
    #[error("Method {method} is not supported for {endpoint}")]
    UnsupportedMethod { endpoint: String, method: String },

    /// A body field the route needs is absent, null or empty.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A body field is present but cannot be used as given.
    #[error("Invalid value for field: {0}")]
    InvalidField(&'static str),

    /// The envelope body does not have the shape the route expects.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// The data-center segment of the API key is not a plain hostname label.
    #[error("Invalid data center in API key")]
    InvalidDataCenter,

    #[error("serialization failed: {0}")]
    SerializationError(String),
}

/// Failures reported by the upstream service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamFailure {
    /// JSON error object with a non-success status.
    #[error("Mailchimp API error: {detail}")]
    Application { status: u16, detail: String },

    /// Anything that is not JSON (or is JSON that does not parse).
    #[error("Unexpected response: {body}")]
    UnexpectedResponse { status: u16, body: String },
}

/// Errors returned by `ProxyClient` parse methods and `MailchimpActions`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The proxy answered with a non-2xx status.
    #[error("{message}")]
    Proxy { status: u16, message: String },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}

impl ApiError {
    /// HTTP status reported by the proxy, if the failure came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Proxy { status, .. } => Some(*status),
            _ => None,
        }
    }
}
