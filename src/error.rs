//! Error taxonomy.
//!
//! [`ProviderError`] describes the outcome of a single call to the track provider and
//! keeps the auth failure explicit so the resilient wrapper can recover from it.
//! [`Error`] is what pipeline, scheduler and API surface to their callers; it renders
//! as a `{message, error}` body with a matching status code.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure of one provider call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The access token was rejected (HTTP 401). Recoverable once by refreshing.
    #[error("access token rejected by provider")]
    Unauthorized,

    /// Rate limited with a wait longer than we are willing to sleep.
    #[error("rate limited by provider, retry after {0}s")]
    RateLimited(u64),

    #[error("provider responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("listing incomplete, pages at offsets {0:?} could not be read")]
    IncompleteListing(Vec<u32>),

    #[error("credential refresh failed: {0}")]
    Refresh(String),

    /// The refreshed token was rejected as well.
    #[error("access token still rejected after refresh")]
    CredentialRejected,
}

impl ProviderError {
    /// True for the recoverable expired-credential signal.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ProviderError::Unauthorized)
    }

    /// True when retrying the same call cannot help.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ProviderError::CredentialRejected | ProviderError::Refresh(_)
        )
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed invocation payload or module definition.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Missing or invalid authorization header.
    #[error("unauthorized: {0}")]
    Auth(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Provider call that could not be recovered.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Timer facility unreachable or rejecting requests.
    #[error("scheduling backend error: {0}")]
    SchedulingBackend(String),

    #[error("storage error: {0}")]
    Store(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl Error {
    /// Stable machine readable name of the error category.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "ValidationError",
            Error::Auth(_) => "AuthError",
            Error::NotFound(_) => "NotFoundError",
            Error::Provider(_) => "FatalProviderError",
            Error::SchedulingBackend(_) => "SchedulingBackendError",
            Error::Store(_) | Error::Io(_) | Error::Serde(_) => "StorageError",
            Error::Config(_) => "ConfigurationError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Auth(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Provider(_) => StatusCode::BAD_GATEWAY,
            Error::SchedulingBackend(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Store(_) | Error::Io(_) | Error::Serde(_) | Error::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "message": self.to_string(),
            "error": self.kind(),
        }));

        (self.status(), body).into_response()
    }
}
