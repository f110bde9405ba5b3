//! Error types
//!
//! `CheckError` is what the webhook handler sees. Remote failures are carried
//! inside it as `GitHubApiError` so the transport detail survives into the log
//! line and the response body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Failures talking to the GitHub REST API
#[derive(Debug, Error)]
pub enum GitHubApiError {
    /// Could not obtain an installation token
    #[error("GitHub authentication failed: {0}")]
    Auth(String),

    /// Request never produced a response
    #[error("request to GitHub failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// GitHub answered with a non-success status
    #[error("GitHub API error ({status}): {body}")]
    Status { status: u16, body: String },

    /// Response body did not match the expected shape
    #[error("unexpected GitHub response: {0}")]
    Decode(String),
}

/// Errors surfaced by the normalizer and the decision engine
#[derive(Debug, Error)]
pub enum CheckError {
    /// The incoming payload cannot be turned into a check request
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// Looking up existing check runs failed
    #[error("failed to list checks: {0}")]
    CheckListingFailed(#[source] GitHubApiError),

    /// Writing the check run failed
    #[error("check creation failed: {0}")]
    CheckCreationFailed(#[source] GitHubApiError),
}

impl CheckError {
    pub fn malformed(message: impl Into<String>) -> Self {
        CheckError::MalformedEvent(message.into())
    }

    /// HTTP status reported back to the webhook sender
    pub fn status_code(&self) -> StatusCode {
        match self {
            CheckError::MalformedEvent(_) => StatusCode::BAD_REQUEST,
            CheckError::CheckListingFailed(_) | CheckError::CheckCreationFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for CheckError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

/// Errors loading GitHub App credentials or signing the app JWT
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to read private key {path}: {source}")]
    KeyRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse private key as RSA PEM: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),

    #[error("failed to encode JWT: {0}")]
    Jwt(#[source] jsonwebtoken::errors::Error),

    #[error("system clock is before the Unix epoch")]
    Clock,
}

impl From<AuthError> for GitHubApiError {
    fn from(err: AuthError) -> Self {
        GitHubApiError::Auth(err.to_string())
    }
}
