use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// RepositoryError
///
/// Failures surfaced by the persistence layer. Database errors are carried
/// through untouched so the HTTP layer decides how much of them to expose.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The username given to an author lookup does not belong to any user.
    #[error("a user with username {0} does not exist")]
    UserNotFound(String),

    #[error("bookmark {0} does not exist")]
    BookmarkNotFound(Uuid),

    /// A write referenced an author id with no matching user.
    #[error("author {0} does not exist")]
    AuthorNotFound(Uuid),
}

/// ApiError
///
/// The error half of every fallible handler. Each variant maps onto exactly one
/// HTTP status and is rendered as `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The rejection used whenever a request carries no usable identity.
    pub fn not_logged_in() -> Self {
        ApiError::Forbidden("You must be logged in to complete this action.".to_string())
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::UserNotFound(username) => ApiError::NotFound(format!(
                "A user with username {} does not exist.",
                username
            )),
            RepositoryError::BookmarkNotFound(id) => ApiError::NotFound(format!(
                "Bookmark with bookmark ID {} does not exist.",
                id
            )),
            RepositoryError::AuthorNotFound(id) => {
                ApiError::NotFound(format!("A user with ID {} does not exist.", id))
            }
            RepositoryError::Database(e) => {
                // Logged here, never echoed to the client.
                tracing::error!("storage failure: {:?}", e);
                ApiError::Internal("An internal error occurred.".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
