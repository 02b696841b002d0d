//! Error types and HTTP error response handling.
//!
//! Every handler returns `Result<T, AppError>`; the variants below decide the
//! status code and the JSON body the storefront receives.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use validator::ValidationErrors;

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Validation**: malformed input (400)
/// - **Authentication**: missing/invalid credentials or tokens (401)
/// - **Authorization**: role not in the route's allow-list (403)
/// - **Resources**: entity not found (404) or conflicting with stored data (409)
/// - **Password reset**: OTP and reset-token failures (400/429)
/// - **Internal**: database or crypto failures (500, details hidden)
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed. The message is never sent to clients.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Request failed schema validation; one message per offending field.
    #[error("Validation failed")]
    Validation(Vec<String>),

    #[error("{0}")]
    InvalidRequest(String),

    /// No bearer token on a protected route.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Bearer token is malformed, expired or has a bad signature.
    #[error("Invalid token")]
    InvalidToken,

    #[error("Forbidden")]
    Forbidden,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    /// Any other missing entity; carries the entity name ("Category", "Product").
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Username already taken")]
    DuplicateUsername,

    /// Unique constraint violated on a non-user entity.
    #[error("{0}")]
    Conflict(String),

    /// Referential integrity prevented the write.
    #[error("{0}")]
    ForeignKeyConflict(String),

    /// Account deletion refused (SuperAdmin target or self-deletion).
    #[error("{0}")]
    ProtectedAccount(String),

    #[error("Invalid or expired OTP")]
    InvalidOrExpiredOtp,

    #[error("Invalid OTP")]
    InvalidOtp,

    #[error("Too many attempts. Request a new OTP.")]
    TooManyAttempts,

    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    /// Hashing, signing or other non-database failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Login reports an unknown email and a wrong password the same way
    /// on the wire so the response never reveals which one was wrong.
    pub fn conceal_login_failure(self) -> Self {
        match self {
            AppError::UserNotFound => AppError::InvalidCredentials,
            other => other,
        }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            AppError::NotAuthenticated => (StatusCode::UNAUTHORIZED, "not_authenticated"),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "user_not_found"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::DuplicateEmail => (StatusCode::CONFLICT, "duplicate_email"),
            AppError::DuplicateUsername => (StatusCode::CONFLICT, "duplicate_username"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::ForeignKeyConflict(_) => (StatusCode::CONFLICT, "FK_CONSTRAINT"),
            AppError::ProtectedAccount(_) => (StatusCode::BAD_REQUEST, "protected_account"),
            AppError::InvalidOrExpiredOtp => (StatusCode::BAD_REQUEST, "invalid_or_expired_otp"),
            AppError::InvalidOtp => (StatusCode::BAD_REQUEST, "invalid_otp"),
            AppError::TooManyAttempts => (StatusCode::TOO_MANY_REQUESTS, "too_many_attempts"),
            AppError::InvalidOrExpiredToken => {
                (StatusCode::BAD_REQUEST, "invalid_or_expired_token")
            }
            AppError::Database(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        }
    }
}

/// JSON error body: `{"error": "...", "code": "...", "details": [...]}`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<String>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let body = match self {
            AppError::Validation(details) => ErrorBody {
                error: "Validation failed".to_string(),
                code,
                details: Some(details),
            },
            AppError::Database(ref e) => {
                tracing::error!(error = %e, "database error");
                ErrorBody {
                    error: "An internal error occurred".to_string(),
                    code,
                    details: None,
                }
            }
            AppError::Internal(ref msg) => {
                tracing::error!(error = %msg, "internal error");
                ErrorBody {
                    error: "An internal error occurred".to_string(),
                    code,
                    details: None,
                }
            }
            other => ErrorBody {
                error: other.to_string(),
                code,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Flatten field errors into readable messages, sorted by field name.
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let details = fields
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |err| match &err.message {
                    Some(message) => message.to_string(),
                    None => format!("{field} is invalid"),
                })
            })
            .collect();

        AppError::Validation(details)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(vec![rejection.body_text()])
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(vec![rejection.body_text()])
    }
}

impl From<PathRejection> for AppError {
    fn from(_: PathRejection) -> Self {
        AppError::InvalidRequest("Invalid id".to_string())
    }
}
