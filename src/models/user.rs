//! User data models and auth request/response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{
    input::{trimmed, trimmed_lowercase, validate_otp_code},
    role::Role,
};

/// A user record from the `users` table.
///
/// `password` holds the Argon2 PHC hash string, never the plaintext.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    /// Always stored trimmed and lowercased.
    pub email: String,
    pub password: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to insert a user; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Public projection returned by register/login.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicUser {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Row of the admin users table (`GET /api/auth/users`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// `POST /api/auth/register`
///
/// ```json
/// { "username": "alice", "email": "alice@example.com", "password": "secret1" }
/// ```
///
/// `role` is optional and defaults to `User`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 2, max = 50, message = "username must be between 2 and 50 characters"))]
    pub username: String,

    #[serde(deserialize_with = "trimmed_lowercase")]
    #[validate(email(message = "email must be a valid email"))]
    pub email: String,

    #[validate(length(min = 6, max = 128, message = "password must be between 6 and 128 characters"))]
    pub password: String,

    #[serde(default)]
    pub role: Option<Role>,
}

/// `POST /api/auth/login`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(deserialize_with = "trimmed_lowercase")]
    #[validate(email(message = "email must be a valid email"))]
    pub email: String,

    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// `POST /api/auth/forgot-password`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[serde(deserialize_with = "trimmed_lowercase")]
    #[validate(email(message = "email must be a valid email"))]
    pub email: String,
}

/// `POST /api/auth/verify-otp`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[serde(deserialize_with = "trimmed_lowercase")]
    #[validate(email(message = "email must be a valid email"))]
    pub email: String,

    #[serde(deserialize_with = "trimmed")]
    #[validate(custom(function = "validate_otp_code"))]
    pub otp: String,
}

/// `POST /api/auth/reset-password`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "token is required"))]
    pub token: String,

    #[validate(length(min = 6, max = 128, message = "password must be between 6 and 128 characters"))]
    pub password: String,
}

/// Register/login response: a session token plus the public user fields.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub message: &'static str,
    pub token: String,
    pub user: PublicUser,
}

/// Generic `{ "ok": true, "message": "..." }` acknowledgement.
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
    pub message: &'static str,
}

impl OkResponse {
    pub fn new(message: &'static str) -> Self {
        Self { ok: true, message }
    }
}

/// `POST /api/auth/verify-otp` success body.
#[derive(Debug, Serialize)]
pub struct ResetTokenResponse {
    pub ok: bool,
    pub token: String,
}

/// `{ "ok": true, "message": "...", "deleted": {...} }`
#[derive(Debug, Serialize)]
pub struct DeletedResponse<T> {
    pub ok: bool,
    pub message: &'static str,
    pub deleted: T,
}

impl<T> DeletedResponse<T> {
    pub fn new(message: &'static str, deleted: T) -> Self {
        Self {
            ok: true,
            message,
            deleted,
        }
    }
}
