//! Account HTTP handlers.
//!
//! This module implements the public auth endpoints:
//! - POST /api/auth/register - Create an account and sign in
//! - POST /api/auth/login - Sign in
//! - POST /api/auth/forgot-password - Mail a reset code and link
//! - POST /api/auth/verify-otp - Exchange a code for a reset token
//! - POST /api/auth/reset-password - Set a new password

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};

use crate::{
    error::AppError,
    extract::ValidatedJson,
    models::user::{
        ForgotPasswordRequest, LoginRequest, OkResponse, PublicUser, RegisterRequest,
        ResetPasswordRequest, ResetTokenResponse, SessionResponse, VerifyOtpRequest,
    },
    services::auth_service::AuthService,
};

/// Register a new user.
///
/// # Endpoint
///
/// `POST /api/auth/register`
///
/// # Request Body
///
/// ```json
/// {
///   "username": "alice",
///   "email": "alice@example.com",
///   "password": "secret1",
///   "role": "User"  // optional, defaults to User
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: session token and public user fields
/// - **Error (400)**: validation failed
/// - **Error (409)**: email or username already taken
///
/// ```json
/// {
///   "message": "User registered",
///   "token": "eyJhbGciOiJIUzI1NiJ9...",
///   "user": { "id": 1, "username": "alice", "email": "alice@example.com", "role": "User" }
/// }
/// ```
pub async fn register(
    State(auth): State<Arc<AuthService>>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let session = auth.register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            message: "User registered",
            token: session.token,
            user: PublicUser::from(&session.user),
        }),
    ))
}

/// Sign in with email and password.
///
/// # Endpoint
///
/// `POST /api/auth/login`
///
/// # Response
///
/// - **Success (200 OK)**: same body as register, message "Login successful"
/// - **Error (401)**: unknown email or wrong password (indistinguishable)
pub async fn login(
    State(auth): State<Arc<AuthService>>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = auth
        .login(&request.email, &request.password)
        .await
        .map_err(AppError::conceal_login_failure)?;

    Ok(Json(SessionResponse {
        message: "Login successful",
        token: session.token,
        user: PublicUser::from(&session.user),
    }))
}

/// Start a password reset.
///
/// # Endpoint
///
/// `POST /api/auth/forgot-password`
///
/// # Response
///
/// Always **200 OK** for a well-formed email, registered or not:
///
/// ```json
/// { "ok": true, "message": "If that email exists, a reset link and OTP have been sent." }
/// ```
pub async fn forgot_password(
    State(auth): State<Arc<AuthService>>,
    ValidatedJson(request): ValidatedJson<ForgotPasswordRequest>,
) -> Result<Json<OkResponse>, AppError> {
    auth.forgot_password(&request.email).await?;

    Ok(Json(OkResponse::new(
        "If that email exists, a reset link and OTP have been sent.",
    )))
}

/// Exchange the mailed 6-digit code for a reset token.
///
/// # Endpoint
///
/// `POST /api/auth/verify-otp`
///
/// # Response
///
/// - **Success (200 OK)**: `{ "ok": true, "token": "..." }`
/// - **Error (400)**: no pending code, expired, or wrong code
/// - **Error (429)**: attempt limit reached; request a new code
pub async fn verify_otp(
    State(auth): State<Arc<AuthService>>,
    ValidatedJson(request): ValidatedJson<VerifyOtpRequest>,
) -> Result<Json<ResetTokenResponse>, AppError> {
    let token = auth.verify_otp(&request.email, &request.otp).await?;

    Ok(Json(ResetTokenResponse { ok: true, token }))
}

/// `POST /api/auth/reset-password`: set a new password with a reset token.
pub async fn reset_password(
    State(auth): State<Arc<AuthService>>,
    ValidatedJson(request): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<OkResponse>, AppError> {
    auth.reset_password(&request.token, &request.password).await?;

    Ok(Json(OkResponse::new("Password has been reset. You can now log in.")))
}
