//! Access-control gate for protected routes.
//!
//! Two layers run in order:
//! 1. [`require_auth`] verifies the `Authorization: Bearer <token>` session
//!    token and inserts the caller as an [`AuthUser`] request extension.
//! 2. [`require_role`] checks that caller's role against the route group's
//!    [`RoleGate`] allow-list.
//!
//! Both are stateless: the only shared input is the signing secret.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, models::role::Role, services::token_service::TokenService};

/// The authenticated caller, as decoded from the session token.
///
/// Handlers behind the gate extract it with `Extension<AuthUser>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i32,
    pub role: Role,
}

/// Roles admitted to a route group.
#[derive(Debug, Clone, Copy)]
pub struct RoleGate(pub &'static [Role]);

impl RoleGate {
    /// Catalog writes and the users listing.
    pub const STAFF: RoleGate = RoleGate(&[Role::Admin, Role::SuperAdmin]);

    /// User deletion.
    pub const SUPER_ADMIN: RoleGate = RoleGate(&[Role::SuperAdmin]);

    pub fn allows(&self, role: Role) -> bool {
        self.0.contains(&role)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Reject requests without a valid session token.
///
/// # Errors
///
/// - `NotAuthenticated` (401) when no bearer token is present
/// - `InvalidToken` (401) when it is malformed, expired or badly signed
pub async fn require_auth(
    State(tokens): State<TokenService>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers()).ok_or(AppError::NotAuthenticated)?;
    let claims = tokens.verify_session(token)?;

    request.extensions_mut().insert(AuthUser {
        id: claims.id,
        role: claims.role,
    });

    Ok(next.run(request).await)
}

/// Admit the request only if the caller's role is in the gate's allow-list.
///
/// Must be layered inside [`require_auth`].
pub async fn require_role(
    State(gate): State<RoleGate>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let caller = request
        .extensions()
        .get::<AuthUser>()
        .copied()
        .ok_or(AppError::NotAuthenticated)?;

    if !gate.allows(caller.role) {
        tracing::debug!(user_id = caller.id, role = %caller.role, "Role not allowed");
        return Err(AppError::Forbidden);
    }

    Ok(next.run(request).await)
}
