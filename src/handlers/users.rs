//! User administration handlers.

use std::sync::Arc;

use axum::{Extension, Json, extract::State};

use crate::{
    error::AppError,
    extract::{IdParam, ValidatedQuery},
    middleware::auth::AuthUser,
    models::{
        pagination::{ListQuery, Paginated},
        user::{DeletedResponse, PublicUser, UserSummary},
    },
    services::auth_service::AuthService,
};

/// List users, newest id last.
///
/// # Endpoint
///
/// `GET /api/auth/users?q=&page=&limit=` (Admin, SuperAdmin)
///
/// `q` matches username or email; `limit` defaults to 20.
pub async fn list_users(
    State(auth): State<Arc<AuthService>>,
    ValidatedQuery(query): ValidatedQuery<ListQuery>,
) -> Result<Json<Paginated<UserSummary>>, AppError> {
    Ok(Json(auth.list_users(&query).await?))
}

/// Delete a user.
///
/// # Endpoint
///
/// `DELETE /api/auth/users/{id}` (SuperAdmin)
///
/// # Response
///
/// - **Success (200 OK)**: `{ "ok": true, "message": "User deleted", "deleted": {...} }`
/// - **Error (400)**: target is a SuperAdmin or the caller
/// - **Error (404)**: no such user
pub async fn delete_user(
    State(auth): State<Arc<AuthService>>,
    Extension(caller): Extension<AuthUser>,
    IdParam(id): IdParam,
) -> Result<Json<DeletedResponse<PublicUser>>, AppError> {
    let deleted = auth.delete_user(caller.id, id).await?;

    Ok(Json(DeletedResponse::new("User deleted", deleted)))
}
