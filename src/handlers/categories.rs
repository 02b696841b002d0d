//! Category HTTP handlers.
//!
//! Reads are public; writes require an Admin or SuperAdmin session.

use axum::{Json, extract::State, http::StatusCode};

use crate::{
    db::DbPool,
    error::AppError,
    extract::{IdParam, ValidatedJson, ValidatedQuery},
    models::{
        category::{Category, CategoryProducts, CategoryRef, CategoryRequest},
        pagination::ListQuery,
        user::DeletedResponse,
    },
    services::category_service,
};

/// `GET /api/categories`: every category ordered by id.
pub async fn list_categories(
    State(pool): State<DbPool>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(category_service::list_categories(&pool).await?))
}

/// `GET /api/categories/{id}`
pub async fn get_category(
    State(pool): State<DbPool>,
    IdParam(id): IdParam,
) -> Result<Json<Category>, AppError> {
    Ok(Json(category_service::get_category(&pool, id).await?))
}

/// Create a category.
///
/// # Endpoint
///
/// `POST /api/categories`
///
/// # Request Body
///
/// ```json
/// { "name": "Coffee" }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: the new category
/// - **Error (409)**: name already used
pub async fn create_category(
    State(pool): State<DbPool>,
    ValidatedJson(request): ValidatedJson<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let category = category_service::create_category(&pool, &request.name).await?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// `PUT /api/categories/{id}`: rename a category.
pub async fn update_category(
    State(pool): State<DbPool>,
    IdParam(id): IdParam,
    ValidatedJson(request): ValidatedJson<CategoryRequest>,
) -> Result<Json<Category>, AppError> {
    Ok(Json(
        category_service::update_category(&pool, id, &request.name).await?,
    ))
}

/// Delete a category.
///
/// # Endpoint
///
/// `DELETE /api/categories/{id}`
///
/// # Response
///
/// - **Success (200 OK)**: `{ "ok": true, "message": "Category deleted", "deleted": { "id": 4, "name": "Snacks" } }`
/// - **Error (409)**: products still reference the category (`code: FK_CONSTRAINT`)
pub async fn delete_category(
    State(pool): State<DbPool>,
    IdParam(id): IdParam,
) -> Result<Json<DeletedResponse<CategoryRef>>, AppError> {
    let deleted = category_service::delete_category(&pool, id).await?;

    Ok(Json(DeletedResponse::new("Category deleted", deleted)))
}

/// Products in one category.
///
/// # Endpoint
///
/// `GET /api/categories/{id}/products?q=&page=&limit=`
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "category": { "id": 1, "name": "Coffee" },
///   "data": [ { "id": 3, "name": "Latte", "price": "189.00", ... } ],
///   "meta": { "page": 1, "limit": 12, "total": 1, "pages": 1 }
/// }
/// ```
pub async fn list_category_products(
    State(pool): State<DbPool>,
    IdParam(id): IdParam,
    ValidatedQuery(query): ValidatedQuery<ListQuery>,
) -> Result<Json<CategoryProducts>, AppError> {
    Ok(Json(
        category_service::list_category_products(&pool, id, &query).await?,
    ))
}
