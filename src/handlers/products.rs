//! Product HTTP handlers.
//!
//! - GET /api/products - Paginated, searchable listing (public)
//! - GET /api/products/{id} - Product with its category (public)
//! - POST /api/products - Create (Admin, SuperAdmin)
//! - PUT /api/products/{id} - Partial update (Admin, SuperAdmin)
//! - DELETE /api/products/{id} - Delete (Admin, SuperAdmin)

use axum::{Json, extract::State, http::StatusCode};

use crate::{
    db::DbPool,
    error::AppError,
    extract::{IdParam, ValidatedJson, ValidatedQuery},
    models::{
        pagination::Paginated,
        product::{
            CreateProductRequest, DeletedProduct, Product, ProductDetails, ProductListQuery,
            UpdateProductRequest,
        },
        user::DeletedResponse,
    },
    services::product_service::{self, PRODUCTS_PAGE_SIZE, ProductFilter},
};

/// List products.
///
/// # Endpoint
///
/// `GET /api/products?q=&page=&limit=&categoryId=`
///
/// `q` matches name or description case-insensitively; `limit` defaults to 12.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "data": [ { "id": 3, "name": "Latte", "price": "189.00", "categoryId": 1, ... } ],
///   "meta": { "page": 1, "limit": 12, "total": 1, "pages": 1 }
/// }
/// ```
pub async fn list_products(
    State(pool): State<DbPool>,
    ValidatedQuery(query): ValidatedQuery<ProductListQuery>,
) -> Result<Json<Paginated<Product>>, AppError> {
    let listing = query.listing();
    let pattern = listing.pattern();
    let filter = ProductFilter {
        pattern: pattern.as_deref(),
        category_id: query.category_id,
    };

    let page =
        product_service::list_products(&pool, filter, listing.window(PRODUCTS_PAGE_SIZE)).await?;
    Ok(Json(page))
}

pub async fn get_product(
    State(pool): State<DbPool>,
    IdParam(id): IdParam,
) -> Result<Json<ProductDetails>, AppError> {
    Ok(Json(product_service::get_product(&pool, id).await?))
}

/// Create a product.
///
/// # Endpoint
///
/// `POST /api/products`
///
/// # Response
///
/// - **Success (201 Created)**: the stored product
/// - **Error (400)**: validation failed
/// - **Error (409)**: `categoryId` names no category (`code: FK_CONSTRAINT`)
pub async fn create_product(
    State(pool): State<DbPool>,
    ValidatedJson(request): ValidatedJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let product = product_service::create_product(&pool, request).await?;

    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /api/products/{id}`: fields left out of the body keep their value;
/// `"imageUrl": null` clears the image.
pub async fn update_product(
    State(pool): State<DbPool>,
    IdParam(id): IdParam,
    ValidatedJson(request): ValidatedJson<UpdateProductRequest>,
) -> Result<Json<Product>, AppError> {
    Ok(Json(product_service::update_product(&pool, id, request).await?))
}

pub async fn delete_product(
    State(pool): State<DbPool>,
    IdParam(id): IdParam,
) -> Result<Json<DeletedResponse<DeletedProduct>>, AppError> {
    let deleted = product_service::delete_product(&pool, id).await?;

    Ok(Json(DeletedResponse::new("Product deleted", deleted)))
}
