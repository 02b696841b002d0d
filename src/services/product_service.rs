//! Product catalog queries.
//!
//! Category existence is enforced by the `products.category_id` foreign key,
//! not checked up front: a write naming a missing category fails in the
//! database and is reported as `ForeignKeyConflict`.

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        category::CategoryRef,
        pagination::{PageWindow, Paginated},
        product::{
            CreateProductRequest, DeletedProduct, Product, ProductDetails, UpdateProductRequest,
            normalize_price,
        },
    },
};

/// Default page size of product listings.
pub const PRODUCTS_PAGE_SIZE: u32 = 12;

const PRODUCT_COLUMNS: &str =
    "id, name, price, description, image_url, category_id, created_at, updated_at";

/// Search/filter applied by [`list_products`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductFilter<'a> {
    /// Escaped `ILIKE` pattern matched against name and description.
    pub pattern: Option<&'a str>,
    pub category_id: Option<i32>,
}

/// One page of products ordered by id.
pub async fn list_products(
    pool: &DbPool,
    filter: ProductFilter<'_>,
    window: PageWindow,
) -> Result<Paginated<Product>, AppError> {
    let condition = "($1::text IS NULL OR name ILIKE $1 OR description ILIKE $1) \
                     AND ($2::int IS NULL OR category_id = $2)";

    let total: i64 =
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM products WHERE {condition}"))
            .bind(filter.pattern)
            .bind(filter.category_id)
            .fetch_one(pool)
            .await?;

    let products = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE {condition} \
         ORDER BY id ASC LIMIT $3 OFFSET $4"
    ))
    .bind(filter.pattern)
    .bind(filter.category_id)
    .bind(window.limit())
    .bind(window.offset())
    .fetch_all(pool)
    .await?;

    Ok(Paginated::new(products, window, total))
}

/// Fetch a product with its category embedded.
///
/// # Errors
///
/// `NotFound("Product")` if no product has this id.
pub async fn get_product(pool: &DbPool, id: i32) -> Result<ProductDetails, AppError> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Product"))?;

    let category =
        sqlx::query_as::<_, CategoryRef>("SELECT id, name FROM categories WHERE id = $1")
            .bind(product.category_id)
            .fetch_optional(pool)
            .await?;

    Ok(ProductDetails { product, category })
}

pub async fn create_product(
    pool: &DbPool,
    request: CreateProductRequest,
) -> Result<Product, AppError> {
    let product = sqlx::query_as::<_, Product>(&format!(
        r#"
        INSERT INTO products (name, price, description, image_url, category_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {PRODUCT_COLUMNS}
        "#
    ))
    .bind(&request.name)
    .bind(normalize_price(request.price))
    .bind(&request.description)
    .bind(&request.image_url)
    .bind(request.category_id)
    .fetch_one(pool)
    .await
    .map_err(category_write_error)?;

    tracing::info!(product_id = product.id, category_id = product.category_id, "Product created");
    Ok(product)
}

/// Apply the fields present in `request`; absent fields keep their value.
pub async fn update_product(
    pool: &DbPool,
    id: i32,
    request: UpdateProductRequest,
) -> Result<Product, AppError> {
    let (replace_image, image_url) = match request.image_url {
        Some(image_url) => (true, image_url),
        None => (false, None),
    };

    let product = sqlx::query_as::<_, Product>(&format!(
        r#"
        UPDATE products
        SET name = COALESCE($2, name),
            price = COALESCE($3, price),
            description = COALESCE($4, description),
            image_url = CASE WHEN $5 THEN $6 ELSE image_url END,
            category_id = COALESCE($7, category_id),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {PRODUCT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&request.name)
    .bind(request.price.map(normalize_price))
    .bind(&request.description)
    .bind(replace_image)
    .bind(image_url)
    .bind(request.category_id)
    .fetch_optional(pool)
    .await
    .map_err(category_write_error)?
    .ok_or(AppError::NotFound("Product"))?;

    tracing::info!(product_id = product.id, "Product updated");
    Ok(product)
}

pub async fn delete_product(pool: &DbPool, id: i32) -> Result<DeletedProduct, AppError> {
    let deleted = sqlx::query_as::<_, (i32, String)>(
        "DELETE FROM products WHERE id = $1 RETURNING id, name",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .map(|(id, name)| DeletedProduct { id, name })
    .ok_or(AppError::NotFound("Product"))?;

    tracing::info!(product_id = deleted.id, "Product deleted");
    Ok(deleted)
}

/// A product write that names a missing category trips the foreign key.
fn category_write_error(error: sqlx::Error) -> AppError {
    match &error {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            AppError::ForeignKeyConflict("Category does not exist".to_string())
        }
        _ => AppError::Database(error),
    }
}
