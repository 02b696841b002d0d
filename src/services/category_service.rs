//! Category queries.

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        category::{Category, CategoryProducts, CategoryRef},
        pagination::ListQuery,
    },
    services::product_service::{self, PRODUCTS_PAGE_SIZE, ProductFilter},
};

const CATEGORY_COLUMNS: &str = "id, name, created_at, updated_at";

/// Every category, ordered by id. The menu is small enough not to page.
pub async fn list_categories(pool: &DbPool) -> Result<Vec<Category>, AppError> {
    let categories = sqlx::query_as::<_, Category>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY id ASC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(categories)
}

pub async fn get_category(pool: &DbPool, id: i32) -> Result<Category, AppError> {
    sqlx::query_as::<_, Category>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Category"))
}

/// # Errors
///
/// `Conflict` if another category already has this name.
pub async fn create_category(pool: &DbPool, name: &str) -> Result<Category, AppError> {
    let category = sqlx::query_as::<_, Category>(&format!(
        "INSERT INTO categories (name) VALUES ($1) RETURNING {CATEGORY_COLUMNS}"
    ))
    .bind(name)
    .fetch_one(pool)
    .await
    .map_err(duplicate_name_error)?;

    tracing::info!(category_id = category.id, name = %category.name, "Category created");
    Ok(category)
}

pub async fn update_category(pool: &DbPool, id: i32, name: &str) -> Result<Category, AppError> {
    let category = sqlx::query_as::<_, Category>(&format!(
        r#"
        UPDATE categories
        SET name = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {CATEGORY_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(name)
    .fetch_optional(pool)
    .await
    .map_err(duplicate_name_error)?
    .ok_or(AppError::NotFound("Category"))?;

    tracing::info!(category_id = category.id, "Category updated");
    Ok(category)
}

/// Delete an empty category.
///
/// # Errors
///
/// `ForeignKeyConflict` while any product still references the category.
pub async fn delete_category(pool: &DbPool, id: i32) -> Result<CategoryRef, AppError> {
    let deleted = sqlx::query_as::<_, CategoryRef>(
        "DELETE FROM categories WHERE id = $1 RETURNING id, name",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|error| match &error {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            AppError::ForeignKeyConflict("Category has related products".to_string())
        }
        _ => AppError::Database(error),
    })?
    .ok_or(AppError::NotFound("Category"))?;

    tracing::info!(category_id = deleted.id, "Category deleted");
    Ok(deleted)
}

/// The category plus one page of its products, searched by `q`.
pub async fn list_category_products(
    pool: &DbPool,
    id: i32,
    query: &ListQuery,
) -> Result<CategoryProducts, AppError> {
    let category = get_category(pool, id).await?;

    let pattern = query.pattern();
    let filter = ProductFilter {
        pattern: pattern.as_deref(),
        category_id: Some(category.id),
    };
    let products =
        product_service::list_products(pool, filter, query.window(PRODUCTS_PAGE_SIZE)).await?;

    Ok(CategoryProducts {
        category: CategoryRef::from(&category),
        products,
    })
}

fn duplicate_name_error(error: sqlx::Error) -> AppError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict("Category name already exists".to_string())
        }
        _ => AppError::Database(error),
    }
}
