//! Product models.
//!
//! Prices are `NUMERIC(10,2)` in the database and `rust_decimal::Decimal` in
//! Rust, so money never goes through floating point. Decimal serializes as a
//! string (`"189.00"`) and deserializes from either a JSON number or a
//! numeric string.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::{
    category::CategoryRef,
    input::{
        clearable_trimmed, optional_trimmed, present_trimmed, trimmed, validate_image_url,
        validate_price,
    },
    pagination::ListQuery,
};

/// A row of the `products` table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `GET /api/products/{id}`: the product with its category embedded.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    #[serde(flatten)]
    pub product: Product,
    pub category: Option<CategoryRef>,
}

/// Summary returned from `DELETE /api/products/{id}`.
#[derive(Debug, Serialize)]
pub struct DeletedProduct {
    pub id: i32,
    pub name: String,
}

/// Round to cents, half away from zero like the `NUMERIC(10,2)` column.
pub fn normalize_price(price: Decimal) -> Decimal {
    let mut price = price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    price.rescale(2);
    price
}

/// Body of `POST /api/products`.
///
/// ```json
/// {
///   "name": "Latte",
///   "price": 189.00,
///   "description": "Smooth milk coffee blend.",
///   "imageUrl": "/images/products/latte.jpg",
///   "categoryId": 1
/// }
/// ```
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 2, max = 255, message = "name must be between 2 and 255 characters"))]
    pub name: String,

    #[validate(custom(function = "validate_price"))]
    pub price: Decimal,

    #[serde(default)]
    #[validate(length(max = 5000, message = "description must be at most 5000 characters"))]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "optional_trimmed")]
    #[validate(custom(function = "validate_image_url"))]
    pub image_url: Option<String>,

    #[validate(range(min = 1, message = "categoryId must be a positive integer"))]
    pub category_id: i32,
}

/// Body of `PUT /api/products/{id}`. Every field is optional but at least
/// one must be present. `imageUrl: null` (or blank) clears the image.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_product_update"))]
pub struct UpdateProductRequest {
    #[serde(default, deserialize_with = "present_trimmed")]
    #[validate(length(min = 2, max = 255, message = "name must be between 2 and 255 characters"))]
    pub name: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_price"))]
    pub price: Option<Decimal>,

    #[serde(default)]
    #[validate(length(max = 5000, message = "description must be at most 5000 characters"))]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "clearable_trimmed")]
    pub image_url: Option<Option<String>>,

    #[serde(default)]
    #[validate(range(min = 1, message = "categoryId must be a positive integer"))]
    pub category_id: Option<i32>,
}

fn validate_product_update(request: &UpdateProductRequest) -> Result<(), ValidationError> {
    if request.name.is_none()
        && request.price.is_none()
        && request.description.is_none()
        && request.image_url.is_none()
        && request.category_id.is_none()
    {
        return Err(ValidationError::new("empty_update")
            .with_message(Cow::Borrowed("at least one field must be provided")));
    }
    if let Some(Some(url)) = &request.image_url {
        validate_image_url(url)?;
    }
    Ok(())
}

/// `GET /api/products?q=&page=&limit=&categoryId=`
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    #[serde(default, deserialize_with = "optional_trimmed")]
    #[validate(length(max = 100, message = "q must be at most 100 characters"))]
    pub q: Option<String>,

    #[validate(range(min = 1, message = "page must be greater than or equal to 1"))]
    pub page: Option<u32>,

    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<u32>,

    #[validate(range(min = 1, message = "categoryId must be a positive integer"))]
    pub category_id: Option<i32>,
}

impl ProductListQuery {
    /// The paging/search part of the query.
    pub fn listing(&self) -> ListQuery {
        ListQuery {
            q: self.q.clone(),
            page: self.page,
            limit: self.limit,
        }
    }
}
