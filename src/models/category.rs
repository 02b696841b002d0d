//! Menu category models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{input::trimmed, pagination::Paginated, product::Product};

/// A row of the `categories` table. Names are unique.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `{ "id": 1, "name": "Coffee" }`, embedded in product and delete responses.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
pub struct CategoryRef {
    pub id: i32,
    pub name: String,
}

impl From<&Category> for CategoryRef {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
        }
    }
}

/// Body of `POST /api/categories` and `PUT /api/categories/{id}`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CategoryRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 2, max = 60, message = "name must be between 2 and 60 characters"))]
    pub name: String,
}

/// `GET /api/categories/{id}/products`: the category plus one page of its products.
#[derive(Debug, Serialize)]
pub struct CategoryProducts {
    pub category: CategoryRef,
    #[serde(flatten)]
    pub products: Paginated<Product>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_name_is_trimmed_before_length_check() {
        let request: CategoryRequest = serde_json::from_str(r#"{"name": "  C  "}"#).unwrap();
        assert_eq!(request.name, "C");
        assert!(request.validate().is_err());

        let request: CategoryRequest = serde_json::from_str(r#"{"name": " Coffee "}"#).unwrap();
        assert_eq!(request.name, "Coffee");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn serializes_timestamps_in_camel_case() {
        let category = Category {
            id: 1,
            name: "Coffee".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&category).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("created_at").is_none());
    }
}
