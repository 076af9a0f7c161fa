//! Category model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Category model from database
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
    #[serde(skip_serializing)]
    pub created_by: Option<Uuid>,
}

/// Category with its creator's display name
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: Category,
    pub added_by: Option<String>,
}

/// Short category representation for lists
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
}

/// Category list query parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct CategoryQuery {
    pub page_num: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create or rename request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CategoryRequest {
    #[validate(length(min = 1, message = "Category name missing"))]
    pub name: String,
}
