//! Book review model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Book review model from database
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Review {
    pub id: Uuid,
    pub rating: i32,
    pub review: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub book_id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
}

/// Review with its author's display name, for the public book detail view
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ReviewWithUser {
    pub id: Uuid,
    pub rating: i32,
    pub review: String,
    pub created_at: DateTime<Utc>,
    pub user_name: String,
}

/// Create or edit request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReviewRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    #[serde(default)]
    pub review: String,
}
