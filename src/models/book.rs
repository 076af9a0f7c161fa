//! Book model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::review::{Review, ReviewWithUser};

/// Full book model from database
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub short_description: String,
    pub full_description: String,
    /// Number of currently available lending copies, never negative
    pub copies: i32,
    pub overall_rating: f64,
    pub total_rating: i32,
    pub total_review: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
    #[serde(skip_serializing)]
    pub created_by: Option<Uuid>,
}

/// Short book representation for lists
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct BookSummary {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub short_description: String,
    pub copies: i32,
    pub overall_rating: f64,
    pub total_review: i32,
}

/// Detailed book view: categories and creator for everyone, the review
/// block only for Public callers.
#[derive(Debug, Serialize, ToSchema)]
pub struct BookDetail {
    #[serde(flatten)]
    pub book: Book,
    pub added_by: Option<String>,
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Vec<ReviewWithUser>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_review: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_review: Option<Review>,
}

/// Entry in the caller's borrowed-books listing
#[derive(Debug, Serialize, ToSchema)]
pub struct BorrowedBook {
    pub id: Uuid,
    pub title: String,
    pub my_review: Option<Review>,
}

/// Book list query parameters; unrecognized parameters are ignored
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct BookQuery {
    /// Title substring
    pub title: Option<String>,
    /// Author substring
    pub author: Option<String>,
    /// Minimum overall rating
    pub overall_rating: Option<f64>,
    /// Comma-separated category ids; matches books in any listed category
    pub category: Option<String>,
    pub page_num: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create book request (Librarian+)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title missing"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author missing"))]
    pub author: String,
    pub short_description: String,
    pub full_description: String,
    #[validate(range(min = 0, message = "Copy count cannot be negative"))]
    #[serde(default)]
    pub copies: i32,
    #[serde(default)]
    pub category_id: Vec<Uuid>,
}

/// Update book request (Librarian+)
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub author: Option<String>,
    pub short_description: Option<String>,
    pub full_description: Option<String>,
    #[validate(range(min = 0, message = "Copy count cannot be negative"))]
    pub copies: Option<i32>,
    pub category_id: Option<Vec<Uuid>>,
}
