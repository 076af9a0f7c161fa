//! Categories repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::category::{Category, CategorySummary},
};

#[derive(Clone)]
pub struct CategoriesRepository {
    pool: Pool<Postgres>,
}

impl CategoriesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get category by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Category> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
    }

    /// List categories ordered by name, paginated
    pub async fn list(
        &self,
        page_num: Option<i64>,
        per_page: Option<i64>,
    ) -> AppResult<(Vec<CategorySummary>, i64)> {
        let (_, per_page, offset) = super::page_bounds(page_num, per_page);

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await?;

        let categories = sqlx::query_as::<_, CategorySummary>(
            "SELECT id, name FROM categories ORDER BY name LIMIT $1 OFFSET $2",
        )
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((categories, total))
    }

    /// Create a new category. Name is expected pre-normalized.
    pub async fn create(&self, name: &str, created_by: Uuid) -> AppResult<Category> {
        let now = Utc::now();

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO categories (name, created_at, updated_at, created_by)
            VALUES ($1, $2, $2, $3)
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(now)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from_constraint)?;

        self.get_by_id(id).await
    }

    /// Rename a category
    pub async fn update(&self, id: Uuid, name: &str, updated_by: &str) -> AppResult<Category> {
        sqlx::query("UPDATE categories SET name = $1, updated_by = $2, updated_at = $3 WHERE id = $4")
            .bind(name)
            .bind(updated_by)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from_constraint)?;

        self.get_by_id(id).await
    }

    /// Hard delete; association rows cascade
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Display name of the user who created the category
    pub async fn creator_name(&self, id: Uuid) -> AppResult<Option<String>> {
        let name = sqlx::query_scalar::<_, String>(
            r#"
            SELECT u.full_name FROM categories c
            JOIN users u ON u.id = c.created_by
            WHERE c.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(name)
    }
}
