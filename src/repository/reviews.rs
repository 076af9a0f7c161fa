//! Book reviews repository.
//!
//! This is the only writer of the book rating aggregate: every insert or
//! edit adjusts `total_rating` / `total_review` and recomputes
//! `overall_rating` (one decimal, round half up) in the same transaction.

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::review::{Review, ReviewWithUser},
};

#[derive(Clone)]
pub struct ReviewsRepository {
    pool: Pool<Postgres>,
}

impl ReviewsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get review by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Review> {
        sqlx::query_as::<_, Review>("SELECT * FROM book_reviews WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Review not found".to_string()))
    }

    /// Reviews for a book with reviewer names, newest first
    pub async fn for_book(&self, book_id: Uuid) -> AppResult<Vec<ReviewWithUser>> {
        let reviews = sqlx::query_as::<_, ReviewWithUser>(
            r#"
            SELECT r.id, r.rating, r.review, r.created_at, u.full_name AS user_name
            FROM book_reviews r
            JOIN users u ON u.id = r.user_id
            WHERE r.book_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    /// The user's review of a book, if any
    pub async fn by_user_and_book(&self, user_id: Uuid, book_id: Uuid) -> AppResult<Option<Review>> {
        let review = sqlx::query_as::<_, Review>(
            "SELECT * FROM book_reviews WHERE user_id = $1 AND book_id = $2",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(review)
    }

    /// All reviews written by a user
    pub async fn by_user(&self, user_id: Uuid) -> AppResult<Vec<Review>> {
        let reviews = sqlx::query_as::<_, Review>(
            "SELECT * FROM book_reviews WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    /// Insert a review and fold its rating into the book aggregate. The
    /// unique (user, book) constraint turns a double submission into a
    /// conflict instead of a second row.
    pub async fn create(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        rating: i32,
        review: &str,
    ) -> AppResult<Review> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO book_reviews (id, rating, review, created_at, book_id, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(rating)
        .bind(review)
        .bind(Utc::now())
        .bind(book_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from_constraint)?;

        sqlx::query(
            r#"
            UPDATE books SET
                total_rating = total_rating + $1,
                total_review = total_review + 1,
                overall_rating = ROUND((total_rating + $1)::numeric / (total_review + 1), 1)::double precision
            WHERE id = $2
            "#,
        )
        .bind(rating)
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.get_by_id(id).await
    }

    /// Edit a review and shift the book aggregate by the rating delta;
    /// the review count does not change.
    pub async fn update(&self, id: Uuid, rating: i32, review: &str) -> AppResult<Review> {
        let existing = self.get_by_id(id).await?;
        let delta = rating - existing.rating;

        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE book_reviews SET rating = $1, review = $2 WHERE id = $3")
            .bind(rating)
            .bind(review)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE books SET
                total_rating = total_rating + $1,
                overall_rating = ROUND((total_rating + $1)::numeric / NULLIF(total_review, 0), 1)::double precision
            WHERE id = $2
            "#,
        )
        .bind(delta)
        .bind(existing.book_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.get_by_id(id).await
    }
}
