//! Loans repository: the borrow/return state transitions.
//!
//! Each transition runs in one transaction so the loan row, the copy
//! counter and the audit entry move together. The database serializes
//! concurrent attempts: the copy decrement is a compare-and-swap guarded by
//! `copies > 0`, and the partial unique index on active loans backs the
//! no-duplicate-borrow rule even across server instances.

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::history::HistoryEvent,
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Borrow a book: create the loan row, decrement the copy counter and
    /// append the audit entry atomically.
    pub async fn borrow(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        user_name: &str,
        book_title: &str,
    ) -> AppResult<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let already_borrowed: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM loans WHERE user_id = $1 AND book_id = $2 AND returned_at IS NULL)",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await?;

        if already_borrowed {
            return Err(AppError::Conflict("Book already borrowed".to_string()));
        }

        // Compare-and-swap: loses the race on the last copy rather than
        // driving the counter negative.
        let decremented = sqlx::query(
            "UPDATE books SET copies = copies - 1, updated_at = $1 WHERE id = $2 AND copies > 0",
        )
        .bind(now)
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

        if decremented.rows_affected() == 0 {
            return Err(AppError::Conflict("All copies borrowed out".to_string()));
        }

        sqlx::query(
            "INSERT INTO loans (id, user_id, book_id, borrowed_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(book_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from_constraint)?;

        sqlx::query(
            r#"
            INSERT INTO history (id, user_id, book_id, book_title, user_name, event, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(book_id)
        .bind(book_title)
        .bind(user_name)
        .bind(HistoryEvent::Borrow)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Return a book: close the loan row, increment the copy counter and
    /// append the audit entry atomically.
    pub async fn return_book(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        user_name: &str,
        book_title: &str,
    ) -> AppResult<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let closed = sqlx::query(
            r#"
            UPDATE loans SET returned_at = $1
            WHERE user_id = $2 AND book_id = $3 AND returned_at IS NULL
            "#,
        )
        .bind(now)
        .bind(user_id)
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

        if closed.rows_affected() == 0 {
            return Err(AppError::Forbidden("Book not borrowed yet".to_string()));
        }

        sqlx::query("UPDATE books SET copies = copies + 1, updated_at = $1 WHERE id = $2")
            .bind(now)
            .bind(book_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO history (id, user_id, book_id, book_title, user_name, event, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(book_id)
        .bind(book_title)
        .bind(user_name)
        .bind(HistoryEvent::Return)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
