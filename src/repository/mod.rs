//! Repository layer for database operations

pub mod books;
pub mod categories;
pub mod history;
pub mod loans;
pub mod reviews;
pub mod tokens;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub users: users::UsersRepository,
    pub tokens: tokens::TokensRepository,
    pub categories: categories::CategoriesRepository,
    pub books: books::BooksRepository,
    pub loans: loans::LoansRepository,
    pub reviews: reviews::ReviewsRepository,
    pub history: history::HistoryRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: users::UsersRepository::new(pool.clone()),
            tokens: tokens::TokensRepository::new(pool.clone()),
            categories: categories::CategoriesRepository::new(pool.clone()),
            books: books::BooksRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            reviews: reviews::ReviewsRepository::new(pool.clone()),
            history: history::HistoryRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round-trip to the database, used by the readiness probe
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}

/// Resolve `page_num` / `per_page` query values into (page, per_page, offset)
/// with the 1 / 10 defaults shared by every list endpoint.
pub(crate) fn page_bounds(page_num: Option<i64>, per_page: Option<i64>) -> (i64, i64, i64) {
    let page = page_num.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(10).clamp(1, 100);
    (page, per_page, (page - 1) * per_page)
}

#[cfg(test)]
mod tests {
    use super::page_bounds;

    #[test]
    fn page_bounds_defaults_to_first_page_of_ten() {
        assert_eq!(page_bounds(None, None), (1, 10, 0));
    }

    #[test]
    fn page_bounds_computes_offset() {
        assert_eq!(page_bounds(Some(3), Some(25)), (3, 25, 50));
    }

    #[test]
    fn page_bounds_clamps_nonsense_values() {
        assert_eq!(page_bounds(Some(0), Some(0)), (1, 1, 0));
        assert_eq!(page_bounds(Some(-2), Some(1000)), (1, 100, 0));
    }
}
