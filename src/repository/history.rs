//! Audit log repository. Rows are written by the loans repository at
//! borrow/return time and are never updated or deleted.

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::history::{parse_date_range, HistoryEntry, HistoryEvent, HistoryQuery},
};

#[derive(Clone)]
pub struct HistoryRepository {
    pool: Pool<Postgres>,
}

impl HistoryRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Whether any borrow/return event exists for the pair. This is the
    /// review-eligibility check: having borrowed the book at least once,
    /// independent of current return state.
    pub async fn exists(&self, user_id: Uuid, book_id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM history WHERE user_id = $1 AND book_id = $2)",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Search the audit log, newest first, paginated. `restrict_user`
    /// confines results to one user's rows (Public callers).
    pub async fn search(
        &self,
        query: &HistoryQuery,
        restrict_user: Option<Uuid>,
    ) -> AppResult<(Vec<HistoryEntry>, i64)> {
        let (_, per_page, offset) = super::page_bounds(query.page_num, query.per_page);

        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(user_id) = restrict_user {
            conditions.push(format!("user_id = '{}'", user_id));
        }

        if let Some(ref title) = query.book_title {
            params.push(format!("%{}%", title.to_lowercase()));
            conditions.push(format!("LOWER(book_title) LIKE ${}", params.len()));
        }

        if let Some(ref name) = query.user_name {
            params.push(format!("%{}%", name.to_lowercase()));
            conditions.push(format!("LOWER(user_name) LIKE ${}", params.len()));
        }

        if let Some(ref events) = query.event {
            let set: Vec<String> = events
                .split(',')
                .filter_map(|e| e.trim().parse::<HistoryEvent>().ok())
                .map(|e| format!("'{}'", e.as_str()))
                .collect();
            if !set.is_empty() {
                conditions.push(format!("event IN ({})", set.join(", ")));
            }
        }

        if let Some(ref range) = query.date {
            if let Some((from, to)) = parse_date_range(range) {
                conditions.push(format!(
                    "recorded_at BETWEEN '{}' AND '{}'",
                    from.to_rfc3339(),
                    to.to_rfc3339()
                ));
            }
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM history {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            r#"
            SELECT * FROM history {}
            ORDER BY recorded_at DESC
            LIMIT {} OFFSET {}
            "#,
            where_clause, per_page, offset
        );

        let mut select_builder = sqlx::query_as::<_, HistoryEntry>(&select_query);
        for param in &params {
            select_builder = select_builder.bind(param);
        }
        let entries = select_builder.fetch_all(&self.pool).await?;

        Ok((entries, total))
    }
}
