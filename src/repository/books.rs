//! Books repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, BookSummary, CreateBook, UpdateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    /// Search books with pagination. Filters AND-conjoin; `include_zero_stock`
    /// is false for Public callers, who only see books with copies left.
    pub async fn search(
        &self,
        query: &BookQuery,
        category_ids: &[Uuid],
        include_zero_stock: bool,
    ) -> AppResult<(Vec<BookSummary>, i64)> {
        let (_, per_page, offset) = super::page_bounds(query.page_num, query.per_page);

        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if !include_zero_stock {
            conditions.push("copies > 0".to_string());
        }

        if let Some(ref title) = query.title {
            params.push(format!("%{}%", title.to_lowercase()));
            conditions.push(format!("LOWER(title) LIKE ${}", params.len()));
        }

        if let Some(ref author) = query.author {
            params.push(format!("%{}%", author.to_lowercase()));
            conditions.push(format!("LOWER(author) LIKE ${}", params.len()));
        }

        if let Some(rating) = query.overall_rating {
            conditions.push(format!("overall_rating >= {}", rating));
        }

        if !category_ids.is_empty() {
            let ids: Vec<String> = category_ids.iter().map(|id| format!("'{}'", id)).collect();
            conditions.push(format!(
                "id IN (SELECT book_id FROM category_books WHERE category_id IN ({}))",
                ids.join(", ")
            ));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM books {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            r#"
            SELECT id, title, author, short_description, copies, overall_rating, total_review
            FROM books {}
            ORDER BY title
            LIMIT {} OFFSET {}
            "#,
            where_clause, per_page, offset
        );

        let mut select_builder = sqlx::query_as::<_, BookSummary>(&select_query);
        for param in &params {
            select_builder = select_builder.bind(param);
        }
        let books = select_builder.fetch_all(&self.pool).await?;

        Ok((books, total))
    }

    /// Create a new book with its category memberships in one transaction.
    /// String fields are expected pre-normalized.
    pub async fn create(&self, book: &CreateBook, created_by: Uuid) -> AppResult<Book> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO books (
                title, author, short_description, full_description, copies,
                overall_rating, total_rating, total_review,
                created_at, updated_at, created_by
            ) VALUES ($1, $2, $3, $4, $5, 0, 0, 0, $6, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.short_description)
        .bind(&book.full_description)
        .bind(book.copies)
        .bind(now)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from_constraint)?;

        for category_id in &book.category_id {
            sqlx::query("INSERT INTO category_books (category_id, book_id) VALUES ($1, $2)")
                .bind(category_id)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        self.get_by_id(id).await
    }

    /// Update a book; only the fields present in `book` change. When
    /// `category_id` is present the membership set is replaced wholesale.
    pub async fn update(&self, id: Uuid, book: &UpdateBook, updated_by: &str) -> AppResult<Book> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut sets = vec!["updated_at = $1".to_string(), "updated_by = $2".to_string()];
        let mut param_idx = 3;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, param_idx));
                    param_idx += 1;
                }
            };
        }

        add_field!(book.title, "title");
        add_field!(book.author, "author");
        add_field!(book.short_description, "short_description");
        add_field!(book.full_description, "full_description");
        if book.copies.is_some() {
            sets.push(format!("copies = ${}", param_idx));
        }

        let query = format!("UPDATE books SET {} WHERE id = '{}'", sets.join(", "), id);

        let mut builder = sqlx::query(&query).bind(now).bind(updated_by);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(book.title);
        bind_field!(book.author);
        bind_field!(book.short_description);
        bind_field!(book.full_description);
        bind_field!(book.copies);

        builder
            .execute(&mut *tx)
            .await
            .map_err(AppError::from_constraint)?;

        if let Some(ref category_ids) = book.category_id {
            sqlx::query("DELETE FROM category_books WHERE book_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            for category_id in category_ids {
                sqlx::query("INSERT INTO category_books (category_id, book_id) VALUES ($1, $2)")
                    .bind(category_id)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        self.get_by_id(id).await
    }

    /// Hard delete; association rows cascade, history rows survive
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Names of the categories a book belongs to
    pub async fn category_names(&self, book_id: Uuid) -> AppResult<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            r#"
            SELECT c.name FROM categories c
            JOIN category_books cb ON cb.category_id = c.id
            WHERE cb.book_id = $1
            ORDER BY c.name
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    /// Display name of the user who added the book
    pub async fn creator_name(&self, id: Uuid) -> AppResult<Option<String>> {
        let name = sqlx::query_scalar::<_, String>(
            r#"
            SELECT u.full_name FROM books b
            JOIN users u ON u.id = b.created_by
            WHERE b.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(name)
    }

    /// Books currently borrowed by a user, paginated
    pub async fn borrowed_by(
        &self,
        user_id: Uuid,
        page_num: Option<i64>,
        per_page: Option<i64>,
    ) -> AppResult<(Vec<BookSummary>, i64)> {
        let (_, per_page, offset) = super::page_bounds(page_num, per_page);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE user_id = $1 AND returned_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let books = sqlx::query_as::<_, BookSummary>(
            r#"
            SELECT b.id, b.title, b.author, b.short_description, b.copies,
                   b.overall_rating, b.total_review
            FROM books b
            JOIN loans l ON l.book_id = b.id
            WHERE l.user_id = $1 AND l.returned_at IS NULL
            ORDER BY l.borrowed_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((books, total))
    }
}
