//! Catalog management service: categories and books

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookDetail, BookQuery, BookSummary, CreateBook, UpdateBook},
        category::{Category, CategoryDetail, CategorySummary},
        user::{Role, UserClaims},
    },
    repository::Repository,
};

/// Catalog strings are stored trimmed and case-folded so the unique
/// constraints on title/name deduplicate regardless of input casing.
fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    // Categories

    pub async fn list_categories(
        &self,
        page_num: Option<i64>,
        per_page: Option<i64>,
    ) -> AppResult<(Vec<CategorySummary>, i64)> {
        self.repository.categories.list(page_num, per_page).await
    }

    pub async fn get_category(&self, id: Uuid) -> AppResult<CategoryDetail> {
        let category = self.repository.categories.get_by_id(id).await?;
        let added_by = self.repository.categories.creator_name(id).await?;
        Ok(CategoryDetail { category, added_by })
    }

    pub async fn create_category(&self, name: &str, created_by: Uuid) -> AppResult<Category> {
        let name = normalize(name);
        if name.is_empty() {
            return Err(AppError::BadRequest("Category name missing".to_string()));
        }
        self.repository.categories.create(&name, created_by).await
    }

    pub async fn update_category(
        &self,
        id: Uuid,
        name: &str,
        updated_by: &str,
    ) -> AppResult<Category> {
        self.repository.categories.get_by_id(id).await?;
        let name = normalize(name);
        if name.is_empty() {
            return Err(AppError::BadRequest("Category name missing".to_string()));
        }
        self.repository.categories.update(id, &name, updated_by).await
    }

    pub async fn delete_category(&self, id: Uuid) -> AppResult<()> {
        self.repository.categories.get_by_id(id).await?;
        self.repository.categories.delete(id).await
    }

    // Books

    /// Search books. Public callers only see in-stock titles.
    pub async fn search_books(
        &self,
        role: Role,
        query: &BookQuery,
    ) -> AppResult<(Vec<BookSummary>, i64)> {
        let category_ids: Vec<Uuid> = query
            .category
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .filter_map(|id| id.trim().parse().ok())
            .collect();

        self.repository
            .books
            .search(query, &category_ids, role != Role::Public)
            .await
    }

    /// Detailed book view. Public callers additionally get the review list,
    /// their own review and the review-eligibility flag.
    pub async fn get_book(&self, claims: &UserClaims, id: Uuid) -> AppResult<BookDetail> {
        let book = self.repository.books.get_by_id(id).await?;
        let added_by = self.repository.books.creator_name(id).await?;
        let categories = self.repository.books.category_names(id).await?;

        let mut detail = BookDetail {
            book,
            added_by,
            categories,
            reviews: None,
            can_review: None,
            my_review: None,
        };

        if claims.role == Role::Public {
            detail.reviews = Some(self.repository.reviews.for_book(id).await?);
            let can_review = self.repository.history.exists(claims.user_id, id).await?;
            detail.can_review = Some(can_review);
            if can_review {
                detail.my_review = self
                    .repository
                    .reviews
                    .by_user_and_book(claims.user_id, id)
                    .await?;
            }
        }

        Ok(detail)
    }

    pub async fn create_book(&self, mut book: CreateBook, created_by: Uuid) -> AppResult<Book> {
        book.title = normalize(&book.title);
        book.author = normalize(&book.author);
        book.short_description = normalize(&book.short_description);
        book.full_description = normalize(&book.full_description);

        self.repository.books.create(&book, created_by).await
    }

    pub async fn update_book(
        &self,
        id: Uuid,
        mut book: UpdateBook,
        updated_by: &str,
    ) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await?;

        book.title = book.title.map(|s| normalize(&s));
        book.author = book.author.map(|s| normalize(&s));
        book.short_description = book.short_description.map(|s| normalize(&s));
        book.full_description = book.full_description.map(|s| normalize(&s));

        self.repository.books.update(id, &book, updated_by).await
    }

    pub async fn delete_book(&self, id: Uuid) -> AppResult<()> {
        self.repository.books.get_by_id(id).await?;
        self.repository.books.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::normalize;

    #[test]
    fn normalize_trims_and_case_folds() {
        assert_eq!(normalize("  The Hobbit  "), "the hobbit");
        assert_eq!(normalize("TOLKIEN"), "tolkien");
        assert_eq!(normalize("   "), "");
    }
}
