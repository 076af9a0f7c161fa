//! Circulation service: borrow, return, and review state transitions

use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::BorrowedBook,
        review::{Review, ReviewRequest},
        user::UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CirculationService {
    repository: Repository,
}

impl CirculationService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Borrow a book for the caller
    pub async fn borrow(&self, claims: &UserClaims, book_id: Uuid) -> AppResult<()> {
        let user = self.repository.users.get_by_id(claims.user_id).await?;
        let book = self.repository.books.get_by_id(book_id).await?;

        self.repository
            .loans
            .borrow(user.id, book.id, &user.username, &book.title)
            .await
    }

    /// Return a book held by the caller
    pub async fn return_book(&self, claims: &UserClaims, book_id: Uuid) -> AppResult<()> {
        let user = self.repository.users.get_by_id(claims.user_id).await?;
        let book = self.repository.books.get_by_id(book_id).await?;

        self.repository
            .loans
            .return_book(user.id, book.id, &user.username, &book.title)
            .await
    }

    /// Create a review. Eligibility requires at least one borrow event for
    /// the pair; the unique (user, book) constraint rejects a second review.
    pub async fn create_review(
        &self,
        claims: &UserClaims,
        book_id: Uuid,
        req: &ReviewRequest,
    ) -> AppResult<Review> {
        self.repository.books.get_by_id(book_id).await?;

        if !self.repository.history.exists(claims.user_id, book_id).await? {
            return Err(AppError::Forbidden(
                "Since you never borrowed this book, you are not allowed to review it".to_string(),
            ));
        }

        self.repository
            .reviews
            .create(claims.user_id, book_id, req.rating, req.review.trim())
            .await
    }

    /// Edit a review. Only the author may edit their own review.
    pub async fn update_review(
        &self,
        claims: &UserClaims,
        review_id: Uuid,
        req: &ReviewRequest,
    ) -> AppResult<Review> {
        let review = self.repository.reviews.get_by_id(review_id).await?;

        if review.user_id != claims.user_id {
            return Err(AppError::Forbidden(
                "You can only edit your own review".to_string(),
            ));
        }

        self.repository
            .reviews
            .update(review_id, req.rating, req.review.trim())
            .await
    }

    /// The caller's currently borrowed books with their own review per book
    pub async fn my_books(
        &self,
        claims: &UserClaims,
        page_num: Option<i64>,
        per_page: Option<i64>,
    ) -> AppResult<(Vec<BorrowedBook>, i64)> {
        let (books, total) = self
            .repository
            .books
            .borrowed_by(claims.user_id, page_num, per_page)
            .await?;

        let mut my_reviews: HashMap<Uuid, Review> = self
            .repository
            .reviews
            .by_user(claims.user_id)
            .await?
            .into_iter()
            .map(|r| (r.book_id, r))
            .collect();

        let borrowed = books
            .into_iter()
            .map(|b| BorrowedBook {
                my_review: my_reviews.remove(&b.id),
                id: b.id,
                title: b.title,
            })
            .collect();

        Ok((borrowed, total))
    }
}
