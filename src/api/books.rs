//! Catalog and circulation endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookDetail, BookQuery, BookSummary, BorrowedBook, CreateBook, UpdateBook},
        review::{Review, ReviewRequest},
    },
};

use super::{AuthenticatedUser, DataResponse, MessageResponse, PagedResponse};

/// Pagination-only query parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PageQuery {
    pub page_num: Option<i64>,
    pub per_page: Option<i64>,
}

/// List books with filters and pagination
#[utoipa::path(
    get,
    path = "/book",
    tag = "books",
    security(("bearer_auth" = [])),
    params(BookQuery),
    responses(
        (status = 200, description = "List of books", body = PagedResponse<BookSummary>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<PagedResponse<BookSummary>>> {
    let (books, total) = state
        .services
        .catalog
        .search_books(claims.role, &query)
        .await?;

    Ok(Json(PagedResponse::ok(
        books,
        "Books retrieved successfully",
        query.page_num,
        query.per_page,
        total,
    )))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/book",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = DataResponse<Book>),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Not allowed"),
        (status = 409, description = "Book already exists")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<DataResponse<Book>>)> {
    claims.require_librarian()?;
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let book = state
        .services
        .catalog
        .create_book(payload, claims.user_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::created(book, "Book added successfully")),
    ))
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/book/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = DataResponse<BookDetail>),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DataResponse<BookDetail>>> {
    let book = state.services.catalog.get_book(&claims, id).await?;

    Ok(Json(DataResponse::ok(book, "Book retrieved successfully")))
}

/// Update an existing book
#[utoipa::path(
    put,
    path = "/book/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = DataResponse<Book>),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book already exists")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBook>,
) -> AppResult<Json<DataResponse<Book>>> {
    claims.require_librarian()?;
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let book = state
        .services
        .catalog
        .update_book(id, payload, &claims.sub)
        .await?;

    Ok(Json(DataResponse::ok(book, "Book updated successfully")))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/book/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    claims.require_librarian()?;

    state.services.catalog.delete_book(id).await?;

    Ok(Json(MessageResponse::ok("Book deleted successfully")))
}

/// Borrow a book
#[utoipa::path(
    get,
    path = "/book/borrow/{id}",
    tag = "circulation",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book borrowed", body = MessageResponse),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Already borrowed or no copies left")
    )
)]
pub async fn borrow_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    state.services.circulation.borrow(&claims, id).await?;

    Ok(Json(MessageResponse::ok("Book borrowed successfully")))
}

/// Return a borrowed book
#[utoipa::path(
    get,
    path = "/book/return/{id}",
    tag = "circulation",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = MessageResponse),
        (status = 403, description = "Book not borrowed yet"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    state.services.circulation.return_book(&claims, id).await?;

    Ok(Json(MessageResponse::ok("Book returned successfully")))
}

/// Review a book. Requires at least one past borrow of the book.
#[utoipa::path(
    post,
    path = "/book/review/{id}",
    tag = "circulation",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    request_body = ReviewRequest,
    responses(
        (status = 201, description = "Review created", body = DataResponse<Review>),
        (status = 403, description = "Never borrowed this book"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Already reviewed this book")
    )
)]
pub async fn create_review(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Review>>)> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let review = state
        .services
        .circulation
        .create_review(&claims, id, &payload)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::created(review, "Review added successfully")),
    ))
}

/// Edit the caller's own review
#[utoipa::path(
    put,
    path = "/book/review/{id}",
    tag = "circulation",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Review ID")
    ),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Review updated", body = DataResponse<Review>),
        (status = 403, description = "Not the review owner"),
        (status = 404, description = "Review not found")
    )
)]
pub async fn update_review(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewRequest>,
) -> AppResult<Json<DataResponse<Review>>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let review = state
        .services
        .circulation
        .update_review(&claims, id, &payload)
        .await?;

    Ok(Json(DataResponse::ok(review, "Review updated successfully")))
}

/// The caller's currently borrowed books with their own review per book
#[utoipa::path(
    get,
    path = "/my_books",
    tag = "circulation",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Borrowed books", body = PagedResponse<BorrowedBook>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn my_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PagedResponse<BorrowedBook>>> {
    let (books, total) = state
        .services
        .circulation
        .my_books(&claims, query.page_num, query.per_page)
        .await?;

    Ok(Json(PagedResponse::ok(
        books,
        "Borrowed books retrieved successfully",
        query.page_num,
        query.per_page,
        total,
    )))
}
