//! Category management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::category::{Category, CategoryDetail, CategoryQuery, CategoryRequest, CategorySummary},
};

use super::{AuthenticatedUser, DataResponse, MessageResponse, PagedResponse};

/// List categories with pagination
#[utoipa::path(
    get,
    path = "/category",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(CategoryQuery),
    responses(
        (status = 200, description = "List of categories", body = PagedResponse<CategorySummary>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_categories(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<CategoryQuery>,
) -> AppResult<Json<PagedResponse<CategorySummary>>> {
    let (categories, total) = state
        .services
        .catalog
        .list_categories(query.page_num, query.per_page)
        .await?;

    Ok(Json(PagedResponse::ok(
        categories,
        "Categories retrieved successfully",
        query.page_num,
        query.per_page,
        total,
    )))
}

/// Create a new category
#[utoipa::path(
    post,
    path = "/category",
    tag = "categories",
    security(("bearer_auth" = [])),
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created", body = DataResponse<Category>),
        (status = 400, description = "Category name missing"),
        (status = 403, description = "Not allowed"),
        (status = 409, description = "Category already exists")
    )
)]
pub async fn create_category(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<CategoryRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Category>>)> {
    claims.require_librarian()?;
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let category = state
        .services
        .catalog
        .create_category(&payload.name, claims.user_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::created(category, "Category added successfully")),
    ))
}

/// Get category details by ID
#[utoipa::path(
    get,
    path = "/category/{id}",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category details", body = DataResponse<CategoryDetail>),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Category not found")
    )
)]
pub async fn get_category(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DataResponse<CategoryDetail>>> {
    claims.require_librarian()?;

    let category = state.services.catalog.get_category(id).await?;

    Ok(Json(DataResponse::ok(
        category,
        "Category retrieved successfully",
    )))
}

/// Rename a category
#[utoipa::path(
    put,
    path = "/category/{id}",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = DataResponse<Category>),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Category already exists")
    )
)]
pub async fn update_category(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryRequest>,
) -> AppResult<Json<DataResponse<Category>>> {
    claims.require_librarian()?;
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let category = state
        .services
        .catalog
        .update_category(id, &payload.name, &claims.sub)
        .await?;

    Ok(Json(DataResponse::ok(category, "Category updated successfully")))
}

/// Delete a category
#[utoipa::path(
    delete,
    path = "/category/{id}",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category deleted", body = MessageResponse),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Category not found")
    )
)]
pub async fn delete_category(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    claims.require_librarian()?;

    state.services.catalog.delete_category(id).await?;

    Ok(Json(MessageResponse::ok("Category deleted successfully")))
}
