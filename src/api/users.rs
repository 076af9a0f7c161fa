//! User management endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{UpdateUser, User, UserQuery, UserSummary},
};

use super::{AuthenticatedUser, DataResponse, MessageResponse, PagedResponse};

/// List users with filters and pagination
#[utoipa::path(
    get,
    path = "/user",
    tag = "users",
    security(("bearer_auth" = [])),
    params(UserQuery),
    responses(
        (status = 200, description = "List of users", body = PagedResponse<UserSummary>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not allowed")
    )
)]
pub async fn list_users(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<PagedResponse<UserSummary>>> {
    claims.require_librarian()?;

    let (users, total) = state.services.users.list_users(&claims, &query).await?;

    Ok(Json(PagedResponse::ok(
        users,
        "Users retrieved successfully",
        query.page_num,
        query.per_page,
        total,
    )))
}

/// Get user details by ID
#[utoipa::path(
    get,
    path = "/user/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = DataResponse<User>),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DataResponse<User>>> {
    let user = state.services.users.get_user(&claims, id).await?;

    Ok(Json(DataResponse::ok(user, "User retrieved successfully")))
}

/// Update an existing user
#[utoipa::path(
    put,
    path = "/user/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = DataResponse<User>),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Username or email already exists")
    )
)]
pub async fn update_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUser>,
) -> AppResult<Json<DataResponse<User>>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let user = state.services.users.update_user(&claims, id, payload).await?;

    Ok(Json(DataResponse::ok(user, "User updated successfully")))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/user/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    state.services.users.delete_user(&claims, id).await?;

    Ok(Json(MessageResponse::ok("User deleted successfully")))
}
