//! Authentication and account endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{ActivationRequest, LoginRequest, LoginResponse, PasswordChange, RegisterUser, User},
};

use super::{AuthenticatedUser, DataResponse, MessageResponse};

/// Register a new user account
#[utoipa::path(
    post,
    path = "/user/register",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = RegisterUser,
    responses(
        (status = 201, description = "User created", body = DataResponse<User>),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Not allowed"),
        (status = 409, description = "Username or email already exists")
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<RegisterUser>,
) -> AppResult<(StatusCode, Json<DataResponse<User>>)> {
    claims.require_librarian()?;
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let user = state.services.users.register(&claims, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::created(user, "User registered successfully")),
    ))
}

/// Authenticate and issue an access token
#[utoipa::path(
    post,
    path = "/user/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = DataResponse<LoginResponse>),
        (status = 403, description = "Invalid password or deactivated account"),
        (status = 404, description = "User not found")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<DataResponse<LoginResponse>>> {
    let (token, user) = state
        .services
        .users
        .authenticate(payload.user.trim(), &payload.password)
        .await?;

    let response = LoginResponse {
        user_id: user.id,
        name: user.full_name,
        role: user.role,
        access_token: token,
    };

    Ok(Json(DataResponse::ok(response, "Logged in successfully")))
}

/// Revoke the presented token
#[utoipa::path(
    delete,
    path = "/user/logout",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Token revoked", body = MessageResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn logout(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<MessageResponse>> {
    state.services.users.logout(claims.jti).await?;

    Ok(Json(MessageResponse::ok("Logged out successfully")))
}

/// Change the caller's own password
#[utoipa::path(
    put,
    path = "/user/password_change",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = PasswordChange,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 403, description = "Current password is wrong"),
        (status = 409, description = "Passwords don't match")
    )
)]
pub async fn password_change(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<PasswordChange>,
) -> AppResult<Json<MessageResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .services
        .users
        .change_password(claims.user_id, &payload)
        .await?;

    Ok(Json(MessageResponse::ok("Password changed successfully")))
}

/// Toggle a user's active flag
#[utoipa::path(
    put,
    path = "/user/activation/{id}",
    tag = "auth",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = ActivationRequest,
    responses(
        (status = 200, description = "Activation updated", body = MessageResponse),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "User not found")
    )
)]
pub async fn set_activation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ActivationRequest>,
) -> AppResult<Json<MessageResponse>> {
    claims.require_librarian()?;

    let user = state
        .services
        .users
        .set_active(&claims, id, payload.is_active)
        .await?;

    let message = if user.is_active {
        "User activated successfully"
    } else {
        "User deactivated successfully"
    };

    Ok(Json(MessageResponse::ok(message)))
}
