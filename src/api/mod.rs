//! API handlers for the Libris REST endpoints

pub mod auth;
pub mod books;
pub mod categories;
pub mod health;
pub mod history;
pub mod openapi;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Login required".to_string()))?;

        if !auth_header.starts_with("Bearer ") {
            return Err(AppError::Unauthorized(
                "Invalid authorization header format".to_string(),
            ));
        }

        let token = &auth_header[7..];

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|_| AppError::Unauthorized("Login required".to_string()))?;

        // Logout and deletion revoke tokens server side, so every request
        // checks the revocation list in addition to the signature.
        if state.services.users.is_token_revoked(claims.jti).await? {
            return Err(AppError::Unauthorized("Token has been revoked".to_string()));
        }

        Ok(AuthenticatedUser(claims))
    }
}

/// Mutation response body: `{code, message, status}`
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub code: u16,
    pub message: String,
    pub status: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            code: 200,
            message: message.into(),
            status: "OK".to_string(),
        }
    }

    pub fn created(message: impl Into<String>) -> Self {
        Self {
            code: 201,
            message: message.into(),
            status: "CREATED".to_string(),
        }
    }
}

/// Single item response body: `{code, data, message, status}`
#[derive(Serialize, ToSchema)]
pub struct DataResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub code: u16,
    pub data: T,
    pub message: String,
    pub status: String,
}

impl<T: Serialize + for<'a> ToSchema<'a>> DataResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            code: 200,
            data,
            message: message.into(),
            status: "OK".to_string(),
        }
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self {
            code: 201,
            data,
            message: message.into(),
            status: "CREATED".to_string(),
        }
    }
}

/// Paginated list response body with previous/next page pointers
#[derive(Serialize, ToSchema)]
pub struct PagedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub code: u16,
    pub data: Vec<T>,
    pub message: String,
    pub status: String,
    pub previous: Option<i64>,
    pub next: Option<i64>,
    pub total: i64,
}

impl<T: Serialize + for<'a> ToSchema<'a>> PagedResponse<T> {
    pub fn ok(
        data: Vec<T>,
        message: impl Into<String>,
        page_num: Option<i64>,
        per_page: Option<i64>,
        total: i64,
    ) -> Self {
        let (previous, next) = page_links(page_num, per_page, total);
        Self {
            code: 200,
            data,
            message: message.into(),
            status: "OK".to_string(),
            previous,
            next,
            total,
        }
    }
}

/// Previous/next page numbers for a result set of `total` rows
fn page_links(page_num: Option<i64>, per_page: Option<i64>, total: i64) -> (Option<i64>, Option<i64>) {
    let page = page_num.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(10).clamp(1, 100);

    let previous = (page > 1).then(|| page - 1);
    let next = (page * per_page < total).then(|| page + 1);

    (previous, next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_links_first_page() {
        assert_eq!(page_links(Some(1), Some(10), 25), (None, Some(2)));
    }

    #[test]
    fn test_page_links_middle_page() {
        assert_eq!(page_links(Some(2), Some(10), 25), (Some(1), Some(3)));
    }

    #[test]
    fn test_page_links_last_page() {
        assert_eq!(page_links(Some(3), Some(10), 25), (Some(2), None));
    }

    #[test]
    fn test_page_links_defaults() {
        assert_eq!(page_links(None, None, 5), (None, None));
    }

    #[test]
    fn test_page_links_exact_boundary() {
        // 20 rows at 10 per page means page 2 is the last one
        assert_eq!(page_links(Some(2), Some(10), 20), (Some(1), None));
    }
}
