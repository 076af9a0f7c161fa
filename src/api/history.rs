//! Audit trail endpoint

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::history::{HistoryEntry, HistoryQuery},
};

use super::{AuthenticatedUser, PagedResponse};

/// Search the borrow/return audit trail. Public callers only see their
/// own entries.
#[utoipa::path(
    get,
    path = "/history",
    tag = "history",
    security(("bearer_auth" = [])),
    params(HistoryQuery),
    responses(
        (status = 200, description = "History entries", body = PagedResponse<HistoryEntry>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn search_history(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<PagedResponse<HistoryEntry>>> {
    let (entries, total) = state.services.history.search(&claims, &query).await?;

    Ok(Json(PagedResponse::ok(
        entries,
        "History retrieved successfully",
        query.page_num,
        query.per_page,
        total,
    )))
}
