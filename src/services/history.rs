//! History service: borrow/return audit trail queries

use crate::{
    error::AppResult,
    models::{
        history::{HistoryEntry, HistoryQuery},
        user::{Role, UserClaims},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct HistoryService {
    repository: Repository,
}

impl HistoryService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search the audit trail. Public callers only see their own entries;
    /// staff see everything that matches the filters.
    pub async fn search(
        &self,
        claims: &UserClaims,
        query: &HistoryQuery,
    ) -> AppResult<(Vec<HistoryEntry>, i64)> {
        let restrict_user = (claims.role == Role::Public).then_some(claims.user_id);
        self.repository.history.search(query, restrict_user).await
    }
}
