//! Admin session endpoint.

use axum::{extract::State, Extension};

use super::{success, ApiResult};
use crate::models::{Session, User};
use crate::AppState;

/// GET /api/admin/session - The user behind the current admin key.
pub async fn get_session(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<User> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    success(session.user, revision_id)
}
