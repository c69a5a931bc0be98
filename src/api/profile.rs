//! Artist profile endpoint.

use axum::extract::State;

use super::{success, ApiResult};
use crate::models::Profile;
use crate::AppState;

/// GET /api/profile - The artist shown on the portfolio page.
pub async fn get_profile(State(state): State<AppState>) -> ApiResult<Profile> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    success(state.config.artist.clone(), revision_id)
}
