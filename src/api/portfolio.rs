//! Portfolio snapshot endpoints.

use axum::extract::State;

use super::{error, success, ApiResult};
use crate::models::{Portfolio, RevisionInfo};
use crate::AppState;

/// GET /api/portfolio - Artworks, tags, profile and revision in one payload.
pub async fn get_portfolio(State(state): State<AppState>) -> ApiResult<Portfolio> {
    match state.repo.get_portfolio(state.config.artist.clone()).await {
        Ok(portfolio) => {
            let revision_id = portfolio.revision_id;
            success(portfolio, revision_id)
        }
        Err(e) => error(e, 0),
    }
}

/// GET /api/portfolio/revision - Get current revision info only.
pub async fn get_revision(State(state): State<AppState>) -> ApiResult<RevisionInfo> {
    match state.repo.get_revision_info().await {
        Ok(info) => {
            let revision_id = info.revision_id;
            success(info, revision_id)
        }
        Err(e) => error(e, 0),
    }
}
