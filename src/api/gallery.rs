//! Gallery listing endpoint.

use axum::extract::State;

use super::{error, success, ApiResult};
use crate::gallery::GallerySnapshot;
use crate::AppState;

/// GET /api/gallery - Uploaded images with display titles.
pub async fn get_gallery(State(state): State<AppState>) -> ApiResult<GallerySnapshot> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.gallery.snapshot().await {
        Ok(snapshot) => success(snapshot, revision_id),
        Err(e) => error(e, revision_id),
    }
}
