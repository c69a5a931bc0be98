//! Standalone image upload endpoint.

use axum::extract::{Multipart, State};
use serde::Serialize;

use super::{artworks::read_image, error, success, ApiResult};
use crate::errors::AppError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct UploadedImage {
    pub url: String,
}

/// POST /api/admin/uploads - Store the `image` field and return its public URL.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<UploadedImage> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let mut image = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return error(e.into(), revision_id),
        };
        if field.name() != Some("image") {
            continue;
        }
        match read_image(field).await {
            Ok(found) => image = found,
            Err(e) => return error(e, revision_id),
        }
    }

    let Some(image) = image else {
        return error(
            AppError::Validation("Please select an image".to_string()),
            revision_id,
        );
    };

    match state.artworks.upload_image(&image).await {
        Ok(url) => success(UploadedImage { url }, revision_id),
        Err(e) => error(e, revision_id),
    }
}
