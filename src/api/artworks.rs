//! Artwork API endpoints.
//!
//! Create and update take `multipart/form-data`: text fields named after the
//! artwork columns, repeated `tags` fields and an `image` file field.

use axum::extract::{Multipart, Path, Query, State};
use serde::Deserialize;

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{Artwork, ArtworkFormData, ArtworkStatus, ArtworkUpdate, ImageUpload};
use crate::AppState;

/// Query parameters for listing artworks.
#[derive(Debug, Deserialize)]
pub struct ListArtworksQuery {
    pub category: Option<String>,
}

/// GET /api/artworks - List artworks, newest first, optionally for one category.
///
/// `category=all` lists every artwork.
pub async fn list_artworks(
    State(state): State<AppState>,
    Query(query): Query<ListArtworksQuery>,
) -> ApiResult<Vec<Artwork>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty() && *c != "all");

    let result = match category {
        Some(category) => state.artworks.fetch_artworks_in_category(category).await,
        None => state.artworks.fetch_artworks().await,
    };

    match result {
        Ok(artworks) => success(artworks, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/artworks/{id} - Get a single artwork.
pub async fn get_artwork(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Artwork> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.artworks.fetch_artwork(&id).await {
        Ok(Some(artwork)) => success(artwork, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Artwork {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/admin/artworks - Create an artwork with its image and tags.
pub async fn create_artwork(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Artwork> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let form = match read_artwork_fields(multipart)
        .await
        .and_then(ArtworkFields::into_form)
    {
        Ok(form) => form,
        Err(e) => return error(e, revision_id),
    };

    match state.artworks.create_artwork(form).await {
        Ok(artwork) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(artwork, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/admin/artworks/{id} - Update an artwork.
pub async fn update_artwork(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Artwork> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let update = match read_artwork_fields(multipart)
        .await
        .and_then(ArtworkFields::into_update)
    {
        Ok(update) => update,
        Err(e) => return error(e, revision_id),
    };

    match state.artworks.update_artwork(&id, update).await {
        Ok(Some(artwork)) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(artwork, new_revision)
        }
        Ok(None) => error(
            AppError::NotFound(format!("Artwork {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/admin/artworks/{id} - Delete an artwork and its image.
pub async fn delete_artwork(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.artworks.delete_artwork(&id).await {
        Ok(true) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Ok(false) => error(
            AppError::NotFound(format!("Artwork {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// Raw fields of an artwork form.
#[derive(Debug, Default)]
struct ArtworkFields {
    title: Option<String>,
    category: Option<String>,
    medium: Option<String>,
    description: Option<String>,
    year: Option<String>,
    dimensions: Option<String>,
    artist: Option<String>,
    status: Option<String>,
    price: Option<String>,
    tags: Option<Vec<String>>,
    image: Option<ImageUpload>,
}

impl ArtworkFields {
    fn into_form(self) -> Result<ArtworkFormData, AppError> {
        Ok(ArtworkFormData {
            status: parse_status(self.status)?,
            title: self.title.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
            medium: self.medium.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            image: self.image,
            year: self.year,
            dimensions: self.dimensions,
            artist: self.artist,
            price: self.price,
            tags: self.tags.unwrap_or_default(),
        })
    }

    fn into_update(self) -> Result<ArtworkUpdate, AppError> {
        Ok(ArtworkUpdate {
            status: parse_status(self.status)?,
            title: self.title,
            category: self.category,
            medium: self.medium,
            description: self.description,
            image: self.image,
            year: self.year,
            dimensions: self.dimensions,
            artist: self.artist,
            price: self.price,
            tags: self.tags,
        })
    }
}

/// Collect the artwork fields from a multipart body.
async fn read_artwork_fields(mut multipart: Multipart) -> Result<ArtworkFields, AppError> {
    let mut fields = ArtworkFields::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                if let Some(image) = read_image(field).await? {
                    fields.image = Some(image);
                }
            }
            "tags" | "tags[]" => {
                let tag = field.text().await?;
                fields.tags.get_or_insert_with(Vec::new).push(tag);
            }
            "title" => fields.title = Some(field.text().await?),
            "category" => fields.category = Some(field.text().await?),
            "medium" => fields.medium = Some(field.text().await?),
            "description" => fields.description = Some(field.text().await?),
            "year" => fields.year = Some(field.text().await?),
            "dimensions" => fields.dimensions = Some(field.text().await?),
            "artist" => fields.artist = Some(field.text().await?),
            "status" => fields.status = Some(field.text().await?),
            "price" => fields.price = Some(field.text().await?),
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(fields)
}

/// Read a file field. An empty file input yields `None`.
pub(crate) async fn read_image(
    field: axum::extract::multipart::Field<'_>,
) -> Result<Option<ImageUpload>, AppError> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await?;

    if bytes.is_empty() {
        return Ok(None);
    }

    Ok(Some(ImageUpload {
        file_name,
        content_type,
        bytes,
    }))
}

fn parse_status(raw: Option<String>) -> Result<Option<ArtworkStatus>, AppError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => ArtworkStatus::parse(value)
            .map(Some)
            .ok_or_else(|| AppError::Validation(format!("Unknown status {:?}", value))),
    }
}
