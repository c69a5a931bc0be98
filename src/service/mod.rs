//! Artwork service.
//!
//! Translates portfolio operations into store and bucket calls: uploads images
//! under generated names, resolves tag names into existing or new tags, and
//! keeps the artwork/tag links in step. The service keeps no domain state; the
//! only thing it owns is a lock that serializes writes.

mod compensation;

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::ArtworkStore;
use crate::errors::AppError;
use crate::models::{normalize_tag_names, Artwork, ArtworkFormData, ArtworkUpdate, ImageUpload, Tag};
use crate::storage::{generate_object_name, object_name_from_url, BlobStore};

use compensation::{Compensation, CompensationLog};

pub struct ArtworkService {
    store: Arc<dyn ArtworkStore>,
    blobs: Arc<dyn BlobStore>,
    /// Held across create/update/delete so tag partitioning and relinking
    /// never interleave.
    writes: Mutex<()>,
}

impl ArtworkService {
    pub fn new(store: Arc<dyn ArtworkStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            blobs,
            writes: Mutex::new(()),
        }
    }

    /// All artworks, newest first.
    pub async fn fetch_artworks(&self) -> Result<Vec<Artwork>, AppError> {
        self.store.list_artworks().await
    }

    /// Artworks whose category matches exactly, newest first.
    pub async fn fetch_artworks_in_category(
        &self,
        category: &str,
    ) -> Result<Vec<Artwork>, AppError> {
        let mut artworks = self.store.list_artworks().await?;
        artworks.retain(|artwork| artwork.category == category);
        Ok(artworks)
    }

    pub async fn fetch_artwork(&self, id: &str) -> Result<Option<Artwork>, AppError> {
        self.store.get_artwork(id).await
    }

    /// All tags ordered by name.
    pub async fn fetch_tags(&self) -> Result<Vec<Tag>, AppError> {
        self.store.list_tags().await
    }

    /// Create a tag. An existing tag with the same name is returned as is.
    pub async fn create_tag(&self, name: &str) -> Result<Tag, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Tag name is required".to_string()));
        }

        let _guard = self.writes.lock().await;
        self.store
            .insert_tags(&[name.to_string()])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal(format!("Tag {:?} was not stored", name)))
    }

    /// Store an image under a generated name and return its public URL.
    pub async fn upload_image(&self, image: &ImageUpload) -> Result<String, AppError> {
        image.validate()?;
        let (_, url) = self.store_image(image).await?;
        Ok(url)
    }

    /// Create an artwork with its image and tags.
    ///
    /// Input is validated before anything reaches the backend. If any later
    /// step fails, the steps already taken are undone.
    pub async fn create_artwork(&self, form: ArtworkFormData) -> Result<Artwork, AppError> {
        form.validate()?;

        let _guard = self.writes.lock().await;
        let mut undo = CompensationLog::default();

        match self.create_steps(&form, &mut undo).await {
            Ok(artwork) => {
                tracing::info!(id = %artwork.id, title = %artwork.title, "Created artwork");
                Ok(artwork)
            }
            Err(e) => {
                tracing::error!("Error creating artwork: {}", e);
                undo.unwind(self.store.as_ref(), self.blobs.as_ref()).await;
                Err(e)
            }
        }
    }

    async fn create_steps(
        &self,
        form: &ArtworkFormData,
        undo: &mut CompensationLog,
    ) -> Result<Artwork, AppError> {
        let image = form
            .image
            .as_ref()
            .ok_or_else(|| AppError::Validation("Please select an image".to_string()))?;

        let (object_name, url) = self.store_image(image).await?;
        undo.push(Compensation::RemoveBlob(object_name));

        let id = self.store.insert_artwork(&form.record(url)).await?;
        undo.push(Compensation::DeleteArtwork(id.clone()));

        let tag_ids = self
            .resolve_tags(&normalize_tag_names(&form.tags), undo)
            .await?;
        self.store.link_tags(&id, &tag_ids).await?;

        self.store
            .get_artwork(&id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Artwork {} missing after insert", id)))
    }

    /// Apply a partial update. Returns `None` if the artwork does not exist.
    ///
    /// A new image replaces the stored URL; the previous image stays in the
    /// bucket. Links are rebuilt only when a non-empty tag list is supplied.
    pub async fn update_artwork(
        &self,
        id: &str,
        update: ArtworkUpdate,
    ) -> Result<Option<Artwork>, AppError> {
        update.validate()?;

        let _guard = self.writes.lock().await;
        let Some(current) = self.store.get_artwork(id).await? else {
            return Ok(None);
        };
        let mut undo = CompensationLog::default();

        match self.update_steps(&current, &update, &mut undo).await {
            Ok(artwork) => {
                tracing::info!(id = %artwork.id, "Updated artwork");
                Ok(Some(artwork))
            }
            Err(e) => {
                tracing::error!("Error updating artwork {}: {}", id, e);
                undo.unwind(self.store.as_ref(), self.blobs.as_ref()).await;
                Err(e)
            }
        }
    }

    async fn update_steps(
        &self,
        current: &Artwork,
        update: &ArtworkUpdate,
        undo: &mut CompensationLog,
    ) -> Result<Artwork, AppError> {
        let image_url = match &update.image {
            Some(image) => {
                let (object_name, url) = self.store_image(image).await?;
                undo.push(Compensation::RemoveBlob(object_name));
                Some(url)
            }
            None => None,
        };

        let previous = current.record();
        let next = update.apply(&previous, image_url);
        if next != previous {
            if !self.store.update_artwork(&current.id, &next).await? {
                return Err(AppError::NotFound(format!("Artwork {} not found", current.id)));
            }
            undo.push(Compensation::RestoreArtwork {
                id: current.id.clone(),
                record: previous,
            });
        }

        let tag_names = update
            .tags
            .as_deref()
            .map(|names| normalize_tag_names(names))
            .unwrap_or_default();

        if !tag_names.is_empty() {
            let previous_links = self.store.linked_tag_ids(&current.id).await?;
            self.store.unlink_all_tags(&current.id).await?;
            undo.push(Compensation::RestoreLinks {
                artwork_id: current.id.clone(),
                tag_ids: previous_links,
            });

            let tag_ids = self.resolve_tags(&tag_names, undo).await?;
            self.store.link_tags(&current.id, &tag_ids).await?;
        }

        self.store
            .get_artwork(&current.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Artwork {} not found", current.id)))
    }

    /// Delete an artwork and, best effort, its image.
    ///
    /// The result reflects only whether a row was deleted; a failing image
    /// removal is logged and otherwise ignored.
    pub async fn delete_artwork(&self, id: &str) -> Result<bool, AppError> {
        let _guard = self.writes.lock().await;

        let existing = self.store.get_artwork(id).await?;
        if !self.store.delete_artwork(id).await? {
            return Ok(false);
        }

        if let Some(object_name) = existing.as_ref().and_then(|a| object_name_from_url(&a.image)) {
            if let Err(e) = self.blobs.remove(object_name).await {
                tracing::warn!(id, object = object_name, error = %e, "Failed to remove artwork image");
            }
        }

        tracing::info!(id, "Deleted artwork");
        Ok(true)
    }

    async fn store_image(&self, image: &ImageUpload) -> Result<(String, String), AppError> {
        let object_name = generate_object_name(&image.file_name);
        // Fails before the upload when no public URL is configured.
        let url = self.blobs.public_url(&object_name)?;
        self.blobs.put(&object_name, image.bytes.clone()).await?;

        tracing::info!(object = %object_name, size = image.bytes.len(), "Uploaded artwork image");
        Ok((object_name, url))
    }

    /// Split names into existing and new tags, create the new ones and return
    /// the ids of both.
    async fn resolve_tags(
        &self,
        names: &[String],
        undo: &mut CompensationLog,
    ) -> Result<Vec<String>, AppError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let existing = self.store.find_tags_by_name(names).await?;
        let new_names: Vec<String> = names
            .iter()
            .filter(|name| !existing.iter().any(|tag| &tag.name == *name))
            .cloned()
            .collect();

        let created = if new_names.is_empty() {
            Vec::new()
        } else {
            self.store.insert_tags(&new_names).await?
        };
        if !created.is_empty() {
            undo.push(Compensation::DeleteTags(
                created.iter().map(|tag| tag.id.clone()).collect(),
            ));
        }

        tracing::debug!(
            existing = existing.len(),
            created = created.len(),
            "Resolved artwork tags"
        );

        Ok(existing
            .iter()
            .chain(created.iter())
            .map(|tag| tag.id.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests;
