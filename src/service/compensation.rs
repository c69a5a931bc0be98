//! Undo actions for multi-step artwork writes.
//!
//! Each step of a create or update that changes backend state records how to
//! reverse itself. When a later step fails the log is unwound newest first.

use crate::db::ArtworkStore;
use crate::errors::AppError;
use crate::models::ArtworkRecord;
use crate::storage::BlobStore;

#[derive(Debug, Clone)]
pub(crate) enum Compensation {
    /// Remove a freshly uploaded image.
    RemoveBlob(String),
    /// Delete a freshly inserted artwork row (links cascade).
    DeleteArtwork(String),
    /// Delete tags created by this operation.
    DeleteTags(Vec<String>),
    /// Put back the column values an update overwrote.
    RestoreArtwork { id: String, record: ArtworkRecord },
    /// Put back the links an update removed.
    RestoreLinks {
        artwork_id: String,
        tag_ids: Vec<String>,
    },
}

impl Compensation {
    async fn run(&self, store: &dyn ArtworkStore, blobs: &dyn BlobStore) -> Result<(), AppError> {
        match self {
            Compensation::RemoveBlob(name) => blobs.remove(name).await,
            Compensation::DeleteArtwork(id) => store.delete_artwork(id).await.map(|_| ()),
            Compensation::DeleteTags(ids) => store.delete_tags(ids).await,
            Compensation::RestoreArtwork { id, record } => {
                store.update_artwork(id, record).await.map(|_| ())
            }
            Compensation::RestoreLinks {
                artwork_id,
                tag_ids,
            } => {
                store.unlink_all_tags(artwork_id).await?;
                store.link_tags(artwork_id, tag_ids).await
            }
        }
    }
}

/// Ordered record of what to undo if the current operation fails.
#[derive(Debug, Default)]
pub(crate) struct CompensationLog {
    actions: Vec<Compensation>,
}

impl CompensationLog {
    pub(crate) fn push(&mut self, action: Compensation) {
        self.actions.push(action);
    }

    /// Run every recorded action newest first and return how many failed.
    ///
    /// A failing action is logged and does not stop the remaining ones.
    pub(crate) async fn unwind(self, store: &dyn ArtworkStore, blobs: &dyn BlobStore) -> usize {
        let mut failures = 0;
        for action in self.actions.into_iter().rev() {
            if let Err(e) = action.run(store, blobs).await {
                failures += 1;
                tracing::error!(?action, error = %e, "Compensation failed, backend may be inconsistent");
            } else {
                tracing::debug!(?action, "Compensation applied");
            }
        }
        failures
    }
}
