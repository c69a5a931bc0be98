//! Gallery listing of the image bucket.
//!
//! The listing is rebuilt by one background task on a fixed interval and served
//! from memory. A slow refresh delays the next one instead of overlapping it.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::errors::AppError;
use crate::storage::BlobStore;

/// One image in the gallery grid.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GalleryItem {
    pub id: String,
    pub title: String,
    pub image_url: String,
}

/// The most recent listing and when it was taken.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GallerySnapshot {
    pub refreshed_at: Option<String>,
    pub items: Vec<GalleryItem>,
}

pub struct GalleryIndex {
    blobs: Arc<dyn BlobStore>,
    snapshot: RwLock<GallerySnapshot>,
}

impl GalleryIndex {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            blobs,
            snapshot: RwLock::new(GallerySnapshot {
                refreshed_at: None,
                items: Vec::new(),
            }),
        }
    }

    /// Re-list the bucket and replace the cached listing.
    pub async fn refresh(&self) -> Result<usize, AppError> {
        let entries = self.blobs.list().await?;

        let mut items = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            items.push(GalleryItem {
                id: entry.name.clone(),
                title: display_title(&entry.name, index),
                image_url: self.blobs.public_url(&entry.name)?,
            });
        }

        let count = items.len();
        *self.snapshot.write().await = GallerySnapshot {
            refreshed_at: Some(Utc::now().to_rfc3339()),
            items,
        };
        Ok(count)
    }

    /// Cached listing, refreshed first if it was never built.
    pub async fn snapshot(&self) -> Result<GallerySnapshot, AppError> {
        if self.snapshot.read().await.refreshed_at.is_none() {
            self.refresh().await?;
        }
        Ok(self.snapshot.read().await.clone())
    }

    /// Refresh the listing every `period` until the runtime shuts down.
    pub fn spawn_refresh_loop(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                match self.refresh().await {
                    Ok(count) => tracing::trace!(count, "Gallery listing refreshed"),
                    Err(e) => tracing::warn!("Failed to refresh gallery listing: {}", e),
                }
            }
        })
    }
}

/// Title shown under an image: the filename segment after the first `-`, cut
/// at its first `.`, or `Artwork <n>` when there is none.
pub fn display_title(file_name: &str, index: usize) -> String {
    file_name
        .split('-')
        .nth(1)
        .and_then(|segment| segment.split('.').next())
        .filter(|title| !title.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Artwork {}", index + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalBlobStore;
    use bytes::Bytes;
    use tempfile::TempDir;

    #[test]
    fn test_display_title() {
        assert_eq!(display_title("1700000000000-sunset.png", 0), "sunset");
        assert_eq!(display_title("a-b-c.jpg", 0), "b");
        assert_eq!(display_title("portrait.png", 2), "Artwork 3");
        assert_eq!(display_title("x-.png", 0), "Artwork 1");
    }

    #[tokio::test]
    async fn test_refresh_picks_up_new_uploads() {
        let temp_dir = TempDir::new().unwrap();
        let blobs = Arc::new(
            LocalBlobStore::open(temp_dir.path(), Some("http://localhost:8080".to_string()))
                .await
                .unwrap(),
        );
        let gallery = GalleryIndex::new(blobs.clone());

        assert!(gallery.snapshot().await.unwrap().items.is_empty());

        blobs
            .put("1700000000000-harbour.png", Bytes::from_static(b"img"))
            .await
            .unwrap();
        // Cached until the next refresh
        assert!(gallery.snapshot().await.unwrap().items.is_empty());

        assert_eq!(gallery.refresh().await.unwrap(), 1);
        let snapshot = gallery.snapshot().await.unwrap();
        assert_eq!(
            snapshot.items,
            vec![GalleryItem {
                id: "1700000000000-harbour.png".to_string(),
                title: "harbour".to_string(),
                image_url: "http://localhost:8080/storage/artwork-images/1700000000000-harbour.png"
                    .to_string(),
            }]
        );
        assert!(snapshot.refreshed_at.is_some());
    }

    #[tokio::test]
    async fn test_refresh_loop_runs() {
        let temp_dir = TempDir::new().unwrap();
        let blobs = Arc::new(
            LocalBlobStore::open(temp_dir.path(), Some("http://localhost".to_string()))
                .await
                .unwrap(),
        );
        blobs.put("1-a.png", Bytes::from_static(b"a")).await.unwrap();

        let gallery = Arc::new(GalleryIndex::new(blobs));
        let handle = gallery.clone().spawn_refresh_loop(Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        let snapshot = gallery.snapshot.read().await.clone();
        assert_eq!(snapshot.items.len(), 1);
    }
}
