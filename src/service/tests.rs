//! Tests for the artwork service against a real SQLite store and bucket.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tempfile::TempDir;

use super::ArtworkService;
use crate::db::{init_database, ArtworkStore, Repository};
use crate::errors::AppError;
use crate::models::{Artwork, ArtworkFormData, ArtworkRecord, ArtworkUpdate, ImageUpload, Tag};
use crate::storage::{BlobEntry, BlobStore, LocalBlobStore};

/// Store wrapper that records calls and can fail the next call of one operation.
struct RecordingStore {
    inner: Repository,
    calls: Mutex<Vec<&'static str>>,
    inserted_tag_names: Mutex<Vec<Vec<String>>>,
    fail_on: Mutex<Option<&'static str>>,
}

impl RecordingStore {
    fn record(&self, op: &'static str) -> Result<(), AppError> {
        self.calls.lock().unwrap().push(op);
        let mut fail_on = self.fail_on.lock().unwrap();
        if *fail_on == Some(op) {
            *fail_on = None;
            return Err(AppError::Database(format!("injected failure in {}", op)));
        }
        Ok(())
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn reset(&self) {
        self.calls.lock().unwrap().clear();
        self.inserted_tag_names.lock().unwrap().clear();
    }

    fn fail_on(&self, op: &'static str) {
        *self.fail_on.lock().unwrap() = Some(op);
    }
}

#[async_trait]
impl ArtworkStore for RecordingStore {
    async fn list_artworks(&self) -> Result<Vec<Artwork>, AppError> {
        self.record("list_artworks")?;
        self.inner.list_artworks().await
    }

    async fn get_artwork(&self, id: &str) -> Result<Option<Artwork>, AppError> {
        self.record("get_artwork")?;
        self.inner.get_artwork(id).await
    }

    async fn insert_artwork(&self, record: &ArtworkRecord) -> Result<String, AppError> {
        self.record("insert_artwork")?;
        self.inner.insert_artwork(record).await
    }

    async fn update_artwork(&self, id: &str, record: &ArtworkRecord) -> Result<bool, AppError> {
        self.record("update_artwork")?;
        self.inner.update_artwork(id, record).await
    }

    async fn delete_artwork(&self, id: &str) -> Result<bool, AppError> {
        self.record("delete_artwork")?;
        self.inner.delete_artwork(id).await
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, AppError> {
        self.record("list_tags")?;
        self.inner.list_tags().await
    }

    async fn find_tags_by_name(&self, names: &[String]) -> Result<Vec<Tag>, AppError> {
        self.record("find_tags_by_name")?;
        self.inner.find_tags_by_name(names).await
    }

    async fn insert_tags(&self, names: &[String]) -> Result<Vec<Tag>, AppError> {
        self.record("insert_tags")?;
        self.inserted_tag_names.lock().unwrap().push(names.to_vec());
        self.inner.insert_tags(names).await
    }

    async fn delete_tags(&self, ids: &[String]) -> Result<(), AppError> {
        self.record("delete_tags")?;
        self.inner.delete_tags(ids).await
    }

    async fn linked_tag_ids(&self, artwork_id: &str) -> Result<Vec<String>, AppError> {
        self.record("linked_tag_ids")?;
        self.inner.linked_tag_ids(artwork_id).await
    }

    async fn link_tags(&self, artwork_id: &str, tag_ids: &[String]) -> Result<(), AppError> {
        self.record("link_tags")?;
        self.inner.link_tags(artwork_id, tag_ids).await
    }

    async fn unlink_all_tags(&self, artwork_id: &str) -> Result<(), AppError> {
        self.record("unlink_all_tags")?;
        self.inner.unlink_all_tags(artwork_id).await
    }
}

/// Bucket wrapper whose uploads and removals can be made to fail.
struct FlakyBlobs {
    inner: LocalBlobStore,
    puts: AtomicUsize,
    fail_put: AtomicBool,
    fail_remove: AtomicBool,
}

#[async_trait]
impl BlobStore for FlakyBlobs {
    async fn put(&self, name: &str, bytes: Bytes) -> Result<(), AppError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(AppError::Storage("injected upload failure".to_string()));
        }
        self.inner.put(name, bytes).await
    }

    async fn remove(&self, name: &str) -> Result<(), AppError> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(AppError::Storage("injected remove failure".to_string()));
        }
        self.inner.remove(name).await
    }

    async fn list(&self) -> Result<Vec<BlobEntry>, AppError> {
        self.inner.list().await
    }

    fn public_url(&self, name: &str) -> Result<String, AppError> {
        self.inner.public_url(name)
    }
}

struct Harness {
    service: ArtworkService,
    store: Arc<RecordingStore>,
    blobs: Arc<FlakyBlobs>,
    _temp_dir: TempDir,
}

impl Harness {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pool = init_database(&temp_dir.path().join("test.sqlite"))
            .await
            .expect("Failed to init DB");

        let store = Arc::new(RecordingStore {
            inner: Repository::new(pool),
            calls: Mutex::new(Vec::new()),
            inserted_tag_names: Mutex::new(Vec::new()),
            fail_on: Mutex::new(None),
        });
        let blobs = Arc::new(FlakyBlobs {
            inner: LocalBlobStore::open(
                &temp_dir.path().join("storage"),
                Some("http://localhost:8080".to_string()),
            )
            .await
            .expect("Failed to open bucket"),
            puts: AtomicUsize::new(0),
            fail_put: AtomicBool::new(false),
            fail_remove: AtomicBool::new(false),
        });

        let service = ArtworkService::new(store.clone(), blobs.clone());

        Harness {
            service,
            store,
            blobs,
            _temp_dir: temp_dir,
        }
    }

    async fn blob_count(&self) -> usize {
        self.blobs.list().await.unwrap().len()
    }
}

fn image(name: &str) -> ImageUpload {
    ImageUpload {
        file_name: name.to_string(),
        content_type: Some("image/png".to_string()),
        bytes: Bytes::from_static(b"\x89PNG fake"),
    }
}

fn form(title: &str, tags: &[&str]) -> ArtworkFormData {
    ArtworkFormData {
        title: title.to_string(),
        category: "Painting".to_string(),
        medium: "Oil on canvas".to_string(),
        description: "Night over the harbour".to_string(),
        image: Some(image("moon.png")),
        year: Some("2024".to_string()),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        ..Default::default()
    }
}

fn tag_names(artwork: &Artwork) -> Vec<&str> {
    artwork.tags.iter().map(|t| t.name.as_str()).collect()
}

#[tokio::test]
async fn test_create_without_image_never_reaches_backend() {
    let h = Harness::new().await;
    let mut data = form("Moonlight", &["blue"]);
    data.image = None;

    let err = h.service.create_artwork(data).await.unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert!(h.store.calls().is_empty());
    assert_eq!(h.blobs.puts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_create_links_existing_and_new_tags() {
    let h = Harness::new().await;
    h.service.create_tag("blue").await.unwrap();
    h.store.reset();

    let artwork = h
        .service
        .create_artwork(form("Moonlight", &["blue", "night"]))
        .await
        .unwrap();

    assert_eq!(tag_names(&artwork), vec!["blue", "night"]);
    assert_eq!(
        *h.store.inserted_tag_names.lock().unwrap(),
        vec![vec!["night".to_string()]]
    );
    assert_eq!(
        h.store.inner.linked_tag_ids(&artwork.id).await.unwrap().len(),
        2
    );

    let fetched = h.service.fetch_artwork(&artwork.id).await.unwrap().unwrap();
    assert_eq!(tag_names(&fetched), vec!["blue", "night"]);
    assert_eq!(h.service.fetch_tags().await.unwrap().len(), 2);
    assert!(fetched.image.starts_with("http://localhost:8080/storage/artwork-images/"));
    assert!(fetched.image.ends_with(".png"));
    assert_eq!(h.blob_count().await, 1);
}

#[tokio::test]
async fn test_create_links_repeated_name_once() {
    let h = Harness::new().await;

    let artwork = h
        .service
        .create_artwork(form("Echo", &["blue", "blue", " blue "]))
        .await
        .unwrap();

    assert_eq!(tag_names(&artwork), vec!["blue"]);
    assert_eq!(h.service.fetch_tags().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_with_empty_tags_leaves_links() {
    let h = Harness::new().await;
    let artwork = h
        .service
        .create_artwork(form("Dawn", &["sun"]))
        .await
        .unwrap();
    h.store.reset();

    let update = ArtworkUpdate {
        title: Some("Dawn II".to_string()),
        tags: Some(Vec::new()),
        ..Default::default()
    };
    let updated = h
        .service
        .update_artwork(&artwork.id, update)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.title, "Dawn II");
    assert_eq!(tag_names(&updated), vec!["sun"]);
    let calls = h.store.calls();
    assert!(!calls.contains(&"unlink_all_tags"));
    assert!(!calls.contains(&"link_tags"));
}

#[tokio::test]
async fn test_update_replaces_tag_set() {
    let h = Harness::new().await;
    let artwork = h
        .service
        .create_artwork(form("Tide", &["sea", "blue"]))
        .await
        .unwrap();

    let update = ArtworkUpdate {
        tags: Some(vec!["blue".to_string(), "storm".to_string()]),
        ..Default::default()
    };
    let updated = h
        .service
        .update_artwork(&artwork.id, update)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(tag_names(&updated), vec!["blue", "storm"]);
    // "sea" is orphaned but kept
    let all: Vec<String> = h
        .service
        .fetch_tags()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(all, vec!["blue", "sea", "storm"]);
}

#[tokio::test]
async fn test_update_with_new_image_keeps_old_blob() {
    let h = Harness::new().await;
    let artwork = h
        .service
        .create_artwork(form("Field", &[]))
        .await
        .unwrap();

    let update = ArtworkUpdate {
        image: Some(image("field-v2.jpg")),
        ..Default::default()
    };
    let updated = h
        .service
        .update_artwork(&artwork.id, update)
        .await
        .unwrap()
        .unwrap();

    assert_ne!(updated.image, artwork.image);
    assert!(updated.image.ends_with(".jpg"));
    assert_eq!(h.blob_count().await, 2);
}

#[tokio::test]
async fn test_update_unknown_artwork_returns_none() {
    let h = Harness::new().await;
    let update = ArtworkUpdate {
        image: Some(image("ghost.png")),
        ..Default::default()
    };

    let result = h.service.update_artwork("missing", update).await.unwrap();

    assert!(result.is_none());
    assert_eq!(h.blobs.puts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_delete_succeeds_when_image_removal_fails() {
    let h = Harness::new().await;
    let artwork = h
        .service
        .create_artwork(form("Fading", &["grey"]))
        .await
        .unwrap();
    h.blobs.fail_remove.store(true, Ordering::SeqCst);

    assert!(h.service.delete_artwork(&artwork.id).await.unwrap());
    assert!(h.service.fetch_artwork(&artwork.id).await.unwrap().is_none());
    // the image leaks, the tag stays
    assert_eq!(h.blob_count().await, 1);
    assert_eq!(h.service.fetch_tags().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_removes_image() {
    let h = Harness::new().await;
    let artwork = h
        .service
        .create_artwork(form("Gone", &[]))
        .await
        .unwrap();

    assert!(h.service.delete_artwork(&artwork.id).await.unwrap());
    assert_eq!(h.blob_count().await, 0);
}

#[tokio::test]
async fn test_delete_unknown_artwork_returns_false() {
    let h = Harness::new().await;
    assert!(!h.service.delete_artwork("missing").await.unwrap());
}

#[tokio::test]
async fn test_failed_link_unwinds_create() {
    let h = Harness::new().await;
    h.store.fail_on("link_tags");

    let err = h
        .service
        .create_artwork(form("Broken", &["fresh"]))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Database(_)));
    assert!(h.service.fetch_artworks().await.unwrap().is_empty());
    assert!(h.service.fetch_tags().await.unwrap().is_empty());
    assert_eq!(h.blob_count().await, 0);
}

#[tokio::test]
async fn test_failed_upload_aborts_create() {
    let h = Harness::new().await;
    h.blobs.fail_put.store(true, Ordering::SeqCst);

    let err = h
        .service
        .create_artwork(form("Unsaved", &["x"]))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Storage(_)));
    assert!(!h.store.calls().contains(&"insert_artwork"));
}

#[tokio::test]
async fn test_failed_relink_restores_update() {
    let h = Harness::new().await;
    let artwork = h
        .service
        .create_artwork(form("Harbour", &["sea"]))
        .await
        .unwrap();
    h.store.fail_on("link_tags");

    let update = ArtworkUpdate {
        title: Some("Harbour at night".to_string()),
        image: Some(image("harbour.png")),
        tags: Some(vec!["night".to_string()]),
        ..Default::default()
    };
    let err = h
        .service
        .update_artwork(&artwork.id, update)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Database(_)));
    let restored = h.service.fetch_artwork(&artwork.id).await.unwrap().unwrap();
    assert_eq!(restored.title, "Harbour");
    assert_eq!(restored.image, artwork.image);
    assert_eq!(tag_names(&restored), vec!["sea"]);
    assert_eq!(h.blob_count().await, 1);
    let names: Vec<String> = h
        .service
        .fetch_tags()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, vec!["sea"]);
}

#[tokio::test]
async fn test_create_tag_is_idempotent_and_rejects_blank() {
    let h = Harness::new().await;

    let first = h.service.create_tag("ink").await.unwrap();
    let second = h.service.create_tag(" ink ").await.unwrap();
    assert_eq!(first, second);

    let err = h.service.create_tag("   ").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_leave_one_submitted_tag_set() {
    let h = Arc::new(Harness::new().await);
    let artwork = h
        .service
        .create_artwork(form("Moonlight", &["blue"]))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..20 {
        let h = h.clone();
        let id = artwork.id.clone();
        handles.push(tokio::spawn(async move {
            let update = ArtworkUpdate {
                tags: Some(vec![format!("x{}", i), format!("y{}", i)]),
                ..Default::default()
            };
            h.service.update_artwork(&id, update).await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().unwrap().is_some());
    }

    let updated = h.service.fetch_artwork(&artwork.id).await.unwrap().unwrap();
    let names = tag_names(&updated);
    assert_eq!(names.len(), 2, "{:?}", names);

    let suffix = names[0].trim_start_matches('x');
    assert_eq!(names, vec![format!("x{}", suffix), format!("y{}", suffix)]);
    assert_eq!(
        h.store.inner.linked_tag_ids(&artwork.id).await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn test_upload_rejects_non_image_content_type() {
    let h = Harness::new().await;
    let mut upload = image("notes.txt");
    upload.content_type = Some("text/plain".to_string());

    let err = h.service.upload_image(&upload).await.unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(h.blobs.puts.load(Ordering::SeqCst), 0);
    assert_eq!(h.blob_count().await, 0);
}

#[tokio::test]
async fn test_fetch_artworks_in_category() {
    let h = Harness::new().await;
    h.service
        .create_artwork(form("Moonlight", &[]))
        .await
        .unwrap();
    let mut sketch = form("Harbour sketch", &[]);
    sketch.category = "Drawing".to_string();
    h.service.create_artwork(sketch).await.unwrap();

    let drawings = h.service.fetch_artworks_in_category("Drawing").await.unwrap();
    assert_eq!(drawings.len(), 1);
    assert_eq!(drawings[0].title, "Harbour sketch");

    assert!(h
        .service
        .fetch_artworks_in_category("drawing")
        .await
        .unwrap()
        .is_empty());
    assert_eq!(h.service.fetch_artworks().await.unwrap().len(), 2);
}
