//! Blob storage for artwork images.
//!
//! Images live in a single bucket keyed by a generated filename. The store hands
//! out a public URL per object; the artwork row only ever keeps that URL.

mod local;

pub use local::*;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use rand::Rng;

use crate::errors::AppError;

/// Bucket holding every uploaded artwork image.
pub const IMAGE_BUCKET: &str = "artwork-images";

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 8;

/// An object in the bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobEntry {
    pub name: String,
    pub size: u64,
}

/// Storage backend for uploaded images.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a new object. Fails if the name is already taken.
    async fn put(&self, name: &str, bytes: Bytes) -> Result<(), AppError>;

    /// Remove an object.
    async fn remove(&self, name: &str) -> Result<(), AppError>;

    /// List all objects, sorted by name.
    async fn list(&self) -> Result<Vec<BlobEntry>, AppError>;

    /// Public URL under which an object is served.
    fn public_url(&self, name: &str) -> Result<String, AppError>;
}

/// Generate an object name as `<epoch-millis>-<8 base36 chars>.<ext>`.
///
/// The extension is taken from the client filename. Names without a usable
/// extension get none.
pub fn generate_object_name(original_name: &str) -> String {
    let timestamp = Utc::now().timestamp_millis();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();

    match file_extension(original_name) {
        Some(ext) => format!("{}-{}.{}", timestamp, suffix, ext),
        None => format!("{}-{}", timestamp, suffix),
    }
}

/// Object name referenced by a public URL: its last path segment.
pub fn object_name_from_url(url: &str) -> Option<&str> {
    url.rsplit('/').next().filter(|name| !name.is_empty())
}

fn file_extension(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_name_shape() {
        let name = generate_object_name("sunset.final.jpeg");
        let (stamp, rest) = name.split_once('-').unwrap();
        let (suffix, ext) = rest.split_once('.').unwrap();

        assert!(stamp.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), 8);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert_eq!(ext, "jpeg");
    }

    #[test]
    fn test_generated_names_are_unique_and_keep_extension() {
        let names: HashSet<String> = (0..10_000)
            .map(|_| generate_object_name("canvas.PNG"))
            .collect();

        assert_eq!(names.len(), 10_000);
        assert!(names.iter().all(|n| n.ends_with(".PNG")));
    }

    #[test]
    fn test_generated_name_without_extension() {
        let name = generate_object_name("README");
        assert!(!name.contains('.'));

        let name = generate_object_name("../../etc/passwd");
        assert!(!name.contains('/'));
    }

    #[test]
    fn test_object_name_from_url() {
        assert_eq!(
            object_name_from_url("http://localhost:8080/storage/artwork-images/1-abc.png"),
            Some("1-abc.png")
        );
        assert_eq!(object_name_from_url("http://localhost/storage/"), None);
    }
}
