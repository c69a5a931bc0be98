//! Artwork model and the transient form inputs used to create and edit artworks.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::Tag;
use crate::errors::AppError;

/// Sale status of an artwork.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArtworkStatus {
    #[default]
    Available,
    Sold,
    Reserved,
}

impl ArtworkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtworkStatus::Available => "available",
            ArtworkStatus::Sold => "sold",
            ArtworkStatus::Reserved => "reserved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(ArtworkStatus::Available),
            "sold" => Some(ArtworkStatus::Sold),
            "reserved" => Some(ArtworkStatus::Reserved),
            _ => None,
        }
    }
}

/// A single portfolio piece with its resolved tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artwork {
    pub id: String,
    pub title: String,
    pub image: String,
    pub category: String,
    pub medium: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    pub status: ArtworkStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// Projection of the join table, sorted by name
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub created_at: String,
}

impl Artwork {
    /// Column values of this artwork, without identity, timestamps or tags.
    pub fn record(&self) -> ArtworkRecord {
        ArtworkRecord {
            title: self.title.clone(),
            image: self.image.clone(),
            category: self.category.clone(),
            medium: self.medium.clone(),
            description: self.description.clone(),
            year: self.year.clone(),
            dimensions: self.dimensions.clone(),
            artist: self.artist.clone(),
            status: self.status,
            price: self.price.clone(),
        }
    }
}

/// The mutable columns of an `artworks` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtworkRecord {
    pub title: String,
    pub image: String,
    pub category: String,
    pub medium: String,
    pub description: String,
    pub year: Option<String>,
    pub dimensions: Option<String>,
    pub artist: Option<String>,
    pub status: ArtworkStatus,
    pub price: Option<String>,
}

/// A raw uploaded image file.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Filename as supplied by the client; only its extension is kept
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl ImageUpload {
    /// Reject parts that declare a non-image content type. Parts without a
    /// declared type are accepted.
    pub fn validate(&self) -> Result<(), AppError> {
        match self.content_type.as_deref().map(str::trim) {
            Some(content_type) if !content_type.to_ascii_lowercase().starts_with("image/") => {
                Err(AppError::Validation(format!(
                    "Unsupported image type {:?}",
                    content_type
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Input for creating an artwork.
#[derive(Debug, Clone, Default)]
pub struct ArtworkFormData {
    pub title: String,
    pub category: String,
    pub medium: String,
    pub description: String,
    pub image: Option<ImageUpload>,
    pub year: Option<String>,
    pub dimensions: Option<String>,
    pub artist: Option<String>,
    pub status: Option<ArtworkStatus>,
    pub price: Option<String>,
    /// Plain tag names, not ids
    pub tags: Vec<String>,
}

impl ArtworkFormData {
    /// Check required fields and the image before anything touches the backend.
    pub fn validate(&self) -> Result<(), AppError> {
        require("Title", &self.title)?;
        require("Category", &self.category)?;
        require("Medium", &self.medium)?;
        require("Description", &self.description)?;
        match &self.image {
            Some(image) => image.validate(),
            None => Err(AppError::Validation("Please select an image".to_string())),
        }
    }

    /// Row values for the insert, given the uploaded image URL.
    pub fn record(&self, image_url: String) -> ArtworkRecord {
        ArtworkRecord {
            title: self.title.trim().to_string(),
            image: image_url,
            category: self.category.trim().to_string(),
            medium: self.medium.trim().to_string(),
            description: self.description.trim().to_string(),
            year: optional(self.year.as_deref()),
            dimensions: optional(self.dimensions.as_deref()),
            artist: optional(self.artist.as_deref()),
            status: self.status.unwrap_or_default(),
            price: optional(self.price.as_deref()),
        }
    }
}

/// Partial input for editing an artwork.
///
/// `None` leaves a field untouched. For the optional display fields an empty
/// string clears the value.
#[derive(Debug, Clone, Default)]
pub struct ArtworkUpdate {
    pub title: Option<String>,
    pub category: Option<String>,
    pub medium: Option<String>,
    pub description: Option<String>,
    pub image: Option<ImageUpload>,
    pub year: Option<String>,
    pub dimensions: Option<String>,
    pub artist: Option<String>,
    pub status: Option<ArtworkStatus>,
    pub price: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl ArtworkUpdate {
    /// Required fields may be omitted but not blanked.
    pub fn validate(&self) -> Result<(), AppError> {
        for (label, value) in [
            ("Title", &self.title),
            ("Category", &self.category),
            ("Medium", &self.medium),
            ("Description", &self.description),
        ] {
            if let Some(value) = value {
                require(label, value)?;
            }
        }
        match &self.image {
            Some(image) => image.validate(),
            None => Ok(()),
        }
    }

    /// Merge the supplied fields over the current row.
    pub fn apply(&self, current: &ArtworkRecord, image_url: Option<String>) -> ArtworkRecord {
        let merge = |update: &Option<String>, existing: &Option<String>| match update {
            Some(value) => optional(Some(value.as_str())),
            None => existing.clone(),
        };

        ArtworkRecord {
            title: self
                .title
                .as_deref()
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| current.title.clone()),
            image: image_url.unwrap_or_else(|| current.image.clone()),
            category: self
                .category
                .as_deref()
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| current.category.clone()),
            medium: self
                .medium
                .as_deref()
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| current.medium.clone()),
            description: self
                .description
                .as_deref()
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| current.description.clone()),
            year: merge(&self.year, &current.year),
            dimensions: merge(&self.dimensions, &current.dimensions),
            artist: merge(&self.artist, &current.artist),
            status: self.status.unwrap_or(current.status),
            price: merge(&self.price, &current.price),
        }
    }
}

fn require(label: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", label)));
    }
    Ok(())
}

fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
