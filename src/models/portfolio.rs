//! Portfolio snapshot served to the landing page.

use serde::{Deserialize, Serialize};

use super::{Artwork, Profile, Tag};

/// Everything the landing page needs in one payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub generated_at: String,
    pub revision_id: i64,
    pub profile: Profile,
    pub artworks: Vec<Artwork>,
    pub tags: Vec<Tag>,
}

/// Revision information for change detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    pub revision_id: i64,
    pub generated_at: String,
}
