//! User and session models.

use serde::{Deserialize, Serialize};

/// An authenticated user of the admin surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Per-request session attached by the authentication middleware.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
}
