//! Configuration module for the portfolio backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;

use crate::models::{Profile, SocialLinks, User};

/// Profile of the single admin account served by the session endpoint.
#[derive(Debug, Clone)]
pub struct AdminProfile {
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    /// When this profile was loaded; reported as the user's creation time
    pub created_at: String,
}

impl AdminProfile {
    pub fn user(&self) -> User {
        User {
            id: "admin".to_string(),
            email: self.email.clone(),
            name: self.name.clone(),
            created_at: self.created_at.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key guarding the admin routes (required in production)
    pub api_psk: Option<String>,
    /// Base URL under which uploaded images are publicly reachable (required)
    pub public_base_url: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Directory holding the image bucket
    pub storage_dir: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Third-party endpoint receiving contact form submissions
    pub contact_webhook_url: Option<String>,
    pub contact_timeout: Duration,
    /// Interval between gallery listing refreshes
    pub gallery_refresh: Duration,
    /// Maximum accepted request body for uploads
    pub max_upload_bytes: usize,
    pub admin: AdminProfile,
    /// Public profile served to visitors
    pub artist: Profile,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_psk = non_empty_var("FOLIO_API_PSK");
        let public_base_url = non_empty_var("FOLIO_PUBLIC_URL");

        let db_path = env::var("FOLIO_DB_PATH")
            .unwrap_or_else(|_| "./data/folio.sqlite".to_string())
            .into();

        let storage_dir = env::var("FOLIO_STORAGE_DIR")
            .unwrap_or_else(|_| "./data/storage".to_string())
            .into();

        let bind_addr = env::var("FOLIO_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid FOLIO_BIND_ADDR format");

        let log_level = env::var("FOLIO_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let contact_webhook_url = non_empty_var("FOLIO_CONTACT_WEBHOOK_URL");
        let contact_timeout = Duration::from_secs(parse_var("FOLIO_CONTACT_TIMEOUT_SECS", 10));
        let gallery_refresh = Duration::from_secs(parse_var("FOLIO_GALLERY_REFRESH_SECS", 10));
        let max_upload_bytes = parse_var::<usize>("FOLIO_MAX_UPLOAD_MB", 10) * 1024 * 1024;

        let admin = AdminProfile {
            name: env::var("FOLIO_ADMIN_NAME").unwrap_or_else(|_| "Portfolio Admin".to_string()),
            email: env::var("FOLIO_ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@localhost".to_string()),
            avatar_url: non_empty_var("FOLIO_ADMIN_AVATAR_URL"),
            created_at: Utc::now().to_rfc3339(),
        };

        let artist = Profile {
            name: env::var("FOLIO_ARTIST_NAME").unwrap_or_else(|_| "Portfolio Artist".to_string()),
            bio: env::var("FOLIO_ARTIST_BIO").unwrap_or_default(),
            avatar_url: non_empty_var("FOLIO_ARTIST_AVATAR_URL"),
            social_links: SocialLinks {
                instagram: non_empty_var("FOLIO_ARTIST_INSTAGRAM"),
                twitter: non_empty_var("FOLIO_ARTIST_TWITTER"),
                linkedin: non_empty_var("FOLIO_ARTIST_LINKEDIN"),
                email: non_empty_var("FOLIO_ARTIST_EMAIL"),
            },
        };

        Self {
            api_psk,
            public_base_url,
            db_path,
            storage_dir,
            bind_addr,
            log_level,
            contact_webhook_url,
            contact_timeout,
            gallery_refresh,
            max_upload_bytes,
            admin,
            artist,
        }
    }

    /// Names of required variables that are not set.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.public_base_url.is_none() {
            missing.push("FOLIO_PUBLIC_URL");
        }
        if self.api_psk.is_none() {
            missing.push("FOLIO_API_PSK");
        }
        missing
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid value {:?} for {}", raw, name);
            default
        }),
        Err(_) => default,
    }
}
