//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for artworks, tags and their links.

mod repository;

pub use repository::*;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use crate::errors::AppError;
use crate::models::{Artwork, ArtworkRecord, Tag};

/// Table-level operations the artwork service is built on.
///
/// Each call is independent; nothing spans calls. Writes bump the revision.
#[async_trait]
pub trait ArtworkStore: Send + Sync {
    /// All artworks, newest first, with tags resolved.
    async fn list_artworks(&self) -> Result<Vec<Artwork>, AppError>;

    /// One artwork with tags resolved.
    async fn get_artwork(&self, id: &str) -> Result<Option<Artwork>, AppError>;

    /// Insert an artwork row and return its id.
    async fn insert_artwork(&self, record: &ArtworkRecord) -> Result<String, AppError>;

    /// Overwrite the mutable columns of a row. Returns false if no row matched.
    async fn update_artwork(&self, id: &str, record: &ArtworkRecord) -> Result<bool, AppError>;

    /// Delete an artwork row; its links cascade. Returns false if no row matched.
    async fn delete_artwork(&self, id: &str) -> Result<bool, AppError>;

    /// All tags ordered by name.
    async fn list_tags(&self) -> Result<Vec<Tag>, AppError>;

    /// Tags whose name exactly matches one of `names`.
    async fn find_tags_by_name(&self, names: &[String]) -> Result<Vec<Tag>, AppError>;

    /// Create tags in bulk. Names that already exist resolve to the existing tag.
    async fn insert_tags(&self, names: &[String]) -> Result<Vec<Tag>, AppError>;

    /// Delete tags by id.
    async fn delete_tags(&self, ids: &[String]) -> Result<(), AppError>;

    /// Ids of the tags currently linked to an artwork.
    async fn linked_tag_ids(&self, artwork_id: &str) -> Result<Vec<String>, AppError>;

    /// Link an artwork to tags in bulk.
    async fn link_tags(&self, artwork_id: &str, tag_ids: &[String]) -> Result<(), AppError>;

    /// Remove every link of an artwork.
    async fn unlink_all_tags(&self, artwork_id: &str) -> Result<(), AppError>;
}

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Run embedded migrations
    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            schema_version INTEGER NOT NULL DEFAULT 1,
            revision_id INTEGER NOT NULL DEFAULT 0,
            generated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        );

        INSERT OR IGNORE INTO meta (id, schema_version, revision_id, generated_at)
        VALUES (1, 1, 0, strftime('%Y-%m-%dT%H:%M:%SZ', 'now'));
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS artworks (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            image TEXT NOT NULL,
            category TEXT NOT NULL,
            medium TEXT NOT NULL,
            description TEXT NOT NULL,
            year TEXT,
            dimensions TEXT,
            artist TEXT,
            status TEXT NOT NULL DEFAULT 'available'
                CHECK (status IN ('available', 'sold', 'reserved')),
            price TEXT,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tags (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS artwork_tags (
            artwork_id TEXT NOT NULL REFERENCES artworks(id) ON DELETE CASCADE,
            tag_id TEXT NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
            PRIMARY KEY (artwork_id, tag_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_artworks_created_at ON artworks(created_at);
        CREATE INDEX IF NOT EXISTS idx_artwork_tags_tag_id ON artwork_tags(tag_id);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
