//! Database repository for CRUD operations.
//!
//! Uses prepared statements and transactions for bulk writes.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::ArtworkStore;
use crate::errors::AppError;
use crate::models::{Artwork, ArtworkRecord, ArtworkStatus, Portfolio, Profile, RevisionInfo, Tag};

const ARTWORK_COLUMNS: &str =
    "id, title, image, category, medium, description, year, dimensions, artist, status, price, created_at";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Get revision info.
    pub async fn get_revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(RevisionInfo {
            revision_id: row.get("revision_id"),
            generated_at: row.get("generated_at"),
        })
    }

    /// Increment the revision ID and return the new value.
    pub async fn increment_revision(&self) -> Result<i64, AppError> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&self.pool)
            .await?;
        self.get_revision_id().await
    }

    /// Get the full portfolio snapshot, presented under `profile`.
    pub async fn get_portfolio(&self, profile: Profile) -> Result<Portfolio, AppError> {
        let meta = self.get_revision_info().await?;
        let artworks = self.list_artworks().await?;
        let tags = self.list_tags().await?;

        Ok(Portfolio {
            generated_at: meta.generated_at,
            revision_id: meta.revision_id,
            profile,
            artworks,
            tags,
        })
    }

    async fn tags_for_artwork(&self, artwork_id: &str) -> Result<Vec<Tag>, AppError> {
        let rows = sqlx::query(
            "SELECT t.id, t.name FROM artwork_tags at JOIN tags t ON t.id = at.tag_id WHERE at.artwork_id = ? ORDER BY t.name",
        )
        .bind(artwork_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(tag_from_row).collect())
    }
}

#[async_trait]
impl ArtworkStore for Repository {
    // ==================== ARTWORK OPERATIONS ====================

    async fn list_artworks(&self) -> Result<Vec<Artwork>, AppError> {
        let sql = format!(
            "SELECT {} FROM artworks ORDER BY created_at DESC, rowid DESC",
            ARTWORK_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let links = sqlx::query(
            "SELECT at.artwork_id, t.id, t.name FROM artwork_tags at JOIN tags t ON t.id = at.tag_id ORDER BY t.name",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut tags_by_artwork: HashMap<String, Vec<Tag>> = HashMap::new();
        for link in &links {
            tags_by_artwork
                .entry(link.get("artwork_id"))
                .or_default()
                .push(tag_from_row(link));
        }

        rows.iter()
            .map(|row| {
                let id: String = row.get("id");
                let tags = tags_by_artwork.remove(&id).unwrap_or_default();
                artwork_from_row(row, tags)
            })
            .collect()
    }

    async fn get_artwork(&self, id: &str) -> Result<Option<Artwork>, AppError> {
        let sql = format!("SELECT {} FROM artworks WHERE id = ?", ARTWORK_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let tags = self.tags_for_artwork(id).await?;
                Ok(Some(artwork_from_row(&row, tags)?))
            }
            None => Ok(None),
        }
    }

    async fn insert_artwork(&self, record: &ArtworkRecord) -> Result<String, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        sqlx::query(
            "INSERT INTO artworks (id, title, image, category, medium, description, year, dimensions, artist, status, price, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&record.title)
        .bind(&record.image)
        .bind(&record.category)
        .bind(&record.medium)
        .bind(&record.description)
        .bind(&record.year)
        .bind(&record.dimensions)
        .bind(&record.artist)
        .bind(record.status.as_str())
        .bind(&record.price)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;
        Ok(id)
    }

    async fn update_artwork(&self, id: &str, record: &ArtworkRecord) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE artworks SET title = ?, image = ?, category = ?, medium = ?, description = ?, year = ?, dimensions = ?, artist = ?, status = ?, price = ? WHERE id = ?",
        )
        .bind(&record.title)
        .bind(&record.image)
        .bind(&record.category)
        .bind(&record.medium)
        .bind(&record.description)
        .bind(&record.year)
        .bind(&record.dimensions)
        .bind(&record.artist)
        .bind(record.status.as_str())
        .bind(&record.price)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        self.increment_revision().await?;
        Ok(true)
    }

    async fn delete_artwork(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM artworks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        self.increment_revision().await?;
        Ok(true)
    }

    // ==================== TAG OPERATIONS ====================

    async fn list_tags(&self) -> Result<Vec<Tag>, AppError> {
        let rows = sqlx::query("SELECT id, name FROM tags ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(tag_from_row).collect())
    }

    async fn find_tags_by_name(&self, names: &[String]) -> Result<Vec<Tag>, AppError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; names.len()].join(", ");
        let sql = format!(
            "SELECT id, name FROM tags WHERE name IN ({}) ORDER BY name",
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for name in names {
            query = query.bind(name);
        }
        let rows = query.fetch_all(&self.pool).await?;

        Ok(rows.iter().map(tag_from_row).collect())
    }

    async fn insert_tags(&self, names: &[String]) -> Result<Vec<Tag>, AppError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await?;
        let mut tags = Vec::with_capacity(names.len());
        let mut inserted = 0;

        for name in names {
            inserted += sqlx::query(
                "INSERT INTO tags (id, name) VALUES (?, ?) ON CONFLICT(name) DO NOTHING",
            )
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(name)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            let row = sqlx::query("SELECT id, name FROM tags WHERE name = ?")
                .bind(name)
                .fetch_one(&mut *tx)
                .await?;
            tags.push(tag_from_row(&row));
        }

        tx.commit().await?;
        if inserted > 0 {
            self.increment_revision().await?;
        }

        Ok(tags)
    }

    async fn delete_tags(&self, ids: &[String]) -> Result<(), AppError> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for id in ids {
            sqlx::query("DELETE FROM tags WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        self.increment_revision().await?;
        Ok(())
    }

    async fn linked_tag_ids(&self, artwork_id: &str) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query("SELECT tag_id FROM artwork_tags WHERE artwork_id = ?")
            .bind(artwork_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|row| row.get("tag_id")).collect())
    }

    async fn link_tags(&self, artwork_id: &str, tag_ids: &[String]) -> Result<(), AppError> {
        if tag_ids.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for tag_id in tag_ids {
            sqlx::query("INSERT OR IGNORE INTO artwork_tags (artwork_id, tag_id) VALUES (?, ?)")
                .bind(artwork_id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        self.increment_revision().await?;
        Ok(())
    }

    async fn unlink_all_tags(&self, artwork_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM artwork_tags WHERE artwork_id = ?")
            .bind(artwork_id)
            .execute(&self.pool)
            .await?;

        self.increment_revision().await?;
        Ok(())
    }
}

// ==================== ROW MAPPING HELPERS ====================

fn artwork_from_row(row: &SqliteRow, tags: Vec<Tag>) -> Result<Artwork, AppError> {
    let status: String = row.get("status");
    let status = ArtworkStatus::parse(&status)
        .ok_or_else(|| AppError::Database(format!("Unknown artwork status {:?}", status)))?;

    Ok(Artwork {
        id: row.get("id"),
        title: row.get("title"),
        image: row.get("image"),
        category: row.get("category"),
        medium: row.get("medium"),
        description: row.get("description"),
        year: row.get("year"),
        dimensions: row.get("dimensions"),
        artist: row.get("artist"),
        status,
        price: row.get("price"),
        tags,
        created_at: row.get("created_at"),
    })
}

fn tag_from_row(row: &SqliteRow) -> Tag {
    Tag {
        id: row.get("id"),
        name: row.get("name"),
    }
}
