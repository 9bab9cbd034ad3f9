// ABOUTME: Content version log database operations with capped append-only history
// ABOUTME: Stores full settings snapshots and implements full-replace rollback
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Site Server Contributors

use super::{parse_timestamp, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{ContentVersion, SnapshotItem};
use chrono::Utc;
use sqlx::Row;
use tracing::info;
use uuid::Uuid;

/// Maximum number of versions retained; oldest evicted first
pub const VERSION_RETENTION: i64 = 50;

fn row_to_version(row: &sqlx::sqlite::SqliteRow) -> AppResult<ContentVersion> {
    let id: String = row.get("id");
    let id = Uuid::parse_str(&id)
        .map_err(|e| AppError::serialization(format!("Corrupt version id {id:?}: {e}")))?;
    let content: Vec<SnapshotItem> = serde_json::from_str(&row.get::<String, _>("content"))?;

    Ok(ContentVersion {
        id,
        timestamp: parse_timestamp(&row.get::<String, _>("timestamp")),
        admin_id: row.get("admin_id"),
        action: row.get("action"),
        content,
    })
}

impl Database {
    /// Append a new version wrapping a full snapshot of all settings,
    /// then trim the log to the newest entries within the retention
    /// cap (default [`VERSION_RETENTION`])
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or a database write fails
    pub async fn create_version(
        &self,
        snapshot: &[SnapshotItem],
        admin_id: i64,
        action: &str,
    ) -> AppResult<Uuid> {
        let version_id = Uuid::new_v4();
        let content = serde_json::to_string(snapshot)?;

        sqlx::query(
            r"
            INSERT INTO content_versions (id, timestamp, admin_id, action, content)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(version_id.to_string())
        .bind(Utc::now().to_rfc3339())
        .bind(admin_id)
        .bind(action)
        .bind(content)
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to create version: {e}")))?;

        // FIFO eviction past the retention cap
        sqlx::query(
            r"
            DELETE FROM content_versions
            WHERE id NOT IN (
                SELECT id FROM content_versions
                ORDER BY timestamp DESC, rowid DESC
                LIMIT ?1
            )
            ",
        )
        .bind(self.version_retention())
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to trim version log: {e}")))?;

        info!(version_id = %version_id, admin_id, action, "Created content version");
        Ok(version_id)
    }

    /// Get all content versions, oldest first, capped at the retention limit
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a row is corrupt
    pub async fn list_versions(&self) -> AppResult<Vec<ContentVersion>> {
        let rows = sqlx::query(
            r"
            SELECT id, timestamp, admin_id, action, content
            FROM content_versions
            ORDER BY timestamp ASC, rowid ASC
            ",
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to list versions: {e}")))?;

        rows.iter().map(row_to_version).collect()
    }

    /// Look up a single version by id
    ///
    /// # Errors
    ///
    /// Returns a not-found error when the id is absent, or a database
    /// error if the query fails
    pub async fn get_version(&self, version_id: Uuid) -> AppResult<ContentVersion> {
        let row = sqlx::query(
            r"
            SELECT id, timestamp, admin_id, action, content
            FROM content_versions
            WHERE id = ?1
            ",
        )
        .bind(version_id.to_string())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to get version: {e}")))?;

        row.as_ref().map_or_else(
            || Err(AppError::not_found(format!("Version {version_id}"))),
            row_to_version,
        )
    }

    /// Roll the Setting Store back to a previous version
    ///
    /// Full replace, not merge: every key present in the target
    /// snapshot is re-applied, creating settings that no longer exist
    /// and overwriting ones changed since. The rollback itself is
    /// appended as a fresh version so history is never rewritten.
    ///
    /// Returns the target version with the snapshot that was applied.
    /// When the log sits at the retention cap, appending the rollback
    /// entry can evict the target itself, so callers must use the
    /// returned snapshot instead of re-reading the target by id.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for an unknown id (leaving both the
    /// settings and the version log untouched), or a database error if
    /// an apply step fails
    pub async fn rollback_to_version(
        &self,
        version_id: Uuid,
        admin_id: i64,
    ) -> AppResult<ContentVersion> {
        let target = self.get_version(version_id).await?;

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to start transaction: {e}")))?;

        let now = Utc::now().to_rfc3339();
        for item in &target.content {
            sqlx::query(
                r"
                INSERT INTO site_settings (key, value, value_type, category, description, updated_at, updated_by)
                VALUES (?1, ?2, 'text', ?3, ?4, ?5, ?6)
                ON CONFLICT(key) DO UPDATE SET
                    value = ?2,
                    updated_at = ?5,
                    updated_by = ?6
                ",
            )
            .bind(&item.key)
            .bind(&item.value)
            .bind(&item.category)
            .bind(item.description.as_deref().unwrap_or_default())
            .bind(&now)
            .bind(admin_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to apply snapshot: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit rollback: {e}")))?;

        let new_version = self
            .create_version(
                &target.content,
                admin_id,
                &format!("Rollback to version {version_id}"),
            )
            .await?;

        info!(%version_id, %new_version, admin_id, "Rolled back content");
        Ok(target)
    }

    /// Capture the current state of all settings as snapshot items
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn snapshot_settings(&self) -> AppResult<Vec<SnapshotItem>> {
        let settings = self.all_settings().await?;
        Ok(settings
            .into_iter()
            .map(|s| SnapshotItem {
                key: s.key,
                value: s.value,
                category: s.category,
                description: s.description,
            })
            .collect())
    }
}
