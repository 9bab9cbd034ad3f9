// ABOUTME: Site settings database operations backing all admin-editable content
// ABOUTME: Provides typed get/set, transactional bulk updates, and full listing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Site Server Contributors

use super::{parse_timestamp, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{ParsedValue, SettingUpdate, SiteSetting, UpdatedItem, ValueType};
use chrono::Utc;
use sqlx::Row;

/// Default category assigned to settings created without one
pub const DEFAULT_CATEGORY: &str = "general";

fn row_to_setting(row: &sqlx::sqlite::SqliteRow) -> SiteSetting {
    SiteSetting {
        key: row.get("key"),
        value: row.get("value"),
        value_type: ValueType::from_tag(&row.get::<String, _>("value_type")),
        category: row.get("category"),
        description: row.get("description"),
        updated_at: parse_timestamp(&row.get::<String, _>("updated_at")),
        updated_by: row.get("updated_by"),
    }
}

impl Database {
    /// Get a site setting by key
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_setting(&self, key: &str) -> AppResult<Option<SiteSetting>> {
        let row = sqlx::query(
            r"
            SELECT key, value, value_type, category, description, updated_at, updated_by
            FROM site_settings
            WHERE key = ?1
            ",
        )
        .bind(key)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to get setting: {e}")))?;

        Ok(row.as_ref().map(row_to_setting))
    }

    /// Get a setting's value decoded according to its declared type
    ///
    /// Absent keys and malformed stored values both resolve to the
    /// type default; this never raises for bad data, only for a failed
    /// query.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_parsed(&self, key: &str) -> AppResult<Option<ParsedValue>> {
        Ok(self.get_setting(key).await?.map(|s| s.parsed_value()))
    }

    /// Upsert a single setting, returning the previous value
    ///
    /// Creates the setting with category "general" when the key is
    /// absent; always stamps `updated_at` and `updated_by`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn set_setting(
        &self,
        update: &SettingUpdate,
        admin_id: i64,
    ) -> AppResult<Option<String>> {
        let previous = self.get_setting(&update.key).await?.map(|s| s.value);

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
        .bind(&update.key)
        .bind(&update.value)
        .bind(update.category.as_deref().unwrap_or(DEFAULT_CATEGORY))
        .bind(update.description.as_deref().unwrap_or_default())
        .bind(Utc::now().to_rfc3339())
        .bind(admin_id)
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to set setting: {e}")))?;

        Ok(previous)
    }

    /// Apply a batch of setting updates as one transaction
    ///
    /// All updates commit together; any failure rolls the whole batch
    /// back so no partial state is ever visible. Entries with an empty
    /// key are skipped, matching the admin editor's lenient contract.
    ///
    /// # Errors
    ///
    /// Returns an error if any write fails; the transaction is rolled
    /// back in that case
    pub async fn bulk_update_settings(
        &self,
        updates: &[SettingUpdate],
        admin_id: i64,
    ) -> AppResult<Vec<UpdatedItem>> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to start transaction: {e}")))?;

        let now = Utc::now().to_rfc3339();
        let mut updated_items = Vec::with_capacity(updates.len());

        for update in updates {
            if update.key.is_empty() {
                continue;
            }

            let old_value: Option<String> =
                sqlx::query("SELECT value FROM site_settings WHERE key = ?1")
                    .bind(&update.key)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| AppError::database(format!("Failed to read setting: {e}")))?
                    .map(|row| row.get("value"));

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
            .bind(&update.key)
            .bind(&update.value)
            .bind(update.category.as_deref().unwrap_or(DEFAULT_CATEGORY))
            .bind(update.description.as_deref().unwrap_or_default())
            .bind(&now)
            .bind(admin_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to update setting: {e}")))?;

            updated_items.push(UpdatedItem {
                key: update.key.clone(),
                old_value,
                new_value: update.value.clone(),
            });
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit bulk update: {e}")))?;

        Ok(updated_items)
    }

    /// Upsert a setting with an explicit value type, used by the seed tool
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn seed_setting(
        &self,
        key: &str,
        value: &str,
        value_type: ValueType,
        description: &str,
        category: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO site_settings (key, value, value_type, category, description, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(key) DO UPDATE SET
                value = ?2,
                value_type = ?3,
                category = ?4,
                description = ?5,
                updated_at = ?6
            ",
        )
        .bind(key)
        .bind(value)
        .bind(value_type.as_tag())
        .bind(category)
        .bind(description)
        .bind(Utc::now().to_rfc3339())
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to seed setting: {e}")))?;

        Ok(())
    }

    /// Get all site settings, ordered by category then key
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn all_settings(&self) -> AppResult<Vec<SiteSetting>> {
        let rows = sqlx::query(
            r"
            SELECT key, value, value_type, category, description, updated_at, updated_by
            FROM site_settings
            ORDER BY category, key
            ",
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to get settings: {e}")))?;

        Ok(rows.iter().map(row_to_setting).collect())
    }

    /// Delete all settings, used by the seed tool's `--reset` flag only
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn reset_settings(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM site_settings")
            .execute(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to reset settings: {e}")))?;

        Ok(result.rows_affected())
    }
}
