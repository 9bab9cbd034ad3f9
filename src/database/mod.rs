// ABOUTME: Database management for settings, versions, contacts, and analytics storage
// ABOUTME: Owns the SQLite pool and runs idempotent schema migrations at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Site Server Contributors

//! # Database Management
//!
//! SQLite-backed persistence for the site server: typed site settings,
//! the capped content version log, contact leads, admin accounts, and
//! visitor analytics facts.

mod analytics;
mod contacts;
mod settings;
mod versions;

pub use analytics::AnalyticsSummary;
pub use versions::VERSION_RETENTION;

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite, SqlitePool};

use crate::errors::{AppError, AppResult};
use crate::models::Admin;

/// Database manager for all persisted state
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
    version_retention: i64,
}

impl Database {
    /// Create a new database connection and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or a migration fails
    pub async fn new(database_url: &str) -> Result<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:")
            && !database_url.contains(":memory:")
        {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        let pool = SqlitePool::connect(&connection_options).await?;

        let db = Self {
            pool,
            version_retention: VERSION_RETENTION,
        };
        db.migrate().await?;

        Ok(db)
    }

    /// Override the version log retention cap
    #[must_use]
    pub fn with_version_retention(mut self, retention: usize) -> Self {
        self.version_retention = i64::try_from(retention).unwrap_or(VERSION_RETENTION);
        self
    }

    /// The configured version log retention cap
    #[must_use]
    pub fn version_retention(&self) -> i64 {
        self.version_retention
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if a schema statement fails
    pub async fn migrate(&self) -> Result<()> {
        self.migrate_admins().await?;
        self.migrate_settings().await?;
        self.migrate_versions().await?;
        self.migrate_contacts().await?;
        self.migrate_analytics().await?;
        Ok(())
    }

    async fn migrate_admins(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS admins (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn migrate_settings(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS site_settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                value_type TEXT NOT NULL DEFAULT 'text',
                category TEXT NOT NULL DEFAULT 'general',
                description TEXT,
                updated_at TEXT NOT NULL,
                updated_by INTEGER REFERENCES admins(id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn migrate_versions(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS content_versions (
                id TEXT PRIMARY KEY,
                timestamp TEXT NOT NULL,
                admin_id INTEGER NOT NULL,
                action TEXT NOT NULL,
                content TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_content_versions_timestamp
            ON content_versions(timestamp)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn migrate_contacts(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS contacts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                subject TEXT,
                message TEXT NOT NULL,
                interested INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn migrate_analytics(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS page_views (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                visitor_id TEXT NOT NULL,
                session_id TEXT NOT NULL,
                page_path TEXT NOT NULL,
                viewed_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS button_clicks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                visitor_id TEXT NOT NULL,
                button_id TEXT NOT NULL,
                button_text TEXT,
                page_path TEXT NOT NULL,
                clicked_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS referral_sources (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                visitor_id TEXT NOT NULL,
                session_id TEXT NOT NULL,
                source TEXT NOT NULL,
                medium TEXT NOT NULL,
                referrer_url TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS session_durations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                visitor_id TEXT NOT NULL,
                session_id TEXT NOT NULL UNIQUE,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                duration_seconds INTEGER NOT NULL DEFAULT 0,
                pages_viewed INTEGER NOT NULL DEFAULT 1
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Look up an admin account by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_admin(&self, admin_id: i64) -> AppResult<Option<Admin>> {
        use sqlx::Row;

        let row = sqlx::query("SELECT id, username, created_at FROM admins WHERE id = ?1")
            .bind(admin_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get admin: {e}")))?;

        Ok(row.map(|row| Admin {
            id: row.get("id"),
            username: row.get("username"),
            created_at: parse_timestamp(&row.get::<String, _>("created_at")),
        }))
    }

    /// Create an admin account if the username is not taken, returning its id
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn ensure_admin(&self, username: &str) -> AppResult<i64> {
        use sqlx::Row;

        sqlx::query(
            r"
            INSERT INTO admins (username, created_at)
            VALUES (?1, ?2)
            ON CONFLICT(username) DO NOTHING
            ",
        )
        .bind(username)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create admin: {e}")))?;

        let row = sqlx::query("SELECT id FROM admins WHERE username = ?1")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to look up admin: {e}")))?;

        Ok(row.get("id"))
    }
}

/// Parse an RFC 3339 timestamp column, falling back to now on corruption
pub(crate) fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}
