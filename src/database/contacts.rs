// ABOUTME: Contact lead database operations for the public contact form
// ABOUTME: Provides insert, listing, and the admin's interested-flag toggle
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Site Server Contributors

use super::{parse_timestamp, Database};
use crate::errors::{AppError, AppResult};
use crate::models::Contact;
use chrono::Utc;
use sqlx::Row;

fn row_to_contact(row: &sqlx::sqlite::SqliteRow) -> Contact {
    Contact {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        subject: row.get("subject"),
        message: row.get("message"),
        interested: row.get("interested"),
        created_at: parse_timestamp(&row.get::<String, _>("created_at")),
    }
}

impl Database {
    /// Store a contact-form lead, returning its row id
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn create_contact(
        &self,
        name: &str,
        email: &str,
        subject: Option<&str>,
        message: &str,
    ) -> AppResult<i64> {
        let result = sqlx::query(
            r"
            INSERT INTO contacts (name, email, subject, message, interested, created_at)
            VALUES (?1, ?2, ?3, ?4, 0, ?5)
            ",
        )
        .bind(name)
        .bind(email)
        .bind(subject)
        .bind(message)
        .bind(Utc::now().to_rfc3339())
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to create contact: {e}")))?;

        Ok(result.last_insert_rowid())
    }

    /// Get all contact leads, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_contacts(&self) -> AppResult<Vec<Contact>> {
        let rows = sqlx::query(
            r"
            SELECT id, name, email, subject, message, interested, created_at
            FROM contacts
            ORDER BY created_at DESC
            ",
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to list contacts: {e}")))?;

        Ok(rows.iter().map(row_to_contact).collect())
    }

    /// Toggle the interested follow-up flag on a lead
    ///
    /// # Errors
    ///
    /// Returns a not-found error when the id is absent, or a database
    /// error if the update fails
    pub async fn set_contact_interested(&self, contact_id: i64, interested: bool) -> AppResult<()> {
        let result = sqlx::query("UPDATE contacts SET interested = ?1 WHERE id = ?2")
            .bind(interested)
            .bind(contact_id)
            .execute(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to update contact: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Contact {contact_id}")));
        }

        Ok(())
    }
}
