// ABOUTME: Analytics database operations for page views, clicks, referrals, and sessions
// ABOUTME: Provides append-only fact recording plus aggregation queries for the admin dashboard
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Site Server Contributors

use super::{parse_timestamp, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{ReferralMedium, SessionDuration};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::Row;
use uuid::Uuid;

/// Aggregated analytics for the admin dashboard
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    /// Total recorded page views
    pub total_page_views: i64,
    /// Distinct visitor identifiers seen
    pub unique_visitors: i64,
    /// Most viewed pages with counts, descending
    pub top_pages: Vec<PathCount>,
    /// Most clicked buttons with counts, descending
    pub top_buttons: Vec<ButtonCount>,
    /// Referral counts bucketed by medium
    pub referral_mediums: Vec<MediumCount>,
    /// Mean session duration in seconds
    pub avg_session_seconds: f64,
    /// Mean pages viewed per session
    pub avg_pages_per_session: f64,
}

/// A page path with its view count
#[derive(Debug, Serialize, Deserialize)]
pub struct PathCount {
    /// Page path
    pub page_path: String,
    /// View count
    pub views: i64,
}

/// A button with its click count
#[derive(Debug, Serialize, Deserialize)]
pub struct ButtonCount {
    /// DOM identifier of the button
    pub button_id: String,
    /// Click count
    pub clicks: i64,
}

/// A referral medium with its session count
#[derive(Debug, Serialize, Deserialize)]
pub struct MediumCount {
    /// Medium tag (organic, social, referral)
    pub medium: String,
    /// Session count
    pub sessions: i64,
}

impl Database {
    /// Record a page view fact
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn record_page_view(
        &self,
        visitor_id: Uuid,
        session_id: Uuid,
        page_path: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO page_views (visitor_id, session_id, page_path, viewed_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(visitor_id.to_string())
        .bind(session_id.to_string())
        .bind(page_path)
        .bind(Utc::now().to_rfc3339())
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to record page view: {e}")))?;

        Ok(())
    }

    /// Record a button click fact
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn record_button_click(
        &self,
        visitor_id: Uuid,
        button_id: &str,
        button_text: Option<&str>,
        page_path: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO button_clicks (visitor_id, button_id, button_text, page_path, clicked_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(visitor_id.to_string())
        .bind(button_id)
        .bind(button_text)
        .bind(page_path)
        .bind(Utc::now().to_rfc3339())
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to record button click: {e}")))?;

        Ok(())
    }

    /// Record an external referral fact for a new session
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn record_referral(
        &self,
        visitor_id: Uuid,
        session_id: Uuid,
        source: &str,
        medium: ReferralMedium,
        referrer_url: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO referral_sources (visitor_id, session_id, source, medium, referrer_url, recorded_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(visitor_id.to_string())
        .bind(session_id.to_string())
        .bind(source)
        .bind(medium.as_tag())
        .bind(referrer_url)
        .bind(Utc::now().to_rfc3339())
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to record referral: {e}")))?;

        Ok(())
    }

    /// Get the duration record for a session, if one exists
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_session_duration(
        &self,
        session_id: Uuid,
    ) -> AppResult<Option<SessionDuration>> {
        let row = sqlx::query(
            r"
            SELECT id, visitor_id, session_id, start_time, end_time, duration_seconds, pages_viewed
            FROM session_durations
            WHERE session_id = ?1
            ",
        )
        .bind(session_id.to_string())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to get session: {e}")))?;

        row.map_or(Ok(None), |row| {
            let visitor_id: String = row.get("visitor_id");
            let session_id: String = row.get("session_id");
            Ok(Some(SessionDuration {
                id: row.get("id"),
                visitor_id: Uuid::parse_str(&visitor_id)
                    .map_err(|e| AppError::serialization(format!("Corrupt visitor id: {e}")))?,
                session_id: Uuid::parse_str(&session_id)
                    .map_err(|e| AppError::serialization(format!("Corrupt session id: {e}")))?,
                start_time: parse_timestamp(&row.get::<String, _>("start_time")),
                end_time: parse_timestamp(&row.get::<String, _>("end_time")),
                duration_seconds: row.get("duration_seconds"),
                pages_viewed: row.get("pages_viewed"),
            }))
        })
    }

    /// Start a duration record for a new session with `pages_viewed = 1`
    ///
    /// A no-op when the session already has a row; the unique
    /// constraint keeps the record 1:1 with the session id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn start_session(&self, visitor_id: Uuid, session_id: Uuid) -> AppResult<()> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO session_durations (visitor_id, session_id, start_time, end_time, duration_seconds, pages_viewed)
            VALUES (?1, ?2, ?3, ?3, 0, 1)
            ON CONFLICT(session_id) DO NOTHING
            ",
        )
        .bind(visitor_id.to_string())
        .bind(session_id.to_string())
        .bind(&now)
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to start session: {e}")))?;

        Ok(())
    }

    /// Increment the monotonic page view counter of an existing session
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn increment_session_pages(&self, session_id: Uuid) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE session_durations
            SET pages_viewed = pages_viewed + 1
            WHERE session_id = ?1
            ",
        )
        .bind(session_id.to_string())
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to update session pages: {e}")))?;

        Ok(())
    }

    /// Recompute a session's end time and duration from the server clock
    ///
    /// A no-op when no duration record exists for the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn touch_session_end(&self, session_id: Uuid) -> AppResult<()> {
        let Some(session) = self.get_session_duration(session_id).await? else {
            return Ok(());
        };

        let end_time = Utc::now();
        let duration_seconds = (end_time - session.start_time).num_seconds();

        sqlx::query(
            r"
            UPDATE session_durations
            SET end_time = ?1, duration_seconds = ?2
            WHERE session_id = ?3
            ",
        )
        .bind(end_time.to_rfc3339())
        .bind(duration_seconds)
        .bind(session_id.to_string())
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to finalize session: {e}")))?;

        Ok(())
    }

    /// Aggregate analytics facts for the admin dashboard
    ///
    /// # Errors
    ///
    /// Returns an error if any aggregation query fails
    pub async fn analytics_summary(&self) -> AppResult<AnalyticsSummary> {
        let totals = sqlx::query(
            r"
            SELECT COUNT(*) AS total, COUNT(DISTINCT visitor_id) AS visitors
            FROM page_views
            ",
        )
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to aggregate page views: {e}")))?;

        let top_pages = sqlx::query(
            r"
            SELECT page_path, COUNT(*) AS views
            FROM page_views
            GROUP BY page_path
            ORDER BY views DESC
            LIMIT 10
            ",
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to aggregate pages: {e}")))?
        .iter()
        .map(|row| PathCount {
            page_path: row.get("page_path"),
            views: row.get("views"),
        })
        .collect();

        let top_buttons = sqlx::query(
            r"
            SELECT button_id, COUNT(*) AS clicks
            FROM button_clicks
            GROUP BY button_id
            ORDER BY clicks DESC
            LIMIT 10
            ",
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to aggregate clicks: {e}")))?
        .iter()
        .map(|row| ButtonCount {
            button_id: row.get("button_id"),
            clicks: row.get("clicks"),
        })
        .collect();

        let referral_mediums = sqlx::query(
            r"
            SELECT medium, COUNT(*) AS sessions
            FROM referral_sources
            GROUP BY medium
            ORDER BY sessions DESC
            ",
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to aggregate referrals: {e}")))?
        .iter()
        .map(|row| MediumCount {
            medium: row.get("medium"),
            sessions: row.get("sessions"),
        })
        .collect();

        let sessions = sqlx::query(
            r"
            SELECT
                COALESCE(AVG(duration_seconds), 0.0) AS avg_seconds,
                COALESCE(AVG(pages_viewed), 0.0) AS avg_pages
            FROM session_durations
            ",
        )
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to aggregate sessions: {e}")))?;

        Ok(AnalyticsSummary {
            total_page_views: totals.get("total"),
            unique_visitors: totals.get("visitors"),
            top_pages,
            top_buttons,
            referral_mediums,
            avg_session_seconds: sessions.get("avg_seconds"),
            avg_pages_per_session: sessions.get("avg_pages"),
        })
    }
}
