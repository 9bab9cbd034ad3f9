// ABOUTME: Admin content API routes for live editing, version history, and rollback
// ABOUTME: Also serves the public full-content sync used by pages and poll-gap recovery
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Site Server Contributors

//! Content editing routes
//!
//! The admin surface reads and writes the Setting Store, snapshots a
//! new version on every bulk update, and feeds each mutation to the
//! change broadcaster so public pages pick it up on their next poll.

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::context::ServerResources;
use crate::errors::AppError;
use crate::models::{Admin, ContentVersion, SettingUpdate, UpdatedItem};

/// One setting as exposed to the editor and the public sync
#[derive(Debug, Serialize)]
pub struct ContentItem {
    /// Setting key
    pub key: String,
    /// Raw stored value
    pub value: String,
    /// Grouping category
    pub category: String,
    /// Editor-facing description
    pub description: Option<String>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// Response for content listing
#[derive(Debug, Serialize)]
pub struct ContentResponse {
    /// Always `true` on this path
    pub success: bool,
    /// All settings, ordered by category then key
    pub content: Vec<ContentItem>,
}

/// Bulk update request body
#[derive(Debug, Deserialize)]
pub struct UpdateContentRequest {
    /// Updates to apply as one transaction
    pub updates: Vec<SettingUpdate>,
}

/// Response for a bulk update
#[derive(Debug, Serialize)]
pub struct UpdateContentResponse {
    /// Always `true` on this path
    pub success: bool,
    /// Per-key old/new values
    pub updated_items: Vec<UpdatedItem>,
    /// Id of the version snapshot created for this update
    pub version_id: Uuid,
    /// Human-readable result summary
    pub message: String,
}

/// One version entry with its admin username resolved
#[derive(Debug, Serialize)]
pub struct VersionView {
    /// Version id
    pub id: Uuid,
    /// When the snapshot was taken
    pub timestamp: DateTime<Utc>,
    /// Admin who triggered it
    pub admin_id: i64,
    /// Resolved username, "Unknown" when the account is gone
    pub admin_username: String,
    /// Action description
    pub action: String,
    /// Number of settings captured in the snapshot
    pub item_count: usize,
}

/// Response for version history
#[derive(Debug, Serialize)]
pub struct VersionsResponse {
    /// Always `true` on this path
    pub success: bool,
    /// Versions oldest first, capped at the retention limit
    pub versions: Vec<VersionView>,
}

/// Rollback request body
#[derive(Debug, Deserialize)]
pub struct RollbackRequest {
    /// Target version id
    pub version_id: String,
}

/// Generic success envelope with a message
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Always `true` on this path
    pub success: bool,
    /// Human-readable result summary
    pub message: String,
}

/// Content routes implementation
pub struct ContentRoutes;

impl ContentRoutes {
    /// Create all content routes, admin and public
    #[must_use]
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/admin/api/content/get", get(Self::get_content))
            .route("/admin/api/content/update", post(Self::update_content))
            .route("/admin/api/content/versions", get(Self::get_versions))
            .route("/admin/api/content/rollback", post(Self::rollback_content))
            // Full sync for public pages and poll-gap recovery
            .route("/api/content", get(Self::get_content))
            .with_state(resources)
    }

    /// Resolve the acting admin from the `x-admin-id` header
    ///
    /// Login mechanics live outside this service; an absent or unknown
    /// header falls back to the seeded system admin so mutations are
    /// always attributable.
    async fn acting_admin(
        headers: &HeaderMap,
        resources: &Arc<ServerResources>,
    ) -> Result<Admin, AppError> {
        let requested = headers
            .get("x-admin-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok());

        if let Some(admin_id) = requested {
            if let Some(admin) = resources.database.get_admin(admin_id).await? {
                return Ok(admin);
            }
        }

        let system_id = resources.database.ensure_admin("system").await?;
        resources
            .database
            .get_admin(system_id)
            .await?
            .ok_or_else(|| AppError::internal("System admin account missing"))
    }

    /// Get all site content for editing or rendering
    async fn get_content(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Json<ContentResponse>, AppError> {
        let settings = resources.database.all_settings().await?;

        let content = settings
            .into_iter()
            .map(|s| ContentItem {
                key: s.key,
                value: s.value,
                category: s.category,
                description: s.description,
                updated_at: s.updated_at,
            })
            .collect();

        Ok(Json(ContentResponse {
            success: true,
            content,
        }))
    }

    /// Apply a bulk content update: transactional write, version
    /// snapshot, then change broadcast
    async fn update_content(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<UpdateContentRequest>,
    ) -> Result<Json<UpdateContentResponse>, AppError> {
        if request.updates.is_empty() {
            return Err(AppError::invalid_input("No updates provided"));
        }

        let admin = Self::acting_admin(&headers, &resources).await?;

        let updated_items = resources
            .database
            .bulk_update_settings(&request.updates, admin.id)
            .await?;

        let snapshot = resources.database.snapshot_settings().await?;
        let version_id = resources
            .database
            .create_version(
                &snapshot,
                admin.id,
                &format!("Updated {} items", updated_items.len()),
            )
            .await?;

        for item in &updated_items {
            resources
                .broadcaster
                .register_change(&item.key, &item.new_value, Some(&admin.username));
        }

        info!(
            admin_id = admin.id,
            count = updated_items.len(),
            %version_id,
            "Applied content update"
        );

        let message = format!("Successfully updated {} items", updated_items.len());
        Ok(Json(UpdateContentResponse {
            success: true,
            updated_items,
            version_id,
            message,
        }))
    }

    /// Get content version history with admin usernames resolved
    async fn get_versions(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Json<VersionsResponse>, AppError> {
        let versions = resources.database.list_versions().await?;

        let mut views = Vec::with_capacity(versions.len());
        for version in versions {
            let admin_username = resources
                .database
                .get_admin(version.admin_id)
                .await?
                .map_or_else(|| "Unknown".to_owned(), |a| a.username);
            views.push(Self::version_view(version, admin_username));
        }

        Ok(Json(VersionsResponse {
            success: true,
            versions: views,
        }))
    }

    fn version_view(version: ContentVersion, admin_username: String) -> VersionView {
        VersionView {
            id: version.id,
            timestamp: version.timestamp,
            admin_id: version.admin_id,
            admin_username,
            action: version.action,
            item_count: version.content.len(),
        }
    }

    /// Roll content back to a previous version
    async fn rollback_content(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<RollbackRequest>,
    ) -> Result<Json<MessageResponse>, AppError> {
        if request.version_id.is_empty() {
            return Err(AppError::missing_field("version_id"));
        }

        let version_id = Uuid::parse_str(&request.version_id)
            .map_err(|_| AppError::invalid_input(format!("Invalid version id: {}", request.version_id)))?;

        let admin = Self::acting_admin(&headers, &resources).await?;

        // The returned snapshot is the broadcast source; at the
        // retention cap the appended rollback entry can evict the
        // target, so it must not be re-read by id
        let applied = resources
            .database
            .rollback_to_version(version_id, admin.id)
            .await?;

        // A rollback is a content mutation like any other; pollers see
        // every re-applied key
        for item in &applied.content {
            resources
                .broadcaster
                .register_change(&item.key, &item.value, Some(&admin.username));
        }

        Ok(Json(MessageResponse {
            success: true,
            message: format!("Successfully rolled back to version {version_id}"),
        }))
    }
}
