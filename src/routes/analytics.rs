// ABOUTME: Analytics routes for click tracking and the admin dashboard summary
// ABOUTME: Click recording failures are logged and suppressed, never surfaced to visitors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Site Server Contributors

//! Analytics routes

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::analytics::{get_cookie_value, VISITOR_COOKIE};
use crate::context::ServerResources;
use crate::database::AnalyticsSummary;
use crate::errors::AppError;
use crate::routes::content::MessageResponse;

/// Click tracking request body
#[derive(Debug, Deserialize)]
pub struct TrackClickRequest {
    /// DOM identifier of the clicked button
    pub button_id: String,
    /// Visible text of the clicked button
    #[serde(default)]
    pub button_text: Option<String>,
    /// Page the click happened on
    #[serde(default)]
    pub page_path: Option<String>,
}

/// Response for the dashboard summary
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    /// Always `true` on this path
    pub success: bool,
    /// Aggregated analytics
    pub summary: AnalyticsSummary,
}

/// Analytics routes implementation
pub struct AnalyticsRoutes;

impl AnalyticsRoutes {
    /// Create all analytics routes
    #[must_use]
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/track-click", post(Self::track_click))
            .route("/admin/api/analytics/summary", get(Self::summary))
            .with_state(resources)
    }

    /// Record a button click tied to the visitor's anonymous id
    ///
    /// Storage failures are logged and suppressed; the tracking beacon
    /// always succeeds from the client's point of view.
    async fn track_click(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<TrackClickRequest>,
    ) -> Result<Json<MessageResponse>, AppError> {
        if request.button_id.is_empty() {
            return Err(AppError::missing_field("button_id"));
        }

        let visitor_id = get_cookie_value(&headers, VISITOR_COOKIE)
            .and_then(|v| Uuid::parse_str(&v).ok())
            .unwrap_or_else(Uuid::new_v4);
        let page_path = request.page_path.as_deref().unwrap_or("/");

        if let Err(err) = resources
            .database
            .record_button_click(
                visitor_id,
                &request.button_id,
                request.button_text.as_deref(),
                page_path,
            )
            .await
        {
            warn!(button_id = %request.button_id, "click recording failed: {err}");
        }

        Ok(Json(MessageResponse {
            success: true,
            message: "Click recorded".into(),
        }))
    }

    /// Aggregated analytics for the admin dashboard
    async fn summary(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Json<SummaryResponse>, AppError> {
        let summary = resources.database.analytics_summary().await?;
        Ok(Json(SummaryResponse {
            success: true,
            summary,
        }))
    }
}
