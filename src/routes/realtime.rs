// ABOUTME: Polling endpoints exposing the change broadcaster to public pages
// ABOUTME: Serves incremental change lists and feed status without persistent connections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Site Server Contributors

//! Polling-based sync routes
//!
//! Clients poll on an interval of their choosing; staleness is bounded
//! only by that interval. After a server restart the change log is
//! empty, so clients seeing a gap re-read `GET /api/content` instead
//! of trusting the feed.

use axum::{extract::Query, extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::context::ServerResources;
use crate::sync::PollUpdates;

/// Query parameters for the poll endpoint
#[derive(Debug, Deserialize)]
pub struct PollParams {
    /// Unix timestamp of the client's last seen change
    pub since: Option<f64>,
}

/// Response for a poll request
#[derive(Debug, Serialize)]
pub struct PollResponse {
    /// Always `true` on this path
    pub success: bool,
    /// Changes since the requested timestamp
    pub data: PollUpdates,
}

/// Response for the status endpoint
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Always `true` on this path
    pub success: bool,
    /// Fixed "active" marker
    pub status: &'static str,
    /// Unix timestamp of the most recent change
    pub last_update: f64,
    /// Number of retained change records
    pub changes_count: usize,
}

/// Realtime sync routes implementation
pub struct RealtimeRoutes;

impl RealtimeRoutes {
    /// Create all polling routes
    #[must_use]
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/realtime/poll", get(Self::poll))
            .route("/api/realtime/status", get(Self::status))
            .with_state(resources)
    }

    /// Polling endpoint for content updates
    async fn poll(
        State(resources): State<Arc<ServerResources>>,
        Query(params): Query<PollParams>,
    ) -> Json<PollResponse> {
        let data = resources.broadcaster.recent_changes(params.since);
        Json(PollResponse {
            success: true,
            data,
        })
    }

    /// Feed status: freshness and retention counters
    async fn status(State(resources): State<Arc<ServerResources>>) -> Json<StatusResponse> {
        let stats = resources.broadcaster.stats();
        Json(StatusResponse {
            success: true,
            status: "active",
            last_update: stats.last_update,
            changes_count: stats.changes_count,
        })
    }
}
