// ABOUTME: Route module organization for the site server HTTP endpoints
// ABOUTME: Groups route definitions by domain with thin handlers delegating to storage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Site Server Contributors

//! Route modules organized by domain. Each module exposes a unit
//! struct with a `routes()` constructor returning an axum `Router`;
//! handlers stay thin and delegate to the database and broadcaster.

/// Analytics tracking and dashboard summary routes
pub mod analytics;
/// Admin content editing, version history, and public full-sync routes
pub mod content;
/// Contact lead capture and admin follow-up routes
pub mod contacts;
/// Health check and system status routes
pub mod health;
/// Polling endpoints for the change broadcaster
pub mod realtime;

pub use analytics::AnalyticsRoutes;
pub use content::ContentRoutes;
pub use contacts::ContactRoutes;
pub use health::HealthRoutes;
pub use realtime::RealtimeRoutes;
