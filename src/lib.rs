// ABOUTME: Main library entry point for the Beacon marketing-site backend
// ABOUTME: Provides the admin content API, polling sync, and visitor analytics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Site Server Contributors

#![deny(unsafe_code)]

//! # Beacon Site Server
//!
//! A small-business marketing-site backend with an admin-managed
//! content system: typed key-value site settings edited live from an
//! admin panel, a capped full-snapshot version log with rollback, a
//! polling-based change feed so public pages pick up edits without
//! redeploys, and anonymous visitor analytics.
//!
//! ## Architecture
//!
//! - **Setting Store**: typed key-value table backing all editable
//!   site text, pricing, and dates
//! - **Version Log**: append-only, capped history of full content
//!   snapshots enabling rollback
//! - **Change Broadcaster**: in-memory log of recent mutations served
//!   to pollers
//! - **Analytics Recorder**: page view, click, referral, and session
//!   duration facts with dashboard aggregation
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use beacon_site_server::config::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Beacon site server configured: {}", config.summary());
//!     Ok(())
//! }
//! ```

/// Visitor analytics middleware and referral classification
pub mod analytics;

/// Environment-based server configuration
pub mod config;

/// Shared resource container for dependency injection
pub mod context;

/// SQLite persistence for settings, versions, contacts, and analytics
pub mod database;

/// Unified error handling and the JSON failure envelope
pub mod errors;

/// Structured logging configuration
pub mod logging;

/// Core domain models and typed setting value parsing
pub mod models;

/// `HTTP` routes organized by domain
pub mod routes;

/// Router assembly and server lifecycle
pub mod server;

/// In-memory change broadcaster backing the polling sync
pub mod sync;
