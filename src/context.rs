// ABOUTME: Centralized resource container for dependency injection across route handlers
// ABOUTME: Holds the shared database handle, change feed, and server configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Site Server Contributors

//! # Server Resources Module
//!
//! Centralized resource container for dependency injection. Expensive
//! shared resources are created once at startup and shared via `Arc`
//! instead of being recreated per request.

use crate::config::ServerConfig;
use crate::database::Database;
use crate::sync::ChangeFeed;
use std::sync::Arc;

/// Shared server resources injected into every route handler
#[derive(Clone)]
pub struct ServerResources {
    /// Database handle
    pub database: Arc<Database>,
    /// Recent-change feed consumed by pollers
    pub broadcaster: Arc<dyn ChangeFeed>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Create new server resources with proper `Arc` sharing
    #[must_use]
    pub fn new(
        database: Database,
        broadcaster: Arc<dyn ChangeFeed>,
        config: ServerConfig,
    ) -> Self {
        Self {
            database: Arc::new(database),
            broadcaster,
            config: Arc::new(config),
        }
    }
}
