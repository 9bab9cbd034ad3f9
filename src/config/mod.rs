// ABOUTME: Configuration module organization for the site server
// ABOUTME: Exposes environment-based server configuration types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Site Server Contributors

//! Configuration management for deployment-specific settings

/// Environment-based server configuration
pub mod environment;

pub use environment::{DatabaseUrl, Environment, LogLevel, ServerConfig};
