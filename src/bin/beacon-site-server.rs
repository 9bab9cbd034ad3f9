// ABOUTME: Server binary bootstrapping configuration, logging, database, and HTTP serving
// ABOUTME: Production entry point for the marketing-site backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Site Server Contributors

//! # Beacon Site Server Binary
//!
//! Starts the marketing-site backend: admin content API, polling sync,
//! contact capture, and visitor analytics.

use anyhow::Result;
use beacon_site_server::{
    config::{DatabaseUrl, ServerConfig},
    context::ServerResources,
    database::Database,
    logging, server,
    sync::ChangeBroadcaster,
};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "beacon-site-server")]
#[command(about = "Beacon Site Server - marketing site backend with live content editing")]
struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = DatabaseUrl::parse(&database_url);
    }

    info!("Starting Beacon Site Server");
    info!("{}", config.summary());

    let database = Database::new(&config.database_url.to_connection_string())
        .await?
        .with_version_retention(config.version_retention);
    info!("Database initialized");

    // Mutations always have an attributable fallback identity
    database.ensure_admin("system").await?;

    let broadcaster = Arc::new(ChangeBroadcaster::with_capacity(config.broadcast_capacity));
    let resources = Arc::new(ServerResources::new(database, broadcaster, config));

    server::serve(resources).await
}
