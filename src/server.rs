// ABOUTME: HTTP server assembly wiring routes, middleware layers, and graceful shutdown
// ABOUTME: Serves API routes plus a minimal public page fallback feeding the analytics layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Site Server Contributors

//! Server assembly and lifecycle

use anyhow::Result;
use axum::{
    extract::{Request, State},
    middleware,
    response::Html,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::analytics;
use crate::context::ServerResources;
use crate::models::ParsedValue;
use crate::routes::{AnalyticsRoutes, ContactRoutes, ContentRoutes, HealthRoutes, RealtimeRoutes};

/// Assemble the full application router
#[must_use]
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let public_pages = Router::new()
        .fallback(public_page)
        .with_state(resources.clone());

    Router::new()
        .merge(ContentRoutes::routes(resources.clone()))
        .merge(RealtimeRoutes::routes(resources.clone()))
        .merge(AnalyticsRoutes::routes(resources.clone()))
        .merge(ContactRoutes::routes(resources.clone()))
        .merge(HealthRoutes::routes())
        .merge(public_pages)
        .layer(middleware::from_fn_with_state(
            resources,
            analytics::track_page_view,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Minimal public page shell
///
/// Page rendering proper is delegated to the templating front-end;
/// this fallback keeps public paths resolvable so the analytics layer
/// sees real page requests, and proves content propagation by echoing
/// the live site title.
async fn public_page(
    State(resources): State<Arc<ServerResources>>,
    request: Request,
) -> Html<String> {
    let site_title = resources
        .database
        .get_parsed("site_title")
        .await
        .ok()
        .flatten()
        .and_then(|value| match value {
            ParsedValue::Text(text) if !text.is_empty() => Some(text),
            _ => None,
        })
        .unwrap_or_else(|| "Beacon".to_owned());

    Html(format!(
        "<!DOCTYPE html><html><head><title>{site_title}</title></head>\
         <body><h1>{site_title}</h1><p>{}</p></body></html>",
        request.uri().path()
    ))
}

/// Bind the configured port and serve until shutdown
///
/// # Errors
///
/// Returns an error if binding or serving fails
pub async fn serve(resources: Arc<ServerResources>) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], resources.config.http_port));
    let router = build_router(resources);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install shutdown handler: {err}");
    }
    info!("Shutdown signal received");
}
