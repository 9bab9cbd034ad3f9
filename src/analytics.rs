// ABOUTME: Visitor analytics recording via request middleware and referral classification
// ABOUTME: Manages anonymous visitor/session cookies and page view tracking
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Site Server Contributors

//! # Analytics Recorder
//!
//! Records page views, session durations, and referral sources from a
//! request middleware layer. Visitors are identified by an anonymous,
//! session-scoped identifier carried in cookies; no personal data is
//! collected. Every recording path catches and logs its own errors so
//! analytics can never break the primary page response.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue, Method};
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;
use tracing::warn;
use url::Url;
use uuid::Uuid;

use crate::context::ServerResources;
use crate::models::ReferralMedium;

/// Cookie carrying the anonymous visitor identifier
pub const VISITOR_COOKIE: &str = "visitor_id";
/// Cookie carrying the browser session identifier
pub const SESSION_COOKIE: &str = "session_id";

/// Search engine domains bucketed as organic traffic
const SEARCH_ENGINES: &[&str] = &[
    "google", "bing", "yahoo", "duckduckgo", "baidu", "yandex", "ecosia",
];

/// Social network domains bucketed as social traffic
const SOCIAL_NETWORKS: &[&str] = &[
    "facebook",
    "instagram",
    "twitter",
    "x.com",
    "linkedin",
    "tiktok",
    "youtube",
    "pinterest",
    "reddit",
    "threads",
];

/// Extract a cookie value from request headers
#[must_use]
pub fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (cookie_name, value) = pair.trim().split_once('=')?;
        (cookie_name == name).then(|| value.to_owned())
    })
}

/// Classify an external referrer by domain-substring heuristics
///
/// Best-effort bucketing, not a security-relevant classification:
/// lookalike or subdomain-spoofed referrers can misclassify. Returns
/// `None` for same-site or unparseable referrers.
#[must_use]
pub fn classify_referrer(
    referrer: &str,
    own_host: Option<&str>,
) -> Option<(String, ReferralMedium)> {
    let url = Url::parse(referrer).ok()?;
    let host = url.host_str()?.to_lowercase();

    // Same-site navigation is not a referral
    if let Some(own) = own_host {
        if host == own.to_lowercase() {
            return None;
        }
    }

    for engine in SEARCH_ENGINES {
        if host.contains(engine) {
            return Some(((*engine).to_owned(), ReferralMedium::Organic));
        }
    }

    for network in SOCIAL_NETWORKS {
        if host.contains(network) {
            return Some(((*network).to_owned(), ReferralMedium::Social));
        }
    }

    Some((host, ReferralMedium::Referral))
}

/// Whether a request counts as a page view
///
/// Only GET requests for public pages qualify; static assets, admin
/// paths, API calls, and infrastructure endpoints are skipped.
#[must_use]
pub fn is_trackable(method: &Method, path: &str) -> bool {
    if method != Method::GET {
        return false;
    }

    let excluded_prefixes = ["/static", "/admin", "/api", "/health", "/ready", "/favicon"];
    !excluded_prefixes
        .iter()
        .any(|prefix| path.starts_with(prefix))
}

/// Visitor and session identity resolved for one request
struct VisitorIdentity {
    visitor_id: Uuid,
    session_id: Uuid,
    minted: bool,
}

fn resolve_identity(headers: &HeaderMap) -> VisitorIdentity {
    let visitor_id = get_cookie_value(headers, VISITOR_COOKIE)
        .and_then(|v| Uuid::parse_str(&v).ok());
    let session_id = get_cookie_value(headers, SESSION_COOKIE)
        .and_then(|v| Uuid::parse_str(&v).ok());

    let minted = visitor_id.is_none() || session_id.is_none();
    VisitorIdentity {
        visitor_id: visitor_id.unwrap_or_else(Uuid::new_v4),
        session_id: session_id.unwrap_or_else(Uuid::new_v4),
        minted,
    }
}

/// Record the request-side analytics facts for one page view
async fn record_request(
    resources: &ServerResources,
    identity: &VisitorIdentity,
    path: &str,
    headers: &HeaderMap,
) -> crate::errors::AppResult<()> {
    let db = &resources.database;

    db.record_page_view(identity.visitor_id, identity.session_id, path)
        .await?;

    let existing = db.get_session_duration(identity.session_id).await?;
    if existing.is_some() {
        db.increment_session_pages(identity.session_id).await?;
        return Ok(());
    }

    // First view of a new session
    db.start_session(identity.visitor_id, identity.session_id)
        .await?;

    let referrer = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if referrer.is_empty() {
        return Ok(());
    }

    let own_host = headers.get(header::HOST).and_then(|v| v.to_str().ok());
    if let Some((source, medium)) = classify_referrer(referrer, own_host) {
        db.record_referral(
            identity.visitor_id,
            identity.session_id,
            &source,
            medium,
            referrer,
        )
        .await?;
    }

    Ok(())
}

/// Request middleware recording page views and session durations
///
/// Recording failures are logged and suppressed; the page response is
/// returned regardless.
pub async fn track_page_view(
    State(resources): State<Arc<ServerResources>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    if !is_trackable(&method, &path) {
        return next.run(request).await;
    }

    let identity = resolve_identity(request.headers());

    if let Err(err) = record_request(&resources, &identity, &path, request.headers()).await {
        warn!(path, "analytics recording failed: {err}");
    }

    let mut response = next.run(request).await;

    // Response completion: recompute the session's end time and duration
    if let Err(err) = resources
        .database
        .touch_session_end(identity.session_id)
        .await
    {
        warn!(path, "session finalize failed: {err}");
    }

    if identity.minted {
        append_identity_cookies(&mut response, &identity);
    }

    response
}

fn append_identity_cookies(response: &mut Response, identity: &VisitorIdentity) {
    for (name, id) in [
        (VISITOR_COOKIE, identity.visitor_id),
        (SESSION_COOKIE, identity.session_id),
    ] {
        let cookie = format!("{name}={id}; Path=/; HttpOnly; SameSite=Lax");
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
}
