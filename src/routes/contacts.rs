// ABOUTME: Contact lead routes for public form submission and admin follow-up
// ABOUTME: Validates required fields and reports JSON failure envelopes on bad input
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Site Server Contributors

//! Contact lead-capture routes

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::context::ServerResources;
use crate::errors::AppError;
use crate::models::Contact;
use crate::routes::content::MessageResponse;

/// Contact form submission body
#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    /// Sender name
    pub name: String,
    /// Sender email
    pub email: String,
    /// Optional subject line
    #[serde(default)]
    pub subject: Option<String>,
    /// Message body
    pub message: String,
}

/// Response for a stored lead
#[derive(Debug, Serialize)]
pub struct ContactCreatedResponse {
    /// Always `true` on this path
    pub success: bool,
    /// Row id of the stored lead
    pub id: i64,
    /// Human-readable confirmation
    pub message: String,
}

/// Response for the admin lead listing
#[derive(Debug, Serialize)]
pub struct ContactListResponse {
    /// Always `true` on this path
    pub success: bool,
    /// Leads, newest first
    pub contacts: Vec<Contact>,
}

/// Interested-flag toggle body
#[derive(Debug, Deserialize)]
pub struct InterestedRequest {
    /// New flag value
    pub interested: bool,
}

/// Contact routes implementation
pub struct ContactRoutes;

impl ContactRoutes {
    /// Create all contact routes
    #[must_use]
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/contact", post(Self::submit_contact))
            .route("/admin/api/contacts", get(Self::list_contacts))
            .route(
                "/admin/api/contacts/:id/interested",
                post(Self::set_interested),
            )
            .with_state(resources)
    }

    /// Store a contact-form lead
    async fn submit_contact(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<ContactRequest>,
    ) -> Result<Json<ContactCreatedResponse>, AppError> {
        if request.name.trim().is_empty() {
            return Err(AppError::missing_field("name"));
        }
        if request.message.trim().is_empty() {
            return Err(AppError::missing_field("message"));
        }
        if !request.email.contains('@') {
            return Err(AppError::invalid_input(format!(
                "Invalid email address: {}",
                request.email
            )));
        }

        let id = resources
            .database
            .create_contact(
                request.name.trim(),
                request.email.trim(),
                request.subject.as_deref(),
                request.message.trim(),
            )
            .await?;

        info!(contact_id = id, "Stored contact lead");

        Ok(Json(ContactCreatedResponse {
            success: true,
            id,
            message: "Thanks for getting in touch! We'll reply shortly.".into(),
        }))
    }

    /// List all leads for the admin panel
    async fn list_contacts(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Json<ContactListResponse>, AppError> {
        let contacts = resources.database.list_contacts().await?;
        Ok(Json(ContactListResponse {
            success: true,
            contacts,
        }))
    }

    /// Toggle the interested follow-up flag on a lead
    async fn set_interested(
        State(resources): State<Arc<ServerResources>>,
        Path(contact_id): Path<i64>,
        Json(request): Json<InterestedRequest>,
    ) -> Result<Json<MessageResponse>, AppError> {
        resources
            .database
            .set_contact_interested(contact_id, request.interested)
            .await?;

        Ok(Json(MessageResponse {
            success: true,
            message: format!("Contact {contact_id} updated"),
        }))
    }
}
