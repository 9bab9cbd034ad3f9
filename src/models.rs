// ABOUTME: Core domain models for site settings, content versions, contacts, and analytics facts
// ABOUTME: Implements typed setting value parsing with documented default-on-failure semantics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Site Server Contributors

//! # Data Models
//!
//! Core data structures for the admin-managed content system: typed
//! site settings, full-state content version snapshots, contact leads,
//! and visitor analytics facts.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Declared type of a site setting's stored text value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Raw text, passed through unchanged
    Text,
    /// `YYYY-MM-DD`
    Date,
    /// `YYYY-MM-DD HH:MM:SS`
    DateTime,
    /// Integer first, then float, else 0
    Number,
    /// True iff lower-cased value is one of true/1/yes/on
    Boolean,
    /// Structured JSON, empty object on failure
    Json,
}

impl ValueType {
    /// Parse from the stored type tag, defaulting to text
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "date" => Self::Date,
            "datetime" => Self::DateTime,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    /// The tag stored in the database
    #[must_use]
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Json => "json",
        }
    }

    /// Parse a stored value according to this type
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] when the stored text does not match the
    /// declared type. Callers that need the lenient public contract use
    /// [`Self::parse_or_default`] instead.
    pub fn parse(&self, raw: &str) -> Result<ParsedValue, ParseError> {
        match self {
            Self::Text => Ok(ParsedValue::Text(raw.to_owned())),
            Self::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(ParsedValue::Date)
                .map_err(|_| ParseError::Date(raw.to_owned())),
            Self::DateTime => NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .map(ParsedValue::DateTime)
                .map_err(|_| ParseError::DateTime(raw.to_owned())),
            Self::Number => raw.trim().parse::<i64>().map(ParsedValue::Integer).or_else(
                |_| {
                    raw.trim()
                        .parse::<f64>()
                        .map(ParsedValue::Float)
                        .map_err(|_| ParseError::Number(raw.to_owned()))
                },
            ),
            Self::Boolean => Ok(ParsedValue::Boolean(matches!(
                raw.to_lowercase().as_str(),
                "true" | "1" | "yes" | "on"
            ))),
            Self::Json => serde_json::from_str(raw)
                .map(ParsedValue::Json)
                .map_err(|_| ParseError::Json(raw.to_owned())),
        }
    }

    /// Parse a stored value, degrading to the type default on failure
    ///
    /// Malformed values resolve to `None`, `0`, or an empty mapping
    /// rather than an error, so data-entry mistakes never break page
    /// rendering. Failures are logged at `warn` for visibility.
    #[must_use]
    pub fn parse_or_default(&self, key: &str, raw: &str) -> ParsedValue {
        match self.parse(raw) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(key, value_type = self.as_tag(), "{err}; using default");
                self.default_value()
            }
        }
    }

    /// The documented default for this type
    #[must_use]
    pub fn default_value(&self) -> ParsedValue {
        match self {
            Self::Text => ParsedValue::Text(String::new()),
            Self::Date => ParsedValue::MissingDate,
            Self::DateTime => ParsedValue::MissingDateTime,
            Self::Number => ParsedValue::Integer(0),
            Self::Boolean => ParsedValue::Boolean(false),
            Self::Json => ParsedValue::Json(serde_json::Value::Object(serde_json::Map::new())),
        }
    }
}

/// A stored setting value decoded according to its declared type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParsedValue {
    /// Text value
    Text(String),
    /// Well-formed date
    Date(NaiveDate),
    /// Well-formed datetime
    DateTime(NaiveDateTime),
    /// Integral number
    Integer(i64),
    /// Non-integral number
    Float(f64),
    /// Boolean flag
    Boolean(bool),
    /// Structured JSON value
    Json(serde_json::Value),
    /// Malformed date degraded to its None default
    MissingDate,
    /// Malformed datetime degraded to its None default
    MissingDateTime,
}

/// Type-mismatch errors produced when decoding stored setting values
#[derive(Debug, Error)]
pub enum ParseError {
    /// Value did not match `YYYY-MM-DD`
    #[error("invalid date value {0:?}, expected YYYY-MM-DD")]
    Date(String),
    /// Value did not match `YYYY-MM-DD HH:MM:SS`
    #[error("invalid datetime value {0:?}, expected YYYY-MM-DD HH:MM:SS")]
    DateTime(String),
    /// Value was neither integer nor float
    #[error("invalid numeric value {0:?}")]
    Number(String),
    /// Value was not valid JSON
    #[error("invalid json value {0:?}")]
    Json(String),
}

/// An admin-editable unit of site content or configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSetting {
    /// Globally unique key identifier
    pub key: String,
    /// Raw value, always stored as text
    pub value: String,
    /// Declared type used when decoding the value
    pub value_type: ValueType,
    /// Grouping category, defaults to "general"
    pub category: String,
    /// Human-readable description of what this setting controls
    pub description: Option<String>,
    /// When the setting was last modified
    pub updated_at: DateTime<Utc>,
    /// Admin who last modified the setting
    pub updated_by: Option<i64>,
}

impl SiteSetting {
    /// Decode the stored value according to its declared type,
    /// degrading to the type default on mismatch
    #[must_use]
    pub fn parsed_value(&self) -> ParsedValue {
        self.value_type.parse_or_default(&self.key, &self.value)
    }
}

/// One entry in the requested bulk content update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingUpdate {
    /// Setting key to create or update
    pub key: String,
    /// New raw value
    pub value: String,
    /// Category for newly created settings
    #[serde(default)]
    pub category: Option<String>,
    /// Description for newly created settings
    #[serde(default)]
    pub description: Option<String>,
}

/// Result of applying one entry of a bulk update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatedItem {
    /// Setting key
    pub key: String,
    /// Value before the update, `None` when the key was created
    pub old_value: Option<String>,
    /// Value after the update
    pub new_value: String,
}

/// One setting's state captured inside a version snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotItem {
    /// Setting key
    pub key: String,
    /// Raw value at snapshot time
    pub value: String,
    /// Category at snapshot time
    pub category: String,
    /// Description at snapshot time
    #[serde(default)]
    pub description: Option<String>,
}

/// One entry in the capped content version log, wrapping a full
/// snapshot of all settings plus metadata about who and why
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentVersion {
    /// Generated unique version id
    pub id: Uuid,
    /// When the snapshot was taken
    pub timestamp: DateTime<Utc>,
    /// Admin who triggered the snapshot
    pub admin_id: i64,
    /// Free-text description of the action that produced this version
    pub action: String,
    /// Full state of all settings at that moment, not a diff
    pub content: Vec<SnapshotItem>,
}

/// Minimal admin account record backing `updated_by` references
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    /// Row id
    pub id: i64,
    /// Login/display name
    pub username: String,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// A contact-form lead captured from the public site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    /// Row id
    pub id: i64,
    /// Sender name
    pub name: String,
    /// Sender email
    pub email: String,
    /// Optional subject line
    pub subject: Option<String>,
    /// Message body
    pub message: String,
    /// Admin-managed follow-up flag
    pub interested: bool,
    /// When the lead was captured
    pub created_at: DateTime<Utc>,
}

/// A single page view fact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageView {
    /// Row id
    pub id: i64,
    /// Anonymous per-browser-session visitor identifier
    pub visitor_id: Uuid,
    /// Browser session identifier
    pub session_id: Uuid,
    /// Requested page path
    pub page_path: String,
    /// When the view happened
    pub viewed_at: DateTime<Utc>,
}

/// A button click fact recorded by the tracking endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonClick {
    /// Row id
    pub id: i64,
    /// Anonymous visitor identifier
    pub visitor_id: Uuid,
    /// DOM identifier of the clicked button
    pub button_id: String,
    /// Visible text of the clicked button
    pub button_text: Option<String>,
    /// Page the click happened on
    pub page_path: String,
    /// When the click happened
    pub clicked_at: DateTime<Utc>,
}

/// Traffic medium bucket assigned to an external referrer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferralMedium {
    /// Search engine traffic
    Organic,
    /// Known social network traffic
    Social,
    /// Any other external referrer
    Referral,
}

impl ReferralMedium {
    /// The tag stored in the database
    #[must_use]
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Organic => "organic",
            Self::Social => "social",
            Self::Referral => "referral",
        }
    }
}

/// An external referrer fact recorded once per new session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralSource {
    /// Row id
    pub id: i64,
    /// Anonymous visitor identifier
    pub visitor_id: Uuid,
    /// Session the referral started
    pub session_id: Uuid,
    /// Bucketed source name (e.g. "google", "facebook", or the domain)
    pub source: String,
    /// Traffic medium bucket
    pub medium: ReferralMedium,
    /// Raw referrer URL as received
    pub referrer_url: String,
    /// When the referral was recorded
    pub recorded_at: DateTime<Utc>,
}

/// Per-browser-session duration record, 1:1 with a session id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDuration {
    /// Row id
    pub id: i64,
    /// Anonymous visitor identifier
    pub visitor_id: Uuid,
    /// Browser session identifier, unique per row
    pub session_id: Uuid,
    /// First request of the session
    pub start_time: DateTime<Utc>,
    /// Most recent request of the session
    pub end_time: DateTime<Utc>,
    /// `end_time - start_time`, recomputed on each request
    pub duration_seconds: i64,
    /// Monotonically increasing page view count
    pub pages_viewed: i64,
}
