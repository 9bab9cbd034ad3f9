// ABOUTME: In-memory change broadcaster backing the polling-based content sync
// ABOUTME: Keeps a capped ring of recent mutations plus a last-update clock
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Site Server Contributors

//! # Change Broadcaster
//!
//! Models "real-time" content propagation without a persistent
//! connection: every content mutation is appended to a bounded
//! in-memory log that public pages poll on an interval. State is
//! process-local and lost on restart; clients recover from a gap by
//! re-reading the full Setting Store via `GET /api/content`.
//!
//! Multi-process deployments get an independent, inconsistent view per
//! process. The [`ChangeFeed`] trait is the seam for swapping in a
//! shared backing store when cross-process consistency is required.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Default poll window when the client supplies no `since` timestamp
const DEFAULT_POLL_WINDOW_SECS: f64 = 60.0;

/// Maximum change records retained before oldest are evicted
pub const DEFAULT_CHANGE_CAPACITY: usize = 100;

/// One recorded content mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentChange {
    /// Setting key that changed
    pub key: String,
    /// New value
    pub value: String,
    /// Server-clock unix timestamp (seconds)
    pub timestamp: f64,
    /// Acting admin's username, "System" when unattributed
    pub admin_username: String,
    /// Monotonically increasing sequence id
    pub id: u64,
}

/// Poll response payload: changes since the requested timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollUpdates {
    /// Changes with `timestamp > since`, oldest first
    pub changes: Vec<ContentChange>,
    /// Unix timestamp of the most recent registered change
    pub last_update: f64,
    /// Server time when the poll was answered
    pub timestamp: f64,
}

/// Broadcaster statistics for the status endpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeedStats {
    /// Unix timestamp of the most recent registered change
    pub last_update: f64,
    /// Number of change records currently retained
    pub changes_count: usize,
}

/// Source of recent content changes for pollers
///
/// The in-memory [`ChangeBroadcaster`] is the only implementation;
/// a shared external store can implement this to serve multi-process
/// deployments.
pub trait ChangeFeed: Send + Sync {
    /// Record a content mutation
    fn register_change(&self, key: &str, value: &str, admin_username: Option<&str>);
    /// Changes since a timestamp; `None` defaults to the last 60 seconds
    fn recent_changes(&self, since: Option<f64>) -> PollUpdates;
    /// Cheap staleness check without serializing the change list
    fn has_updates(&self, since: f64) -> bool;
    /// Retention and freshness statistics
    fn stats(&self) -> FeedStats;
}

struct FeedState {
    changes: VecDeque<ContentChange>,
    last_update: f64,
    next_id: u64,
}

/// Process-wide in-memory change log, shared across request handlers
///
/// Bounded ring buffer guarded by a mutex; contention is negligible at
/// admin-edit rates. Not persisted: a restart drops all unconsumed
/// history.
pub struct ChangeBroadcaster {
    state: Mutex<FeedState>,
    capacity: usize,
}

fn unix_now() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

impl ChangeBroadcaster {
    /// Create a broadcaster with the default retention cap
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANGE_CAPACITY)
    }

    /// Create a broadcaster retaining at most `capacity` changes
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(FeedState {
                changes: VecDeque::with_capacity(capacity),
                last_update: unix_now(),
                next_id: 0,
            }),
            capacity,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FeedState> {
        // Recover from poisoning; the feed stays serviceable
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for ChangeBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed for ChangeBroadcaster {
    fn register_change(&self, key: &str, value: &str, admin_username: Option<&str>) {
        let now = unix_now();
        let mut state = self.lock();

        let id = state.next_id;
        state.next_id += 1;
        state.changes.push_back(ContentChange {
            key: key.to_owned(),
            value: value.to_owned(),
            timestamp: now,
            admin_username: admin_username.unwrap_or("System").to_owned(),
            id,
        });
        state.last_update = now;

        while state.changes.len() > self.capacity {
            state.changes.pop_front();
        }
    }

    fn recent_changes(&self, since: Option<f64>) -> PollUpdates {
        let now = unix_now();
        // A client that has never polled gets a short window, not the
        // full backlog
        let since = since.unwrap_or(now - DEFAULT_POLL_WINDOW_SECS);
        let state = self.lock();

        let changes = state
            .changes
            .iter()
            .filter(|change| change.timestamp > since)
            .cloned()
            .collect();

        PollUpdates {
            changes,
            last_update: state.last_update,
            timestamp: now,
        }
    }

    fn has_updates(&self, since: f64) -> bool {
        self.lock().last_update > since
    }

    fn stats(&self) -> FeedStats {
        let state = self.lock();
        FeedStats {
            last_update: state.last_update,
            changes_count: state.changes.len(),
        }
    }
}
