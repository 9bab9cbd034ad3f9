// ABOUTME: Integration tests for the setting store and the capped content version log
// ABOUTME: Covers round-trip parsing, bulk updates, retention, and rollback semantics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Site Server Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use beacon_site_server::database::{Database, VERSION_RETENTION};
use beacon_site_server::models::{ParsedValue, SettingUpdate, ValueType};
use tempfile::TempDir;
use uuid::Uuid;

async fn test_db() -> (Database, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}/test.db", dir.path().display());
    let db = Database::new(&url).await.unwrap();
    (db, dir)
}

fn update(key: &str, value: &str) -> SettingUpdate {
    SettingUpdate {
        key: key.to_owned(),
        value: value.to_owned(),
        category: None,
        description: None,
    }
}

#[tokio::test]
async fn test_set_then_get_round_trip() {
    let (db, _dir) = test_db().await;
    let admin_id = db.ensure_admin("alice").await.unwrap();

    let previous = db.set_setting(&update("site_title", "Acme"), admin_id).await.unwrap();
    assert!(previous.is_none());

    let setting = db.get_setting("site_title").await.unwrap().unwrap();
    assert_eq!(setting.value, "Acme");
    assert_eq!(setting.category, "general");
    assert_eq!(setting.updated_by, Some(admin_id));

    let previous = db.set_setting(&update("site_title", "Acme 2"), admin_id).await.unwrap();
    assert_eq!(previous.as_deref(), Some("Acme"));
}

#[tokio::test]
async fn test_typed_get_respects_declared_type() {
    let (db, _dir) = test_db().await;

    db.seed_setting("regular_price", "2200", ValueType::Number, "", "pricing")
        .await
        .unwrap();
    db.seed_setting("start_date", "2026-10-07", ValueType::Date, "", "dates")
        .await
        .unwrap();
    db.seed_setting("banner_enabled", "yes", ValueType::Boolean, "", "general")
        .await
        .unwrap();
    // Malformed for its declared type
    db.seed_setting("broken_price", "two thousand", ValueType::Number, "", "pricing")
        .await
        .unwrap();

    assert_eq!(
        db.get_parsed("regular_price").await.unwrap(),
        Some(ParsedValue::Integer(2200))
    );
    assert!(matches!(
        db.get_parsed("start_date").await.unwrap(),
        Some(ParsedValue::Date(_))
    ));
    assert_eq!(
        db.get_parsed("banner_enabled").await.unwrap(),
        Some(ParsedValue::Boolean(true))
    );
    assert_eq!(
        db.get_parsed("broken_price").await.unwrap(),
        Some(ParsedValue::Integer(0))
    );
    assert_eq!(db.get_parsed("absent_key").await.unwrap(), None);
}

#[tokio::test]
async fn test_bulk_update_creates_version_with_new_value() {
    let (db, _dir) = test_db().await;
    let admin_id = db.ensure_admin("alice").await.unwrap();

    db.set_setting(&update("site_title", "Old"), admin_id).await.unwrap();
    let versions_before = db.list_versions().await.unwrap().len();

    let items = db
        .bulk_update_settings(&[update("site_title", "New")], admin_id)
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].old_value.as_deref(), Some("Old"));
    assert_eq!(items[0].new_value, "New");

    let snapshot = db.snapshot_settings().await.unwrap();
    let version_id = db
        .create_version(&snapshot, admin_id, "Updated 1 items")
        .await
        .unwrap();

    let setting = db.get_setting("site_title").await.unwrap().unwrap();
    assert_eq!(setting.value, "New");

    let versions = db.list_versions().await.unwrap();
    assert_eq!(versions.len(), versions_before + 1);

    let created = versions.iter().find(|v| v.id == version_id).unwrap();
    let snapshot_item = created.content.iter().find(|i| i.key == "site_title").unwrap();
    assert_eq!(snapshot_item.value, "New");
}

#[tokio::test]
async fn test_bulk_update_skips_empty_keys() {
    let (db, _dir) = test_db().await;
    let admin_id = db.ensure_admin("alice").await.unwrap();

    let items = db
        .bulk_update_settings(&[update("", "ignored"), update("kept", "v")], admin_id)
        .await
        .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].key, "kept");
    assert!(db.get_setting("").await.unwrap().is_none());
}

#[tokio::test]
async fn test_version_log_retention_cap() {
    let (db, _dir) = test_db().await;
    let admin_id = db.ensure_admin("alice").await.unwrap();
    let snapshot = Vec::new();

    let first = db.create_version(&snapshot, admin_id, "V1").await.unwrap();
    for n in 2..=(VERSION_RETENTION + 1) {
        db.create_version(&snapshot, admin_id, &format!("V{n}"))
            .await
            .unwrap();
    }

    let versions = db.list_versions().await.unwrap();
    assert_eq!(versions.len() as i64, VERSION_RETENTION);
    // The oldest entry was evicted first
    assert!(!versions.iter().any(|v| v.id == first));
    assert_eq!(versions[0].action, "V2");
}

#[tokio::test]
async fn test_version_retention_is_configurable() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}/test.db", dir.path().display());
    let db = Database::new(&url).await.unwrap().with_version_retention(3);
    let admin_id = db.ensure_admin("alice").await.unwrap();

    for n in 1..=5 {
        db.create_version(&[], admin_id, &format!("V{n}")).await.unwrap();
    }

    let versions = db.list_versions().await.unwrap();
    assert_eq!(versions.len(), 3);
    assert_eq!(versions[0].action, "V3");
}

#[tokio::test]
async fn test_rollback_appends_exactly_one_version() {
    let (db, _dir) = test_db().await;
    let admin_id = db.ensure_admin("alice").await.unwrap();

    db.set_setting(&update("site_title", "Original"), admin_id).await.unwrap();
    let snapshot = db.snapshot_settings().await.unwrap();
    let target = db.create_version(&snapshot, admin_id, "Initial").await.unwrap();

    db.set_setting(&update("site_title", "Changed"), admin_id).await.unwrap();
    let count_before = db.list_versions().await.unwrap().len();

    db.rollback_to_version(target, admin_id).await.unwrap();

    let versions = db.list_versions().await.unwrap();
    assert_eq!(versions.len(), count_before + 1);
    // History is append-only; the target entry is still present
    assert!(versions.iter().any(|v| v.id == target));
    let newest = versions.last().unwrap();
    assert_eq!(newest.action, format!("Rollback to version {target}"));

    // The rollback re-applied the old value
    let setting = db.get_setting("site_title").await.unwrap().unwrap();
    assert_eq!(setting.value, "Original");
}

#[tokio::test]
async fn test_rollback_unknown_id_leaves_state_untouched() {
    let (db, _dir) = test_db().await;
    let admin_id = db.ensure_admin("alice").await.unwrap();

    db.set_setting(&update("site_title", "Kept"), admin_id).await.unwrap();
    let snapshot = db.snapshot_settings().await.unwrap();
    db.create_version(&snapshot, admin_id, "Initial").await.unwrap();
    let versions_before = db.list_versions().await.unwrap().len();

    let err = db
        .rollback_to_version(Uuid::new_v4(), admin_id)
        .await
        .unwrap_err();
    assert_eq!(
        err.code,
        beacon_site_server::errors::ErrorCode::ResourceNotFound
    );

    assert_eq!(db.list_versions().await.unwrap().len(), versions_before);
    let setting = db.get_setting("site_title").await.unwrap().unwrap();
    assert_eq!(setting.value, "Kept");
}

#[tokio::test]
async fn test_rollback_to_oldest_entry_at_retention_cap() {
    let (db, _dir) = test_db().await;
    let admin_id = db.ensure_admin("alice").await.unwrap();

    db.set_setting(&update("site_title", "Original"), admin_id).await.unwrap();
    let snapshot = db.snapshot_settings().await.unwrap();
    let target = db.create_version(&snapshot, admin_id, "Initial").await.unwrap();

    db.set_setting(&update("site_title", "Changed"), admin_id).await.unwrap();
    let later = db.snapshot_settings().await.unwrap();
    for n in 1..VERSION_RETENTION {
        db.create_version(&later, admin_id, &format!("Edit {n}"))
            .await
            .unwrap();
    }
    assert_eq!(db.list_versions().await.unwrap().len() as i64, VERSION_RETENTION);

    // Appending the rollback entry evicts the target itself; the
    // rollback still commits and hands back the applied snapshot
    let applied = db.rollback_to_version(target, admin_id).await.unwrap();
    assert!(applied
        .content
        .iter()
        .any(|i| i.key == "site_title" && i.value == "Original"));

    let setting = db.get_setting("site_title").await.unwrap().unwrap();
    assert_eq!(setting.value, "Original");

    let versions = db.list_versions().await.unwrap();
    assert_eq!(versions.len() as i64, VERSION_RETENTION);
    assert!(!versions.iter().any(|v| v.id == target));
    assert_eq!(
        versions.last().unwrap().action,
        format!("Rollback to version {target}")
    );
}

#[tokio::test]
async fn test_rollback_is_full_replace() {
    let (db, _dir) = test_db().await;
    let admin_id = db.ensure_admin("alice").await.unwrap();

    db.set_setting(&update("a", "1"), admin_id).await.unwrap();
    db.set_setting(&update("b", "1"), admin_id).await.unwrap();
    let snapshot = db.snapshot_settings().await.unwrap();
    let target = db.create_version(&snapshot, admin_id, "Initial").await.unwrap();

    // Both keys intentionally changed after the target version
    db.set_setting(&update("a", "2"), admin_id).await.unwrap();
    db.set_setting(&update("b", "2"), admin_id).await.unwrap();
    // And one key added after the target
    db.set_setting(&update("c", "new"), admin_id).await.unwrap();

    db.rollback_to_version(target, admin_id).await.unwrap();

    // Every key present in the snapshot is re-applied
    assert_eq!(db.get_setting("a").await.unwrap().unwrap().value, "1");
    assert_eq!(db.get_setting("b").await.unwrap().unwrap().value, "1");
    // Keys absent from the snapshot are not deleted
    assert_eq!(db.get_setting("c").await.unwrap().unwrap().value, "new");
}

#[tokio::test]
async fn test_rollback_recreates_deleted_settings() {
    let (db, _dir) = test_db().await;
    let admin_id = db.ensure_admin("alice").await.unwrap();

    db.set_setting(&update("ephemeral", "v"), admin_id).await.unwrap();
    let snapshot = db.snapshot_settings().await.unwrap();
    let target = db.create_version(&snapshot, admin_id, "Initial").await.unwrap();

    db.reset_settings().await.unwrap();
    assert!(db.get_setting("ephemeral").await.unwrap().is_none());

    db.rollback_to_version(target, admin_id).await.unwrap();
    assert_eq!(
        db.get_setting("ephemeral").await.unwrap().unwrap().value,
        "v"
    );
}
