// ABOUTME: Seed binary populating default site settings and the default admin account
// ABOUTME: Supports resetting to defaults and printing the current settings by category
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Site Server Contributors

//! Seeds the database with the default dynamic site settings. Settings
//! are upserted, so re-running refreshes defaults without touching
//! admin-added keys; `--reset` clears the table first.

use anyhow::Result;
use beacon_site_server::{
    config::ServerConfig,
    database::Database,
    models::ValueType,
};
use clap::Parser;

#[derive(Parser)]
#[command(name = "seed-site-content")]
#[command(about = "Initialize or inspect the site's dynamic settings")]
struct Args {
    /// Clear existing settings before seeding
    #[arg(long)]
    reset: bool,

    /// Print current settings instead of seeding
    #[arg(long)]
    show: bool,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

/// (key, value, type, description, category)
const DEFAULT_SETTINGS: &[(&str, &str, ValueType, &str, &str)] = &[
    // Pricing
    (
        "regular_price",
        "2200",
        ValueType::Number,
        "Regular program price",
        "pricing",
    ),
    (
        "early_bird_price",
        "1650",
        ValueType::Number,
        "Early bird program price",
        "pricing",
    ),
    (
        "early_bird_savings",
        "550",
        ValueType::Number,
        "Amount saved with early bird",
        "pricing",
    ),
    ("currency", "AUD", ValueType::Text, "Currency code", "pricing"),
    // Dates
    (
        "next_session_start_date",
        "2026-10-07",
        ValueType::Date,
        "Next session start date",
        "dates",
    ),
    (
        "early_bird_deadline",
        "2026-09-30 23:59:59",
        ValueType::DateTime,
        "Early bird offer deadline",
        "dates",
    ),
    (
        "session_schedule",
        "Wednesdays & Thursdays, 7:00-9:00 PM",
        ValueType::Text,
        "Complete session schedule description",
        "dates",
    ),
    (
        "session_duration_weeks",
        "8",
        ValueType::Number,
        "Program duration in weeks",
        "dates",
    ),
    (
        "total_sessions",
        "16",
        ValueType::Number,
        "Total number of sessions",
        "dates",
    ),
    // Class capacity
    (
        "max_class_size",
        "10",
        ValueType::Number,
        "Maximum students per session",
        "general",
    ),
    (
        "available_spots",
        "10",
        ValueType::Number,
        "Currently available spots",
        "general",
    ),
    // Homepage content
    (
        "home_hero_title",
        "Launch Your Career with Beacon",
        ValueType::Text,
        "Homepage hero title",
        "content",
    ),
    (
        "home_hero_subtitle",
        "Job-ready online training, live instructors, small classes",
        ValueType::Text,
        "Homepage hero subtitle",
        "content",
    ),
    (
        "home_why_choose_title",
        "Why Choose Beacon?",
        ValueType::Text,
        "Why choose section title",
        "content",
    ),
    (
        "home_feature_1_title",
        "Practical Skills Training",
        ValueType::Text,
        "Feature 1 title",
        "content",
    ),
    (
        "home_feature_2_title",
        "Small Class Sizes",
        ValueType::Text,
        "Feature 2 title",
        "content",
    ),
    (
        "home_feature_3_title",
        "100% Online Access",
        ValueType::Text,
        "Feature 3 title",
        "content",
    ),
    (
        "home_info_session_title",
        "Join Our Free Info Session",
        ValueType::Text,
        "Info session section title",
        "content",
    ),
    // Site meta
    (
        "site_title",
        "Beacon Training Co.",
        ValueType::Text,
        "Site title",
        "general",
    ),
    (
        "site_description",
        "Professional training and career preparation",
        ValueType::Text,
        "Site meta description",
        "general",
    ),
    (
        "contact_email",
        "hello@beacontraining.example",
        ValueType::Text,
        "Primary contact email",
        "general",
    ),
    (
        "contact_phone",
        "+61 123 456 789",
        ValueType::Text,
        "Contact phone number",
        "general",
    ),
    (
        "announcement_banner_enabled",
        "false",
        ValueType::Boolean,
        "Show the site-wide announcement banner",
        "general",
    ),
    (
        "social_links",
        r#"{"facebook": "", "instagram": "", "linkedin": ""}"#,
        ValueType::Json,
        "Social profile URLs",
        "general",
    ),
];

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ServerConfig::from_env()?;
    let database_url = args
        .database_url
        .unwrap_or_else(|| config.database_url.to_connection_string());

    let database = Database::new(&database_url).await?;

    if args.show {
        show_settings(&database).await?;
        return Ok(());
    }

    if args.reset {
        let removed = database.reset_settings().await?;
        println!("Cleared {removed} existing settings");
    }

    database.ensure_admin("system").await?;
    database.ensure_admin("admin").await?;

    for (key, value, value_type, description, category) in DEFAULT_SETTINGS {
        database
            .seed_setting(key, value, *value_type, description, category)
            .await?;
        println!("Seeded setting: {key}");
    }

    println!(
        "\nSite settings initialized ({} keys). Edit them in the admin panel \
         and they propagate to the site without a redeploy.",
        DEFAULT_SETTINGS.len()
    );

    Ok(())
}

async fn show_settings(database: &Database) -> Result<()> {
    let settings = database.all_settings().await?;

    if settings.is_empty() {
        println!("No settings found in database.");
        return Ok(());
    }

    let mut current_category = String::new();
    for setting in settings {
        if setting.category != current_category {
            current_category = setting.category.clone();
            println!("\n=== {} ===", current_category.to_uppercase());
        }
        println!(
            "{}: {} ({})",
            setting.key,
            setting.value,
            setting.value_type.as_tag()
        );
    }

    Ok(())
}
