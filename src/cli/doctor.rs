//! CLI `doctor` command: check the local store and the backend, print a report.

use anyhow::{Context, Result};
use std::time::Instant;

use moodlog::api::JournalApi;
use moodlog::config::MoodlogConfig;
use moodlog::session;
use moodlog::store::SqliteStore;

use super::connect;

/// Run local store diagnostics and a backend reachability check.
pub async fn doctor(config: &MoodlogConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    println!("moodlog Health Report");
    println!("=====================");
    println!();

    if !db_path.exists() {
        println!("Local store:       not found at {}", db_path.display());
        println!("It is created on first use, e.g. `moodlog guest`.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    let store = SqliteStore::open(&db_path).context("failed to open local store (may be corrupt)")?;
    let report = store.health().context("failed to run health check")?;

    println!("Local store:       {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!("Stored keys:       {}", report.key_count);
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
    }
    drop(store);
    println!();

    let (store, api) = connect(config)?;
    match session::current(store.as_ref())? {
        Some(s) => println!("Session:           signed in as {}", s.username()),
        None => println!("Session:           guest"),
    }

    println!("Backend:           {}", api.base_url());
    let started = Instant::now();
    match api.stats_overview().await {
        Ok(_) => println!("  Status:          reachable ({} ms)", started.elapsed().as_millis()),
        Err(e) => println!("  Status:          ERROR ({e})"),
    }

    if !report.integrity_ok {
        println!();
        println!("Recovery steps:");
        println!("  The local store only holds a session and guest caches.");
        println!("  Remove {} and sign in again.", db_path.display());
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
