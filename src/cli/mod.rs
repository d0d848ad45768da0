pub mod auth;
pub mod chat;
pub mod doctor;
pub mod pages;
pub mod remind;
pub mod settings;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

use moodlog::api::ApiClient;
use moodlog::config::MoodlogConfig;
use moodlog::store::{LocalStore, SqliteStore};

/// Open the local store and an API client bound to it.
pub fn connect(config: &MoodlogConfig) -> Result<(Arc<dyn LocalStore>, Arc<ApiClient>)> {
    let db_path = config.resolved_db_path();
    let store: Arc<dyn LocalStore> = Arc::new(
        SqliteStore::open(&db_path)
            .with_context(|| format!("failed to open local store at {}", db_path.display()))?,
    );
    let api = Arc::new(ApiClient::new(&config.api.base_url, store.clone()));
    Ok((store, api))
}

/// Spinner shown while a request is outstanding. Drawn on stderr.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner} {msg}")
            .expect("valid template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}
