#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{watch, Notify};

use moodlog::api::types::{
    AuthResponse, ChatReply, DailySummary, Entry, Settings, StatsOverview, UserProfile,
    WeeklySummary,
};
use moodlog::api::{ApiError, JournalApi};
use moodlog::pages::{DashboardData, HomeData};
use moodlog::reminder::{Clock, Notifier, Prompt, ReminderConfig, ReminderSource, ReminderTime};
use moodlog::session;
use moodlog::store::{keys, Batch, LocalStore, MemoryStore};

/// A fresh in-memory store with no session.
pub fn guest_store() -> Arc<dyn LocalStore> {
    Arc::new(MemoryStore::new())
}

/// A fresh in-memory store holding a session for `sam`.
pub fn authenticated_store() -> Arc<dyn LocalStore> {
    let store = guest_store();
    login(store.as_ref());
    store
}

/// Guest store that signs in right after the `n`th read of the credential,
/// as a login from another task or process would.
pub struct LoginAfterReads {
    inner: MemoryStore,
    reads: AtomicUsize,
    login_after: usize,
}

impl LoginAfterReads {
    pub fn new(login_after: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStore::new(),
            reads: AtomicUsize::new(0),
            login_after,
        })
    }
}

impl LocalStore for LoginAfterReads {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let value = self.inner.get(key)?;
        if key == keys::TOKEN && self.reads.fetch_add(1, Ordering::SeqCst) + 1 == self.login_after {
            login(&self.inner);
        }
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.inner.remove(key)
    }

    fn apply(&self, batch: Batch) -> anyhow::Result<()> {
        self.inner.apply(batch)
    }

    fn set_unless_present(&self, guard: &str, key: &str, value: &str) -> anyhow::Result<bool> {
        self.inner.set_unless_present(guard, key, value)
    }

    fn keys(&self) -> anyhow::Result<Vec<String>> {
        self.inner.keys()
    }
}

pub fn login(store: &dyn LocalStore) {
    session::establish(store, &auth_response()).unwrap();
}

pub fn auth_response() -> AuthResponse {
    AuthResponse {
        access_token: "token-123".into(),
        user: UserProfile {
            id: Some(1),
            username: "sam".into(),
            email: Some("sam@example.com".into()),
        },
    }
}

pub fn entry(created_at: &str, label: &str, message: &str) -> Entry {
    Entry {
        id: None,
        user_message: message.into(),
        eli_response: format!("reply to {message}"),
        sentiment_label: Some(label.into()),
        mood_tags: Some("calm".into()),
        created_at: created_at.into(),
    }
}

pub fn stats(total: u64) -> StatsOverview {
    StatsOverview {
        total_entries: total,
        entries_this_week: total.min(7),
        entries_today: 1,
        avg_sentiment_this_week: 0.62,
    }
}

pub fn weekly(entry_count: u64) -> WeeklySummary {
    WeeklySummary {
        insights: "A mostly calm week.".into(),
        entry_count,
        positive_count: entry_count,
        negative_count: 0,
        neutral_count: 0,
        week_start: Some("2026-05-11".into()),
    }
}

pub fn home_data(total: u64) -> HomeData {
    HomeData {
        stats: stats(total),
        entries: vec![entry("2026-05-14T08:00:00", "positive", "good morning")],
        weekly_summary: weekly(total),
    }
}

/// Scriptable backend for pages and the reminder source.
///
/// Every call counts itself, then waits at the gate (open by default).
pub struct FakeApi {
    pub total_entries: AtomicUsize,
    pub fail_stats: AtomicBool,
    pub fail_all: AtomicBool,
    pub fail_chat: AtomicBool,
    pub today: Mutex<Vec<Entry>>,
    pub settings: Mutex<Settings>,
    pub calls: Mutex<Vec<&'static str>>,
    gate: watch::Sender<bool>,
    /// Signalled whenever a call reaches the gate.
    pub entered: Notify,
}

impl Default for FakeApi {
    fn default() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            total_entries: AtomicUsize::new(5),
            fail_stats: AtomicBool::new(false),
            fail_all: AtomicBool::new(false),
            fail_chat: AtomicBool::new(false),
            today: Mutex::new(Vec::new()),
            settings: Mutex::new(Settings::default()),
            calls: Mutex::new(Vec::new()),
            gate,
            entered: Notify::new(),
        }
    }
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Block every call at the gate until [`FakeApi::release`].
    pub fn hold(&self) {
        self.gate.send_replace(false);
    }

    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| **c == name).count()
    }

    async fn enter(&self, name: &'static str) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(name);
        self.entered.notify_one();
        let mut open = self.gate.subscribe();
        let _ = open.wait_for(|open| *open).await;
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(())
    }
}

fn unavailable() -> ApiError {
    ApiError::Status {
        status: 503,
        detail: Some("backend unavailable".into()),
    }
}

#[async_trait]
impl JournalApi for FakeApi {
    async fn stats_overview(&self) -> Result<StatsOverview, ApiError> {
        self.enter("stats_overview").await?;
        if self.fail_stats.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(stats(self.total_entries.load(Ordering::SeqCst) as u64))
    }

    async fn entries(&self, _days: u32) -> Result<Vec<Entry>, ApiError> {
        self.enter("entries").await?;
        Ok(vec![
            entry("2026-05-14T08:00:00", "positive", "good morning"),
            entry("2026-05-13T21:00:00", "negative", "long day"),
        ])
    }

    async fn entries_today(&self) -> Result<Vec<Entry>, ApiError> {
        self.enter("entries_today").await?;
        Ok(self.today.lock().unwrap().clone())
    }

    async fn daily_summary(&self) -> Result<DailySummary, ApiError> {
        self.enter("daily_summary").await?;
        Ok(DailySummary {
            summary: "You checked in once today.".into(),
            entry_count: 1,
            date: Some("2026-05-14".into()),
        })
    }

    async fn weekly_summary(&self) -> Result<WeeklySummary, ApiError> {
        self.enter("weekly_summary").await?;
        Ok(weekly(self.total_entries.load(Ordering::SeqCst) as u64))
    }

    async fn chat(&self, message: &str) -> Result<ChatReply, ApiError> {
        self.enter("chat").await?;
        if self.fail_chat.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(ChatReply {
            eli_response: format!("Thanks for sharing: {message}"),
            sentiment_label: Some("positive".into()),
            mood_tags: Some("grateful".into()),
        })
    }

    async fn settings(&self) -> Result<Settings, ApiError> {
        self.enter("settings").await?;
        Ok(self.settings.lock().unwrap().clone())
    }
}

pub fn dashboard_key() -> &'static str {
    <DashboardData as moodlog::reconcile::PageData>::CACHE_KEY
}

/// Wall clock that follows tokio's (pausable) clock, in a fixed zone.
pub struct TestClock {
    origin_wall: DateTime<Utc>,
    origin: tokio::time::Instant,
    zone: FixedOffset,
}

impl TestClock {
    /// Starts at the given local time on 2026-05-14, UTC+2.
    /// Must be created inside the runtime.
    pub fn starting_at(h: u32, m: u32, s: u32) -> Self {
        let zone = FixedOffset::east_opt(2 * 3600).unwrap();
        Self {
            origin_wall: local(&zone, 14, h, m, s),
            origin: tokio::time::Instant::now(),
            zone,
        }
    }
}

impl Clock for TestClock {
    type Tz = FixedOffset;

    fn now(&self) -> DateTime<Utc> {
        let elapsed = tokio::time::Instant::now() - self.origin;
        self.origin_wall + chrono::Duration::from_std(elapsed).unwrap()
    }

    fn zone(&self) -> FixedOffset {
        self.zone
    }
}

/// An instant on May `day`, 2026 at the given UTC+2 wall time.
pub fn test_local(day: u32, h: u32, m: u32, s: u32) -> DateTime<Utc> {
    local(&FixedOffset::east_opt(2 * 3600).unwrap(), day, h, m, s)
}

fn local(zone: &FixedOffset, day: u32, h: u32, m: u32, s: u32) -> DateTime<Utc> {
    zone.with_ymd_and_hms(2026, 5, day, h, m, s)
        .unwrap()
        .with_timezone(&Utc)
}

#[derive(Clone, Default)]
pub struct CountingNotifier(Arc<AtomicUsize>);

impl CountingNotifier {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl Notifier for CountingNotifier {
    fn notify(&self, _prompt: &Prompt) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn prompt() -> Prompt {
    Prompt {
        title: "Time to check in with Eli".into(),
        body: "How are you feeling today?".into(),
    }
}

pub fn reminder_at(h: u32, m: u32, enabled: bool) -> ReminderConfig {
    ReminderConfig {
        enabled,
        time: ReminderTime::new(h, m).unwrap(),
    }
}

/// Reminder source whose answer the test can change between polls.
#[derive(Clone)]
pub struct ScriptedSource {
    pub config: Arc<Mutex<Result<ReminderConfig, String>>>,
    pub loads: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new(config: ReminderConfig) -> Self {
        Self {
            config: Arc::new(Mutex::new(Ok(config))),
            loads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set(&self, config: ReminderConfig) {
        *self.config.lock().unwrap() = Ok(config);
    }

    pub fn fail(&self, message: &str) {
        *self.config.lock().unwrap() = Err(message.to_string());
    }
}

#[async_trait]
impl ReminderSource for ScriptedSource {
    async fn load(&self) -> anyhow::Result<ReminderConfig> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.config
            .lock()
            .unwrap()
            .clone()
            .map_err(|e| anyhow::anyhow!(e))
    }
}
