//! Sources of reminder configuration for the scheduler.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use super::ReminderConfig;
use crate::api::JournalApi;

/// A stream of configurations to apply, in order.
///
/// `next` is polled inside `select!` and must be cancel-safe: dropping the
/// future before it completes must not lose a configuration for good.
#[async_trait]
pub trait ConfigFeed: Send {
    /// The next configuration, or `None` once the feed has ended.
    async fn next(&mut self) -> Option<ReminderConfig>;
}

/// Push-style feed: whoever holds the sender decides when settings change.
#[async_trait]
impl ConfigFeed for mpsc::Receiver<ReminderConfig> {
    async fn next(&mut self) -> Option<ReminderConfig> {
        self.recv().await
    }
}

/// Loads the current reminder configuration on demand.
#[async_trait]
pub trait ReminderSource: Send + Sync {
    async fn load(&self) -> Result<ReminderConfig>;
}

/// Reads the reminder fields out of the remote settings document.
pub struct RemoteReminderSource<A: ?Sized> {
    api: Arc<A>,
}

impl<A: JournalApi + ?Sized> RemoteReminderSource<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl<A: JournalApi + ?Sized + 'static> ReminderSource for RemoteReminderSource<A> {
    async fn load(&self) -> Result<ReminderConfig> {
        let settings = self.api.settings().await.context("failed to fetch settings")?;
        Ok(ReminderConfig::try_from(&settings)?)
    }
}

/// Re-reads a [`ReminderSource`] on a fixed period. The first load happens
/// immediately. A failed load is logged and skipped; the scheduler keeps
/// whatever it had armed.
pub struct PollingFeed<S> {
    source: S,
    interval: Interval,
    /// A load is owed: set before loading, cleared once a load completes.
    due: bool,
}

impl<S: ReminderSource> PollingFeed<S> {
    pub fn new(source: S, period: Duration) -> Self {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            source,
            interval,
            due: true,
        }
    }
}

#[async_trait]
impl<S: ReminderSource> ConfigFeed for PollingFeed<S> {
    async fn next(&mut self) -> Option<ReminderConfig> {
        loop {
            if !self.due {
                self.interval.tick().await;
                self.due = true;
            }
            let loaded = self.source.load().await;
            self.due = false;
            match loaded {
                Ok(config) => return Some(config),
                Err(e) => {
                    tracing::warn!(error = %format!("{e:#}"), "failed to refresh reminder settings")
                }
            }
        }
    }
}
