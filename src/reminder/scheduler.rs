//! The reminder state machine and the task that drives it.
//!
//! ```text
//! Disarmed --apply(enabled)--> Armed{fire_at}
//! Armed    --apply(any)------> cancel, then Disarmed or Armed{recomputed}
//! Armed    --timer fires-----> notify, Armed{next day}
//! any      --shutdown--------> Disarmed
//! ```

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::schedule::{self, Plan};
use super::{Clock, ConfigFeed, Notifier, Prompt, ReminderConfig, ReminderTime};

const DEFAULT_GRACE_SECS: i64 = 60;
const DEFAULT_TOLERANCE_SECS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Disarmed,
    Armed { fire_at: DateTime<Utc> },
}

pub struct ReminderScheduler<C: Clock, N: Notifier> {
    clock: C,
    notifier: N,
    prompt: Prompt,
    grace: Duration,
    tolerance: Duration,
    config: Option<ReminderConfig>,
    /// The occurrence most recently delivered.
    last_fired: Option<DateTime<Utc>>,
    state: watch::Sender<TimerState>,
}

impl<C: Clock, N: Notifier> ReminderScheduler<C, N> {
    pub fn new(clock: C, notifier: N, prompt: Prompt) -> Self {
        let (state, _) = watch::channel(TimerState::Disarmed);
        Self {
            clock,
            notifier,
            prompt,
            grace: Duration::seconds(DEFAULT_GRACE_SECS),
            tolerance: Duration::seconds(DEFAULT_TOLERANCE_SECS),
            config: None,
            last_fired: None,
            state,
        }
    }

    pub fn with_timing(mut self, grace: Duration, tolerance: Duration) -> Self {
        self.grace = grace;
        self.tolerance = tolerance;
        self
    }

    pub fn state(&self) -> TimerState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.state.subscribe()
    }

    /// Apply a configuration. The armed timer, if any, is replaced: by a
    /// freshly computed one when enabled, by nothing when disabled.
    pub fn apply(&mut self, config: ReminderConfig) {
        self.config = Some(config);
        if config.enabled {
            self.arm(config.time);
        } else {
            self.set_state(TimerState::Disarmed);
        }
    }

    /// The armed timer has expired.
    pub fn fire_due(&mut self) {
        let (TimerState::Armed { fire_at }, Some(config)) = (self.state(), self.config) else {
            return;
        };
        self.fire(fire_at, config.time);
    }

    pub fn disarm(&mut self) {
        self.set_state(TimerState::Disarmed);
    }

    fn arm(&mut self, time: ReminderTime) {
        let now = self.clock.now().with_timezone(&self.clock.zone());
        match schedule::plan(&now, time, self.grace, self.tolerance, self.last_fired) {
            Plan::FireNow(occurrence) => self.fire(occurrence, time),
            Plan::ArmAt(fire_at) => self.set_state(TimerState::Armed { fire_at }),
        }
    }

    fn fire(&mut self, occurrence: DateTime<Utc>, time: ReminderTime) {
        tracing::info!(%occurrence, "reminder fired");
        self.notifier.notify(&self.prompt);
        self.last_fired = Some(occurrence);
        let fire_at = schedule::following_occurrence(&self.clock.zone(), occurrence, time)
            .with_timezone(&Utc);
        self.set_state(TimerState::Armed { fire_at });
    }

    /// Publish a transition. Subscribers are only woken by real changes.
    fn set_state(&self, next: TimerState) {
        let changed = self.state.send_if_modified(|state| {
            let changed = *state != next;
            *state = next;
            changed
        });
        if changed {
            match next {
                TimerState::Disarmed => tracing::debug!("reminder disarmed"),
                TimerState::Armed { fire_at } => tracing::debug!(%fire_at, "reminder armed"),
            }
        }
    }

    /// Monotonic deadline of the armed timer, if any.
    fn deadline(&self) -> Option<Instant> {
        match self.state() {
            TimerState::Disarmed => None,
            TimerState::Armed { fire_at } => {
                let wait = (fire_at - self.clock.now()).to_std().unwrap_or_default();
                Some(Instant::now() + wait)
            }
        }
    }

    /// Drive the scheduler until `shutdown` resolves (or its sender is
    /// dropped). Leaves the state `Disarmed` on exit.
    pub async fn run<F: ConfigFeed>(mut self, mut feed: F, mut shutdown: oneshot::Receiver<()>) {
        let mut feed_open = true;
        loop {
            let deadline = self.deadline();
            tokio::select! {
                _ = &mut shutdown => break,
                next = feed.next(), if feed_open => match next {
                    Some(config) => self.apply(config),
                    None => {
                        tracing::info!("reminder config feed closed, keeping current timer");
                        feed_open = false;
                    }
                },
                _ = sleep_until(deadline) => self.fire_due(),
            }
        }
        self.disarm();
        tracing::debug!("reminder scheduler stopped");
    }

    /// Run on a background task.
    pub fn spawn<F: ConfigFeed + 'static>(self, feed: F) -> ReminderHandle {
        let (tx, rx) = oneshot::channel();
        let state = self.subscribe();
        let task = tokio::spawn(self.run(feed, rx));
        ReminderHandle {
            shutdown: Some(tx),
            task: Some(task),
            state,
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Owner of a spawned scheduler. Dropping it stops the scheduler.
pub struct ReminderHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    state: watch::Receiver<TimerState>,
}

impl ReminderHandle {
    pub fn state(&self) -> TimerState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.state.clone()
    }

    /// Stop the scheduler and wait for it to disarm.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "reminder task ended abnormally");
            }
        }
    }
}

impl Drop for ReminderHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
