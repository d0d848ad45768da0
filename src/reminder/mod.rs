//! Daily check-in reminder.
//!
//! The reminder's on/off flag and time of day live in the remote settings.
//! [`scheduler::ReminderScheduler`] owns the single pending timer and
//! re-derives it whenever a [`feed::ConfigFeed`] yields a configuration:
//! arming, disarming and re-arming are all the same "cancel, then maybe arm"
//! step, so at most one timer ever exists.

pub mod clock;
pub mod feed;
pub mod schedule;
pub mod scheduler;

use chrono::NaiveTime;
use std::fmt;
use std::str::FromStr;

use crate::api::types::Settings;
use crate::session::ValidationError;

pub use clock::{Clock, SystemClock};
pub use feed::{ConfigFeed, PollingFeed, RemoteReminderSource, ReminderSource};
pub use scheduler::{ReminderHandle, ReminderScheduler, TimerState};

/// A wall-clock time of day, minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReminderTime {
    hour: u32,
    minute: u32,
}

impl ReminderTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    pub fn as_naive(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl FromStr for ReminderTime {
    type Err = ValidationError;

    /// Accepts `HH:MM`, 24-hour.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::TimeOfDay(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(invalid());
        }
        let hour = h.parse().map_err(|_| invalid())?;
        let minute = m.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).ok_or_else(invalid)
    }
}

impl fmt::Display for ReminderTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// The remote part of the reminder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderConfig {
    pub enabled: bool,
    pub time: ReminderTime,
}

impl TryFrom<&Settings> for ReminderConfig {
    type Error = ValidationError;

    fn try_from(settings: &Settings) -> Result<Self, Self::Error> {
        Ok(Self {
            enabled: settings.reminder_enabled,
            time: settings.reminder_time.parse()?,
        })
    }
}

/// The text shown when a reminder fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub title: String,
    pub body: String,
}

impl From<&crate::config::ReminderSettings> for Prompt {
    fn from(settings: &crate::config::ReminderSettings) -> Self {
        Self {
            title: settings.title.clone(),
            body: settings.body.clone(),
        }
    }
}

/// Delivers a fired reminder to the user.
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, prompt: &Prompt);
}
