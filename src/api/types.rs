//! Wire types for the journal backend.
//!
//! Field names follow the backend's JSON. Optional or late-added fields carry
//! `#[serde(default)]` so older servers still decode.

use serde::{Deserialize, Serialize};

/// The signed-in user, as returned by login/signup and persisted under `user`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyPasswordResponse {
    pub valid: bool,
}

/// Sentiment classification attached to an entry by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }

    /// Anything that is not explicitly positive or negative counts as neutral.
    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            Some("positive") => Self::Positive,
            Some("negative") => Self::Negative,
            _ => Self::Neutral,
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One check-in: the user's message and Eli's reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub user_message: String,
    pub eli_response: String,
    #[serde(default)]
    pub sentiment_label: Option<String>,
    #[serde(default)]
    pub mood_tags: Option<String>,
    /// Timestamp as sent by the server (naive UTC or RFC 3339).
    pub created_at: String,
}

impl Entry {
    pub fn sentiment(&self) -> Sentiment {
        Sentiment::from_label(self.sentiment_label.as_deref())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub eli_response: String,
    #[serde(default)]
    pub sentiment_label: Option<String>,
    #[serde(default)]
    pub mood_tags: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsOverview {
    pub total_entries: u64,
    pub entries_this_week: u64,
    pub entries_today: u64,
    pub avg_sentiment_this_week: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    #[serde(default)]
    pub summary: String,
    pub entry_count: u64,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    #[serde(default)]
    pub insights: String,
    pub entry_count: u64,
    #[serde(default)]
    pub positive_count: u64,
    #[serde(default)]
    pub negative_count: u64,
    #[serde(default)]
    pub neutral_count: u64,
    #[serde(default)]
    pub week_start: Option<String>,
}

/// Remote user settings. `reminder_time` is `HH:MM`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub reminder_enabled: bool,
    pub reminder_time: String,
    #[serde(default)]
    pub privacy_mode: bool,
    #[serde(default)]
    pub safe_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reminder_enabled: true,
            reminder_time: "09:00".into(),
            privacy_mode: false,
            safe_mode: false,
        }
    }
}
