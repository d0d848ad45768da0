//! The check-in conversation with Eli.
//!
//! An authenticated transcript is always today's entries from the server. A
//! guest transcript lives only in the local store under `chat_messages` and is
//! rewritten after every exchange, failed ones included.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::types::{ChatReply, Entry, Sentiment};
use crate::api::JournalApi;
use crate::session;
use crate::store::{keys, LocalStore};

/// Shown in place of Eli's reply when the chat request fails.
pub const FALLBACK_REPLY: &str = "I'm having trouble connecting right now. Please try again.";

/// One user message and the reply it got.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub user: String,
    /// `None` while a reply is pending.
    #[serde(default)]
    pub eli: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
}

impl Exchange {
    fn answered(user: String, reply: ChatReply) -> Self {
        Self {
            user,
            eli: Some(reply.eli_response),
            sentiment: reply.sentiment_label,
            tags: reply.mood_tags,
        }
    }

    fn failed(user: String) -> Self {
        Self {
            user,
            eli: Some(FALLBACK_REPLY.to_string()),
            sentiment: Some(Sentiment::Neutral.as_str().to_string()),
            tags: Some(String::new()),
        }
    }

    pub fn sentiment(&self) -> Sentiment {
        Sentiment::from_label(self.sentiment.as_deref())
    }
}

impl From<Entry> for Exchange {
    fn from(entry: Entry) -> Self {
        Self {
            user: entry.user_message,
            eli: Some(entry.eli_response),
            sentiment: entry.sentiment_label,
            tags: entry.mood_tags,
        }
    }
}

pub struct ChatPage {
    store: Arc<dyn LocalStore>,
    messages: Vec<Exchange>,
    locked: bool,
}

impl ChatPage {
    /// Load the transcript. With safe mode on nothing is loaded and the page
    /// refuses to send until it is remounted.
    pub async fn mount(store: Arc<dyn LocalStore>, api: &dyn JournalApi, safe_mode: bool) -> Self {
        if safe_mode {
            tracing::info!("safe mode active, skipping transcript load");
            return Self {
                store,
                messages: Vec::new(),
                locked: true,
            };
        }

        let authenticated = session::has_credential(store.as_ref()).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not read session state");
            true
        });

        let messages = if authenticated {
            match api.entries_today().await {
                Ok(entries) => entries.into_iter().map(Exchange::from).collect(),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to load today's entries");
                    Vec::new()
                }
            }
        } else {
            load_guest_transcript(store.as_ref())
        };

        Self {
            store,
            messages,
            locked: false,
        }
    }

    pub fn messages(&self) -> &[Exchange] {
        &self.messages
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Send one message. Blank input and a locked page send nothing and
    /// return `None`. A failed request still yields an exchange carrying
    /// [`FALLBACK_REPLY`].
    pub async fn send(&mut self, api: &dyn JournalApi, input: &str) -> Option<&Exchange> {
        if self.locked {
            tracing::warn!("chat is locked by safe mode");
            return None;
        }
        if input.trim().is_empty() {
            return None;
        }

        let guest_at_start = !self.credential_present();
        let user = input.to_string();

        let exchange = match api.chat(&user).await {
            Ok(reply) => Exchange::answered(user, reply),
            Err(e) => {
                tracing::warn!(error = %e, "chat request failed");
                Exchange::failed(user)
            }
        };
        self.messages.push(exchange);

        if guest_at_start && !self.credential_present() {
            self.persist();
        }

        self.messages.last()
    }

    /// Save the transcript unless a credential has appeared; the store checks
    /// and writes in one step.
    fn persist(&self) {
        let result = serde_json::to_string(&self.messages)
            .map_err(anyhow::Error::from)
            .and_then(|json| {
                self.store
                    .set_unless_present(keys::TOKEN, keys::CHAT_MESSAGES, &json)
            });
        match result {
            Ok(true) => {}
            Ok(false) => tracing::debug!("session started before transcript write, skipping"),
            Err(e) => tracing::warn!(error = %e, "failed to save guest transcript"),
        }
    }

    fn credential_present(&self) -> bool {
        session::has_credential(self.store.as_ref()).unwrap_or(true)
    }
}

fn load_guest_transcript(store: &dyn LocalStore) -> Vec<Exchange> {
    let raw = match store.get(keys::CHAT_MESSAGES) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read guest transcript");
            return Vec::new();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "guest transcript is unreadable, starting fresh");
        Vec::new()
    })
}
