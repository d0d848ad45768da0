//! HTTP client for the journal backend.
//!
//! [`ApiClient`] reads the credential from the shared store on every request
//! and attaches it as a bearer token, so a login in another process takes
//! effect on the next call. A `401` on a call that carried a credential ends
//! the session. The read side used by pages is abstracted as [`JournalApi`].

pub mod types;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

use crate::session;
use crate::store::{keys, LocalStore};
use types::{
    AuthResponse, ChatReply, ChatRequest, Credentials, DailySummary, Entry, Settings,
    SignupRequest, StatsOverview, VerifyPasswordResponse, WeeklySummary,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("could not reach the server: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("session expired or invalid; please sign in again")]
    Unauthorized,
    #[error("server returned {status}: {}", .detail.as_deref().unwrap_or("no details"))]
    Status { status: u16, detail: Option<String> },
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("local store: {0:#}")]
    Store(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::Store(e)
    }
}

impl ApiError {
    /// The server-provided message, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

/// Read side of the backend, as consumed by pages and the reminder source.
#[async_trait]
pub trait JournalApi: Send + Sync {
    async fn stats_overview(&self) -> Result<StatsOverview, ApiError>;

    /// Entries from the last `days` days, newest first.
    async fn entries(&self, days: u32) -> Result<Vec<Entry>, ApiError>;

    async fn entries_today(&self) -> Result<Vec<Entry>, ApiError>;

    async fn daily_summary(&self) -> Result<DailySummary, ApiError>;

    async fn weekly_summary(&self) -> Result<WeeklySummary, ApiError>;

    async fn chat(&self, message: &str) -> Result<ChatReply, ApiError>;

    async fn settings(&self) -> Result<Settings, ApiError>;
}

/// What a 401 means for a given call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnUnauthorized {
    /// The credential is no longer valid: tear the session down.
    EndSession,
    /// The request itself was rejected (bad login, wrong password).
    Report,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn LocalStore>,
}

impl ApiClient {
    pub fn new(base_url: &str, store: Arc<dyn LocalStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &Arc<dyn LocalStore> {
        &self.store
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// A request carrying the current credential, if any. A 401 only ends
    /// the session when a credential was actually sent.
    fn request(
        &self,
        method: Method,
        path: &str,
    ) -> Result<(RequestBuilder, OnUnauthorized), ApiError> {
        let req = self.http.request(method, self.url(path));
        match self.store.get(keys::TOKEN)? {
            Some(token) => {
                tracing::debug!(path, "authenticated request");
                Ok((req.bearer_auth(token), OnUnauthorized::EndSession))
            }
            None => {
                tracing::debug!(path, "guest request");
                Ok((req, OnUnauthorized::Report))
            }
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        on_unauthorized: OnUnauthorized,
    ) -> Result<T, ApiError> {
        let response = req.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED && on_unauthorized == OnUnauthorized::EndSession {
            tracing::warn!("server rejected credential, ending session");
            if let Err(e) = session::destroy(self.store.as_ref()) {
                tracing::error!(error = %e, "failed to clear session after 401");
            }
            return Err(ApiError::Unauthorized);
        }

        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail: extract_detail(&body),
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let (req, on_unauthorized) = self.request(Method::GET, path)?;
        self.execute(req, on_unauthorized).await
    }

    /// `POST /api/auth/login`. The caller stores the returned credential.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        let req = self.http.post(self.url("/api/auth/login")).json(credentials);
        self.execute(req, OnUnauthorized::Report).await
    }

    /// `POST /api/auth/signup`.
    pub async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse, ApiError> {
        let req = self.http.post(self.url("/api/auth/signup")).json(request);
        self.execute(req, OnUnauthorized::Report).await
    }

    /// `POST /api/auth/verify-password`. A wrong password is `Ok(false)`,
    /// whether the server says so with `valid: false` or with a 401.
    pub async fn verify_password(&self, password: &str) -> Result<bool, ApiError> {
        let (req, _) = self.request(Method::POST, "/api/auth/verify-password")?;
        let req = req.json(&serde_json::json!({ "password": password }));
        match self
            .execute::<VerifyPasswordResponse>(req, OnUnauthorized::Report)
            .await
        {
            Ok(resp) => Ok(resp.valid),
            Err(ApiError::Status { status: 401, .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// `PUT /api/settings` with the full settings document.
    pub async fn update_settings(&self, settings: &Settings) -> Result<Settings, ApiError> {
        let (req, on_unauthorized) = self.request(Method::PUT, "/api/settings")?;
        self.execute(req.json(settings), on_unauthorized).await
    }

    /// Flip safe mode, keeping every other setting as the server has it.
    pub async fn set_safe_mode(&self, enabled: bool) -> Result<Settings, ApiError> {
        let mut settings = JournalApi::settings(self).await?;
        settings.safe_mode = enabled;
        self.update_settings(&settings).await
    }
}

#[async_trait]
impl JournalApi for ApiClient {
    async fn stats_overview(&self) -> Result<StatsOverview, ApiError> {
        self.get("/api/stats/overview").await
    }

    async fn entries(&self, days: u32) -> Result<Vec<Entry>, ApiError> {
        self.get(&format!("/api/entries?days={days}")).await
    }

    async fn entries_today(&self) -> Result<Vec<Entry>, ApiError> {
        self.get("/api/entries/today").await
    }

    async fn daily_summary(&self) -> Result<DailySummary, ApiError> {
        self.get("/api/summary/daily").await
    }

    async fn weekly_summary(&self) -> Result<WeeklySummary, ApiError> {
        self.get("/api/summary/weekly").await
    }

    async fn chat(&self, message: &str) -> Result<ChatReply, ApiError> {
        let (req, on_unauthorized) = self.request(Method::POST, "/api/chat")?;
        let req = req.json(&ChatRequest {
            message: message.to_string(),
        });
        self.execute(req, on_unauthorized).await
    }

    async fn settings(&self) -> Result<Settings, ApiError> {
        self.get("/api/settings").await
    }
}

/// Pull a human-readable message out of an error body. FastAPI sends
/// `{"detail": "..."}` for handled errors and a list of objects for
/// validation errors.
fn extract_detail(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Array(items) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .map(str::to_string)
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_from_string() {
        assert_eq!(
            extract_detail(br#"{"detail": "Incorrect username or password"}"#).as_deref(),
            Some("Incorrect username or password")
        );
    }

    #[test]
    fn detail_from_validation_list() {
        let body = br#"{"detail": [{"loc": ["body", "email"], "msg": "field required"}]}"#;
        assert_eq!(extract_detail(body).as_deref(), Some("field required"));
    }

    #[test]
    fn detail_missing_or_not_json() {
        assert!(extract_detail(b"<html>502</html>").is_none());
        assert!(extract_detail(br#"{"error": "x"}"#).is_none());
    }

    #[test]
    fn status_error_display_uses_detail() {
        let err = ApiError::Status {
            status: 400,
            detail: Some("Username already registered".into()),
        };
        assert_eq!(err.to_string(), "server returned 400: Username already registered");
        assert_eq!(err.detail(), Some("Username already registered"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let store: Arc<dyn LocalStore> = Arc::new(crate::store::MemoryStore::new());
        let client = ApiClient::new("http://localhost:8000/", store);
        assert_eq!(client.url("/api/settings"), "http://localhost:8000/api/settings");
    }
}
