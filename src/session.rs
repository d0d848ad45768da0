//! Session lifecycle: the credential and user profile held by the client.
//!
//! A session exists exactly when the `token` key is present in the store.
//! Every transition (establish or destroy) clears all persisted keys in one
//! atomic batch, so guest snapshots never survive a login and authenticated
//! data never survives a logout.

use anyhow::{Context, Result};
use thiserror::Error;

use crate::api::types::{AuthResponse, Credentials, SignupRequest, UserProfile};
use crate::store::{keys, session_transition, LocalStore};

/// Minimum password length accepted at signup.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    /// `None` when the stored profile is missing or unreadable.
    pub user: Option<UserProfile>,
}

impl Session {
    pub fn username(&self) -> &str {
        self.user.as_ref().map(|u| u.username.as_str()).unwrap_or("(unknown)")
    }
}

/// Whether a credential is present right now.
pub fn has_credential(store: &dyn LocalStore) -> Result<bool> {
    store.contains(keys::TOKEN)
}

/// The current session, or `None` for a guest.
pub fn current(store: &dyn LocalStore) -> Result<Option<Session>> {
    let Some(token) = store.get(keys::TOKEN)? else {
        return Ok(None);
    };

    let user = match store.get(keys::USER)? {
        Some(raw) => match serde_json::from_str::<UserProfile>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "stored user profile is unreadable");
                None
            }
        },
        None => None,
    };

    Ok(Some(Session { token, user }))
}

/// Store a freshly issued credential, evicting all guest state in the same batch.
pub fn establish(store: &dyn LocalStore, auth: &AuthResponse) -> Result<Session> {
    let user_json = serde_json::to_string(&auth.user).context("failed to encode user profile")?;
    session_transition(
        store,
        &[
            (keys::TOKEN, auth.access_token.clone()),
            (keys::USER, user_json),
        ],
    )?;
    tracing::info!(username = %auth.user.username, "session established");

    Ok(Session {
        token: auth.access_token.clone(),
        user: Some(auth.user.clone()),
    })
}

/// Drop the session and every persisted key. Used for logout, guest mode and 401s.
pub fn destroy(store: &dyn LocalStore) -> Result<()> {
    session_transition(store, &[])?;
    tracing::info!("session destroyed");
    Ok(())
}

/// Form errors caught before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Password must be at least 6 characters long")]
    PasswordTooShort,
    #[error("invalid time of day {0:?}, expected HH:MM")]
    TimeOfDay(String),
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(self) -> Result<Credentials, ValidationError> {
        if self.username.trim().is_empty() {
            return Err(ValidationError::Missing("username"));
        }
        if self.password.is_empty() {
            return Err(ValidationError::Missing("password"));
        }
        Ok(Credentials {
            username: self.username.trim().to_string(),
            password: self.password,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupForm {
    /// Checks run in the order the user sees them: required fields, then
    /// matching passwords, then length.
    pub fn validate(self) -> Result<SignupRequest, ValidationError> {
        if self.username.trim().is_empty() {
            return Err(ValidationError::Missing("username"));
        }
        if self.email.trim().is_empty() {
            return Err(ValidationError::Missing("email"));
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort);
        }
        Ok(SignupRequest {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password,
        })
    }
}
