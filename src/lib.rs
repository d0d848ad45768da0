//! Terminal client for the Eli mood journal.
//!
//! moodlog talks to an Eli backend (chat check-ins, sentiment analysis,
//! daily and weekly summaries) and keeps a small local store so that guests
//! can use the journal without an account. Data has one of two homes,
//! depending on whether a credential is present:
//!
//! | Session | Source of truth | Local store holds |
//! |---------|-----------------|-------------------|
//! | **Authenticated** | The server | `token`, `user` only |
//! | **Guest** | The server, refreshed in the background | Page snapshots and the chat transcript |
//!
//! Every login, signup, logout and rejected credential clears the whole local
//! store in one atomic step, so data never leaks from one mode into the other.
//!
//! # Architecture
//!
//! - **Storage**: a SQLite key/value table (WAL mode) behind the [`store::LocalStore`] trait
//! - **Transport**: `reqwest` against the backend's JSON API, bearer auth read per request
//! - **Reconciliation**: one generic rule for every aggregate page, see [`reconcile`]
//! - **Reminders**: a single-timer scheduler fed by polled remote settings, see [`reminder`]
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite initialization, schema, migrations, and health checks
//! - [`store`]: Local key/value persistence with atomic batches
//! - [`session`]: Credential lifecycle and form validation
//! - [`api`]: HTTP client and wire types
//! - [`reconcile`]: Guest cache vs. server data for aggregate pages
//! - [`pages`]: Home, dashboard and chat datasets
//! - [`analytics`]: Mood trend and distribution figures
//! - [`reminder`]: Daily check-in reminder scheduling

pub mod analytics;
pub mod api;
pub mod config;
pub mod db;
pub mod pages;
pub mod reconcile;
pub mod reminder;
pub mod session;
pub mod store;
