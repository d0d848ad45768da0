//! The journal's screens, as data.
//!
//! [`home`] and [`dashboard`] are aggregate pages reconciled through
//! [`crate::reconcile`]. [`chat`] keeps its own transcript.

pub mod chat;
pub mod dashboard;
pub mod home;

pub use chat::{ChatPage, Exchange};
pub use dashboard::DashboardData;
pub use home::HomeData;

/// How far back the aggregate pages look for entries.
pub const RECENT_DAYS: u32 = 7;
