use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::RECENT_DAYS;
use crate::api::types::{Entry, StatsOverview, WeeklySummary};
use crate::api::{ApiError, JournalApi};
use crate::reconcile::PageData;
use crate::store::keys;

/// Everything the home screen shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeData {
    pub stats: StatsOverview,
    /// Last week of entries, newest first as the server sends them.
    pub entries: Vec<Entry>,
    pub weekly_summary: WeeklySummary,
}

#[async_trait]
impl PageData for HomeData {
    const NAME: &'static str = "home";
    const CACHE_KEY: &'static str = keys::HOME_SNAPSHOT;

    async fn fetch(api: &dyn JournalApi) -> Result<Self, ApiError> {
        let (stats, entries, weekly_summary) = tokio::join!(
            api.stats_overview(),
            api.entries(RECENT_DAYS),
            api.weekly_summary(),
        );
        Ok(Self {
            stats: stats?,
            entries: entries?,
            weekly_summary: weekly_summary?,
        })
    }
}
