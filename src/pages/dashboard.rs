use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::RECENT_DAYS;
use crate::api::types::{DailySummary, Entry, StatsOverview, WeeklySummary};
use crate::api::{ApiError, JournalApi};
use crate::reconcile::PageData;
use crate::store::keys;

/// The dashboard: the home dataset plus today's summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    pub stats: StatsOverview,
    pub entries: Vec<Entry>,
    pub daily_summary: DailySummary,
    pub weekly_summary: WeeklySummary,
}

#[async_trait]
impl PageData for DashboardData {
    const NAME: &'static str = "dashboard";
    const CACHE_KEY: &'static str = keys::DASHBOARD_SNAPSHOT;

    async fn fetch(api: &dyn JournalApi) -> Result<Self, ApiError> {
        let (stats, entries, daily_summary, weekly_summary) = tokio::join!(
            api.stats_overview(),
            api.entries(RECENT_DAYS),
            api.daily_summary(),
            api.weekly_summary(),
        );
        Ok(Self {
            stats: stats?,
            entries: entries?,
            daily_summary: daily_summary?,
            weekly_summary: weekly_summary?,
        })
    }
}
