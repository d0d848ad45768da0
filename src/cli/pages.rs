//! CLI `home` and `dashboard` commands.

use anyhow::Result;
use chrono::Local;

use moodlog::analytics::{self, Distribution};
use moodlog::api::types::{Entry, StatsOverview, WeeklySummary};
use moodlog::config::MoodlogConfig;
use moodlog::pages::{DashboardData, HomeData};
use moodlog::reconcile::{Page, PageData, Settled};
use moodlog::session;

use super::{connect, spinner};

const RECENT_SHOWN: usize = 3;

pub async fn home(config: &MoodlogConfig) -> Result<()> {
    show::<HomeData>(config, render_home).await
}

pub async fn dashboard(config: &MoodlogConfig) -> Result<()> {
    show::<DashboardData>(config, render_dashboard).await
}

/// Mount, paint whatever is available, refresh, then repaint if the server
/// sent something new.
async fn show<P: PageData + PartialEq>(config: &MoodlogConfig, render: fn(&P)) -> Result<()> {
    let (store, api) = connect(config)?;
    let was_authenticated = session::has_credential(store.as_ref())?;

    let page = Page::<P>::mount(store.clone());
    let initial = page.view();
    if let Some(data) = &initial.data {
        render(data);
    }

    let pb = initial
        .loading
        .then(|| spinner(&format!("Loading {}...", P::NAME)));
    let settled = page.refresh(&*api).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let view = page.view();
    page.unmount();

    if let Settled::Applied { .. } = settled {
        if let Some(data) = view.data.filter(|d| initial.data.as_ref() != Some(d)) {
            if initial.data.is_some() {
                println!();
                println!("(refreshed from server)");
                println!();
            }
            render(&data);
        }
    }

    let signed_out = !session::has_credential(store.as_ref())?;
    match notice(settled, was_authenticated, signed_out, initial.data.is_some()) {
        Some(Notice::SessionExpired) => {
            println!("Your session has expired. Sign in again with `moodlog login`.")
        }
        Some(Notice::SessionEnded) => println!("Session ended while loading; nothing to show."),
        Some(Notice::ShowingSaved) => {
            println!();
            println!("Showing saved data; the server could not be reached.");
        }
        Some(Notice::Unreachable) => println!(
            "Could not load the {} page. Is the backend running at {}?",
            P::NAME,
            api.base_url()
        ),
        None => {}
    }

    Ok(())
}

/// What to tell the user when a refresh did not apply new data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Notice {
    SessionExpired,
    SessionEnded,
    ShowingSaved,
    Unreachable,
}

/// A rejected credential ends the session before the result settles, so an
/// expired session shows up as `Discarded`, not `Failed`.
fn notice(settled: Settled, was_authenticated: bool, signed_out: bool, had_data: bool) -> Option<Notice> {
    match settled {
        Settled::Applied { .. } => None,
        Settled::Discarded if was_authenticated && signed_out => Some(Notice::SessionExpired),
        Settled::Discarded => Some(Notice::SessionEnded),
        Settled::Failed if had_data => Some(Notice::ShowingSaved),
        Settled::Failed => Some(Notice::Unreachable),
    }
}

fn render_home(data: &HomeData) {
    println!("Your Mood Overview");
    println!("{}", "=".repeat(40));
    render_stats(&data.stats);
    render_trend(&data.entries);
    render_weekly(&data.weekly_summary);
    render_recent(&data.entries);
}

fn render_dashboard(data: &DashboardData) {
    println!("Mood Dashboard");
    println!("{}", "=".repeat(40));
    render_stats(&data.stats);

    println!("Today:");
    if data.daily_summary.entry_count == 0 {
        println!("  No check-ins yet today.");
    } else {
        println!("  {} ({} entries)", data.daily_summary.summary, data.daily_summary.entry_count);
    }
    println!();

    render_trend(&data.entries);
    render_weekly(&data.weekly_summary);
    if let Some(d) = analytics::weekly_distribution(&data.weekly_summary) {
        render_distribution(&d);
    }
}

fn render_stats(stats: &StatsOverview) {
    println!("  Total entries:       {}", stats.total_entries);
    println!("  This week:           {}", stats.entries_this_week);
    println!("  Today:               {}", stats.entries_today);
    println!("  Avg mood this week:  {:.0}%", stats.avg_sentiment_this_week * 100.0);
    println!();
}

fn render_trend(entries: &[Entry]) {
    let trend = analytics::daily_trend(entries, &Local);
    println!("Mood trend (+ positive, ~ neutral, - negative):");
    if trend.is_empty() {
        println!("  No entries in the last week.");
    } else {
        print!("{}", analytics::render_trend(&trend));
    }
    println!();
}

fn render_weekly(summary: &WeeklySummary) {
    println!("This week:");
    if summary.entry_count == 0 {
        println!("  Start journaling to see weekly insights.");
    } else {
        println!("  {}", summary.insights);
    }
    println!();
}

fn render_distribution(d: &Distribution) {
    println!("Sentiment distribution:");
    println!("  {:<10} {:>3.0}%", "positive", d.positive);
    println!("  {:<10} {:>3.0}%", "neutral", d.neutral);
    println!("  {:<10} {:>3.0}%", "negative", d.negative);
    println!();
}

fn render_recent(entries: &[Entry]) {
    if entries.is_empty() {
        return;
    }
    println!("Recent check-ins:");
    for entry in entries.iter().take(RECENT_SHOWN) {
        println!("  [{}] {}", entry.sentiment(), entry.user_message);
    }
    println!();
}
