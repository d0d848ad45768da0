//! Mood trend and distribution figures derived from fetched data.
//!
//! Pure functions over the page datasets; the CLI renders the results.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::collections::BTreeMap;

use crate::api::types::{Entry, Sentiment, WeeklySummary};

/// Sentiment counts for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub positive: u32,
    pub neutral: u32,
    pub negative: u32,
    pub total: u32,
}

impl DayBucket {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            positive: 0,
            neutral: 0,
            negative: 0,
            total: 0,
        }
    }

    fn count(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Neutral => self.neutral += 1,
            Sentiment::Negative => self.negative += 1,
        }
        self.total += 1;
    }
}

/// Parse a server timestamp. The backend sends naive UTC
/// (`2026-03-02T18:04:11.512000`); RFC 3339 is accepted too.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Bucket entries by their calendar day in `tz`, oldest day first.
/// Entries with an unreadable timestamp are skipped.
pub fn daily_trend<Tz: TimeZone>(entries: &[Entry], tz: &Tz) -> Vec<DayBucket> {
    let mut days: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();
    for entry in entries {
        let Some(at) = parse_timestamp(&entry.created_at) else {
            tracing::debug!(created_at = %entry.created_at, "skipping entry with unreadable timestamp");
            continue;
        };
        let date = at.with_timezone(tz).date_naive();
        days.entry(date)
            .or_insert_with(|| DayBucket::new(date))
            .count(entry.sentiment());
    }
    days.into_values().collect()
}

/// Share of each sentiment over the week, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distribution {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

/// `None` when the week has no entries, in which case nothing is charted.
pub fn weekly_distribution(summary: &WeeklySummary) -> Option<Distribution> {
    let sum = summary.positive_count + summary.neutral_count + summary.negative_count;
    if summary.entry_count == 0 || sum == 0 {
        return None;
    }
    let pct = |n: u64| n as f64 * 100.0 / sum as f64;
    Some(Distribution {
        positive: pct(summary.positive_count),
        neutral: pct(summary.neutral_count),
        negative: pct(summary.negative_count),
    })
}

/// One text bar per day: `+` positive, `~` neutral, `-` negative.
pub fn render_trend(buckets: &[DayBucket]) -> String {
    let mut out = String::new();
    for b in buckets {
        out.push_str(&format!(
            "  {}  {}{}{} ({})\n",
            b.date.format("%b %e"),
            "+".repeat(b.positive as usize),
            "~".repeat(b.neutral as usize),
            "-".repeat(b.negative as usize),
            b.total
        ));
    }
    out
}
