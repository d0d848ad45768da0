//! Pure occurrence arithmetic. No clocks, no timers.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use super::ReminderTime;

/// Longest DST gap searched for the first valid wall time.
const MAX_GAP_MINUTES: i64 = 180;

/// What to do with the current configuration right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// The occurrence is due (or just passed): notify immediately.
    FireNow(DateTime<Utc>),
    /// Arm the timer for this instant.
    ArmAt(DateTime<Utc>),
}

/// The instant `time` falls on `date` in `tz`. A wall time skipped by a DST
/// jump resolves to the first minute after the gap; a repeated one resolves
/// to its earlier instance.
pub fn occurrence_on<Tz: TimeZone>(tz: &Tz, date: NaiveDate, time: ReminderTime) -> DateTime<Tz> {
    let naive = date.and_time(time.as_naive());
    if let Some(at) = tz.from_local_datetime(&naive).earliest() {
        return at;
    }
    for step in 1..=MAX_GAP_MINUTES {
        if let Some(at) = tz.from_local_datetime(&(naive + Duration::minutes(step))).earliest() {
            return at;
        }
    }
    tz.from_utc_datetime(&naive)
}

/// Today's occurrence of `time`, unless it is more than `grace` in the past,
/// in which case tomorrow's.
pub fn next_occurrence<Tz: TimeZone>(
    now: &DateTime<Tz>,
    time: ReminderTime,
    grace: Duration,
) -> DateTime<Tz> {
    let tz = now.timezone();
    let today = now.date_naive();
    let candidate = occurrence_on(&tz, today, time);
    if candidate < now.clone() - grace {
        occurrence_on(&tz, next_day(today), time)
    } else {
        candidate
    }
}

/// The occurrence on the calendar day after `fired`'s, in `tz`.
pub fn following_occurrence<Tz: TimeZone>(
    tz: &Tz,
    fired: DateTime<Utc>,
    time: ReminderTime,
) -> DateTime<Tz> {
    let date = fired.with_timezone(tz).date_naive();
    occurrence_on(tz, next_day(date), time)
}

/// Decide between firing now and arming. An occurrence at or before
/// `last_fired` has already been delivered and is skipped in favour of the
/// next day's.
pub fn plan<Tz: TimeZone>(
    now: &DateTime<Tz>,
    time: ReminderTime,
    grace: Duration,
    tolerance: Duration,
    last_fired: Option<DateTime<Utc>>,
) -> Plan {
    let tz = now.timezone();
    let mut occurrence = next_occurrence(now, time, grace).with_timezone(&Utc);
    if let Some(last) = last_fired {
        while occurrence <= last {
            let next = following_occurrence(&tz, occurrence, time).with_timezone(&Utc);
            if next <= occurrence {
                break;
            }
            occurrence = next;
        }
    }

    // Anything already past is within the grace window, so it is due too.
    if occurrence - now.with_timezone(&Utc) <= tolerance {
        Plan::FireNow(occurrence)
    } else {
        Plan::ArmAt(occurrence)
    }
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(date)
}
