use std::collections::HashSet;

use chrono::{DateTime, Datelike, Months, NaiveDate, TimeDelta, Timelike, Utc};

use crate::types::Track;

/// Weekday of `date` with Sunday = 0 and Saturday = 6.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8 // Sunday=0, Saturday=6
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };

    match (first, next_first) {
        (Some(first), Some(next_first)) => (next_first - first).num_days() as u32,
        _ => 31,
    }
}

/// First day of the month that lies `months` months after the month of `date`.
pub fn first_of_month_after(date: NaiveDate, months: u32) -> NaiveDate {
    let first = date.with_day(1).unwrap_or(date);
    first
        .checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

/// Cron expression (`minute hour day-of-month month day-of-week`) firing at `instant`.
///
/// Day-of-week stays `*`: the date is already pinned and cron ORs a restricted
/// day-of-week with day-of-month.
pub fn cron_expression(instant: DateTime<Utc>) -> String {
    format!(
        "{minute} {hour} {day} {month} *",
        minute = instant.minute(),
        hour = instant.hour(),
        day = instant.day(),
        month = instant.month()
    )
}

/// Instant `days` days before `now`, clamped to the earliest representable instant.
pub fn days_before(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    TimeDelta::try_days(days)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// URIs of `tracks` with repeated tracks kept once, in first-seen order.
pub fn unique_uris(tracks: &[Track]) -> Vec<String> {
    let mut seen = HashSet::new();
    tracks
        .iter()
        .filter(|t| seen.insert(t.uri.clone()))
        .map(|t| t.uri.clone())
        .collect()
}

/// Starting position for each insertion chunk; `None` everywhere when appending.
pub fn chunk_positions(total: usize, chunk_size: usize, append: bool) -> Vec<Option<usize>> {
    (0..total.div_ceil(chunk_size))
        .map(|i| if append { None } else { Some(i * chunk_size) })
        .collect()
}
