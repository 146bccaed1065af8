mod common;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use sporlflow::utils::*;

use common::track;

#[test]
fn test_weekday_index_starts_on_sunday() {
    let sunday = NaiveDate::from_ymd_opt(2024, 6, 9).unwrap();
    let thursday = NaiveDate::from_ymd_opt(2024, 6, 6).unwrap();
    let saturday = NaiveDate::from_ymd_opt(2024, 6, 8).unwrap();

    assert_eq!(weekday_index(sunday), 0);
    assert_eq!(weekday_index(thursday), 4);
    assert_eq!(weekday_index(saturday), 6);
}

#[test]
fn test_days_in_month() {
    assert_eq!(days_in_month(2023, 2), 28);
    assert_eq!(days_in_month(2024, 2), 29); // leap year
    assert_eq!(days_in_month(2024, 4), 30);
    assert_eq!(days_in_month(2024, 12), 31);
}

#[test]
fn test_first_of_month_after() {
    let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
    assert_eq!(
        first_of_month_after(date, 1),
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
    );
    assert_eq!(
        first_of_month_after(date, 12),
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    );
}

#[test]
fn test_cron_expression_pins_date_and_leaves_weekday_open() {
    let instant = Utc.with_ymd_and_hms(2024, 6, 9, 7, 5, 0).unwrap();
    assert_eq!(cron_expression(instant), "5 7 9 6 *");
}

#[test]
fn test_unique_uris_keeps_first_occurrence() {
    let tracks = vec![track("a"), track("b"), track("a"), track("c"), track("b")];
    assert_eq!(
        unique_uris(&tracks),
        vec!["spotify:track:a", "spotify:track:b", "spotify:track:c"]
    );
}

#[test]
fn test_chunk_positions() {
    assert_eq!(
        chunk_positions(250, 100, false),
        vec![Some(0), Some(100), Some(200)]
    );
    assert_eq!(chunk_positions(250, 100, true), vec![None, None, None]);
    assert_eq!(chunk_positions(100, 100, false), vec![Some(0)]);
    assert!(chunk_positions(0, 100, false).is_empty());
}

#[test]
fn test_days_before_clamps_overlong_windows() {
    let now = Utc.with_ymd_and_hms(2024, 6, 9, 12, 0, 0).unwrap();

    assert_eq!(days_before(now, 7), now - Duration::days(7));
    assert_eq!(days_before(now, 365_000_000), DateTime::<Utc>::MIN_UTC);
    assert_eq!(days_before(now, i64::MAX), DateTime::<Utc>::MIN_UTC);
}
