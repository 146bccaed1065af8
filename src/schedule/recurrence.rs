use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};

use crate::{
    types::{MonthRefinement, RepetitionRule},
    utils::{days_in_month, first_of_month_after, weekday_index},
};

/// Next instant after `from` matching `rule`. The time of day of `from` is kept.
pub fn next_trigger(rule: &RepetitionRule, from: DateTime<Utc>) -> DateTime<Utc> {
    let date = from.date_naive();
    let next = match rule {
        RepetitionRule::Days { quantity } => add_days(date, u64::from(quantity.get())),
        RepetitionRule::Weeks {
            quantity,
            days_of_week,
        } => next_weekly(date, quantity.get(), days_of_week),
        RepetitionRule::Months {
            quantity,
            refinement,
        } => next_monthly(date, quantity.get(), refinement.as_ref()),
        RepetitionRule::Years { quantity } => {
            add_months(date, quantity.get().saturating_mul(12))
        }
    };

    next.and_time(from.time()).and_utc()
}

/// The next `count` trigger instants after `from`.
pub fn upcoming(rule: &RepetitionRule, from: DateTime<Utc>, count: usize) -> Vec<DateTime<Utc>> {
    let mut instants = Vec::with_capacity(count);
    let mut current = from;
    for _ in 0..count {
        current = next_trigger(rule, current);
        instants.push(current);
    }
    instants
}

fn next_weekly(date: NaiveDate, quantity: u32, days_of_week: &BTreeSet<u8>) -> NaiveDate {
    let Some(&first) = days_of_week.first() else {
        return add_days(date, 7 * u64::from(quantity));
    };

    let current = weekday_index(date);
    match days_of_week.iter().find(|d| **d > current) {
        // later day of the same week
        Some(&day) => add_days(date, u64::from(day - current)),
        // wrap: jump `quantity` weeks ahead and land on the first listed weekday
        None => add_days(
            date,
            7 * u64::from(quantity) + u64::from(first) - u64::from(current),
        ),
    }
}

fn next_monthly(date: NaiveDate, quantity: u32, refinement: Option<&MonthRefinement>) -> NaiveDate {
    match refinement {
        None => add_months(date, quantity),
        Some(MonthRefinement::DayOfMonth(day)) => {
            let first = first_of_month_after(date, quantity);
            let last = days_in_month(first.year(), first.month());
            first.with_day((*day).min(last)).unwrap_or(first)
        }
        Some(MonthRefinement::DayOfWeekOfMonth { week, weekday }) => {
            let first = first_of_month_after(date, quantity);
            let last = days_in_month(first.year(), first.month());

            let to_weekday = (u32::from(*weekday) + 7 - u32::from(weekday_index(first))) % 7;
            let mut day = 1 + to_weekday + (u32::from(*week).saturating_sub(1)) * 7;
            if day > last {
                day -= 7;
            }
            first.with_day(day).unwrap_or(first)
        }
    }
}

fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days))
        .unwrap_or(NaiveDate::MAX)
}

/// Calendar month arithmetic; the day is clamped to the end of the target month.
fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}
