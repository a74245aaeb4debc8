//! Budgeting Period
//!
//! The budget resets monthly; the engine needs how many buying days are left.

use chrono::{Datelike, Local, NaiveDate};

/// Number of days in the given month
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map_or(30, |last| last.day())
}

/// Days left in the month of `date`, counting `date` itself
pub fn days_remaining(date: NaiveDate) -> u32 {
    days_in_month(date.year(), date.month()) - date.day() + 1
}

/// `days_remaining` for the local calendar date
pub fn days_remaining_today() -> u32 {
    days_remaining(Local::now().date_naive())
}
