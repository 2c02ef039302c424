// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Due-date input parsing and keyboard presets.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Weekday};

/// Parses user-entered due dates: `2026-02-05` or `05.02.2026`
/// (day first). Returns midnight of that day.
pub fn parse_due_input(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(input, "%d.%m.%Y"))
        .ok()?;
    date.and_hms_opt(0, 0, 0)
}

pub fn preset_today(today: NaiveDate) -> NaiveDateTime {
    today.and_hms_opt(0, 0, 0).unwrap_or_default()
}

pub fn preset_tomorrow(today: NaiveDate) -> NaiveDateTime {
    preset_today(today.checked_add_days(Days::new(1)).unwrap_or(today))
}

/// End of week is the upcoming Sunday; today when it already is Sunday.
pub fn preset_end_of_week(today: NaiveDate) -> NaiveDateTime {
    let days_left = (Weekday::Sun.num_days_from_monday() + 7
        - today.weekday().num_days_from_monday())
        % 7;
    preset_today(
        today
            .checked_add_days(Days::new(u64::from(days_left)))
            .unwrap_or(today),
    )
}
