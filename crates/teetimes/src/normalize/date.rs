//! Day label → calendar date resolution.

use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

/// Formats tried on labels that carry their own year.
const DATED_FORMATS: &[&str] = &[
    "%B %d %Y", // Aug 4 2025, August 04 2025 (DayPicker aria-label)
    "%d %B %Y", // 4 August 2025
    "%B %Y %d", // August 2025 4 (ForeUP datepicker switch + active cell)
    "%m/%d/%Y",
    "%Y-%m-%d",
    "%m-%d-%Y",
];

/// Formats tried on labels without a year; the reference year is appended.
const UNDATED_FORMATS: &[&str] = &["%B %d", "%d %B", "%m/%d", "%m-%d"];

/// A year-less date this far before the reference belongs to the next year.
const ROLLOVER_DAYS: i64 = 183;

const WEEKDAYS: &[&str] = &[
    "mon", "monday", "tue", "tues", "tuesday", "wed", "weds", "wednesday", "thu", "thur", "thurs",
    "thursday", "fri", "friday", "sat", "saturday", "sun", "sunday",
];

static ORDINAL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})(?:st|nd|rd|th)$").unwrap());

/// The calendar date assigned to a harvested day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    pub date: NaiveDate,
    /// True when the page label could not be parsed and `date` is the fallback
    pub derived: bool,
}

/// Formats a date the way records display it: `MON, AUG 4, 2025`.
pub fn display_date(date: NaiveDate) -> String {
    date.format("%a, %b %-d, %Y").to_string().to_uppercase()
}

/// Parses a source day label, borrowing the year from `reference` when the
/// label has none.
pub fn parse_day_label(label: &str, reference: NaiveDate) -> Option<NaiveDate> {
    let cleaned = clean_label(label);
    if cleaned.is_empty() {
        return None;
    }

    if let Some(date) = DATED_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
    {
        return Some(date);
    }

    let with_year = |year: i32| {
        let candidate = format!("{cleaned} {year}");
        UNDATED_FORMATS.iter().find_map(|fmt| {
            NaiveDate::parse_from_str(&candidate, &format!("{fmt} %Y")).ok()
        })
    };

    let date = with_year(reference.year())?;
    if reference - date > Duration::days(ROLLOVER_DAYS) {
        return with_year(reference.year() + 1);
    }
    Some(date)
}

/// Resolves the date for a day, falling back to `fallback` (flagged as
/// derived) when the label is missing or unparsable.
pub fn resolve_date(label: Option<&str>, reference: NaiveDate, fallback: NaiveDate) -> ResolvedDate {
    match label.and_then(|l| parse_day_label(l, reference)) {
        Some(date) => ResolvedDate {
            date,
            derived: false,
        },
        None => ResolvedDate {
            date: fallback,
            derived: true,
        },
    }
}

/// Strips punctuation, weekday names and ordinal suffixes so the remaining
/// tokens line up with the format table.
fn clean_label(label: &str) -> String {
    label
        .replace([',', '.'], " ")
        .split_whitespace()
        .filter(|token| !WEEKDAYS.contains(&token.to_lowercase().as_str()))
        .map(|token| match ORDINAL_REGEX.captures(token) {
            Some(caps) => caps[1].to_string(),
            None => token.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
