//! Pure text → canonical record transforms.
//!
//! Every site family hands its raw strings to the same rules here, so the
//! time/player/price/date formats stored in the database never depend on
//! which booking engine produced them.

mod date;

pub use date::{display_date, parse_day_label, resolve_date, ResolvedDate};

use crate::types::{RawSlot, TeeTimeRecord};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Player bounds used whenever a source gives nothing usable.
pub const DEFAULT_PLAYERS: (u8, u8) = (1, 4);

static TIME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}:\d{2})\s*([AaPp][Mm])").unwrap());
static CANONICAL_TIME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2}) (AM|PM)$").unwrap());
static PLAYER_RANGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*-\s*(\d+)(?:\D|$)").unwrap());
static SINGLE_NUMBER_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Normalizes a free-text time to `H:MM AM/PM`.
///
/// The hour and minute digits are kept as written (no zero padding is added
/// or removed); only the meridiem is uppercased and separated by one space.
/// Returns `None` when no time can be found, which drops the slot.
pub fn normalize_time(raw: &str) -> Option<String> {
    let caps = TIME_REGEX.captures(raw)?;
    Some(format!("{} {}", &caps[1], caps[2].to_uppercase()))
}

/// Minutes since midnight for a canonical time, used for chronological ordering.
pub fn time_sort_key(time: &str) -> Option<u32> {
    let caps = CANONICAL_TIME_REGEX.captures(time)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    if hour > 12 || minute > 59 {
        return None;
    }
    let hour24 = match (&caps[3], hour % 12) {
        ("AM", h) => h,
        (_, h) => h + 12,
    };
    Some(hour24 * 60 + minute)
}

/// Parses a player range into `(min, max)`.
///
/// `"2-4"` splits on the hyphen; trailing words (`"2-4 Players"`) are
/// ignored. A lone number (ForeUP shows "4" or
/// "4 players") means up to that many. Anything else, or a range that breaks
/// `1 <= min <= max`, falls back to [`DEFAULT_PLAYERS`].
pub fn normalize_players(raw: Option<&str>) -> (u8, u8) {
    let Some(text) = raw.map(str::trim).filter(|t| !t.is_empty()) else {
        return DEFAULT_PLAYERS;
    };

    let parsed = if text.contains('-') {
        PLAYER_RANGE_REGEX.captures(text).and_then(|caps| {
            let min = caps[1].parse::<u8>().ok()?;
            let max = caps[2].parse::<u8>().ok()?;
            Some((min, max))
        })
    } else {
        SINGLE_NUMBER_REGEX
            .find(text)
            .and_then(|m| m.as_str().parse::<u8>().ok())
            .map(|max| (1, max))
    };

    match parsed {
        Some((min, max)) if min >= 1 && min <= max => (min, max),
        _ => DEFAULT_PLAYERS,
    }
}

/// Parses a price by keeping only digits and the decimal point.
///
/// `"$23.00 +tax"` → `Some(23.0)`; empty or unparsable → `None`.
pub fn normalize_price(raw: Option<&str>) -> Option<f64> {
    let digits: String = raw?
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite() && *price >= 0.0)
}

/// Builds canonical records for one course day.
#[derive(Debug, Clone)]
pub struct RecordNormalizer<'a> {
    course_id: &'a str,
    date: ResolvedDate,
    harvested_at: DateTime<Utc>,
}

impl<'a> RecordNormalizer<'a> {
    pub fn for_day(course_id: &'a str, date: ResolvedDate, harvested_at: DateTime<Utc>) -> Self {
        Self {
            course_id,
            date,
            harvested_at,
        }
    }

    /// Normalizes one slot; `None` means the slot has no usable time and is dropped.
    pub fn normalize(&self, slot: &RawSlot) -> Option<TeeTimeRecord> {
        let time = slot.time.as_deref().and_then(normalize_time)?;
        let (min_players, max_players) = normalize_players(slot.players.as_deref());

        Some(TeeTimeRecord {
            course_id: self.course_id.to_string(),
            iso_date: self.date.date,
            display_date: display_date(self.date.date),
            time,
            min_players,
            max_players,
            price: normalize_price(slot.price.as_deref()),
            date_derived: self.date.derived,
            harvested_at: self.harvested_at,
        })
    }

    /// Normalizes a whole day, logging how many slots had to be dropped.
    pub fn normalize_all(&self, slots: &[RawSlot]) -> Vec<TeeTimeRecord> {
        let records: Vec<TeeTimeRecord> = slots.iter().filter_map(|s| self.normalize(s)).collect();
        let dropped = slots.len() - records.len();
        if dropped > 0 {
            debug!(
                course = %self.course_id,
                date = %self.date.date,
                dropped,
                "Dropped slots without a recognizable time"
            );
        }
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_time_uppercases_meridiem_and_keeps_digits() {
        assert_eq!(normalize_time("9:05am").as_deref(), Some("9:05 AM"));
        assert_eq!(normalize_time("12:30 pm").as_deref(), Some("12:30 PM"));
        assert_eq!(normalize_time("07:10Pm").as_deref(), Some("07:10 PM"));
        assert_eq!(normalize_time("  Tee off 10:45 AM  ").as_deref(), Some("10:45 AM"));
    }

    #[test]
    fn test_time_without_meridiem_is_rejected() {
        assert_eq!(normalize_time("14:00"), None);
        assert_eq!(normalize_time("Shotgun start"), None);
        assert_eq!(normalize_time(""), None);
    }

    #[test]
    fn test_time_sort_key_orders_chronologically() {
        assert_eq!(time_sort_key("12:05 AM"), Some(5));
        assert_eq!(time_sort_key("9:00 AM"), Some(540));
        assert_eq!(time_sort_key("10:00 AM"), Some(600));
        assert_eq!(time_sort_key("12:00 PM"), Some(720));
        assert_eq!(time_sort_key("1:30 PM"), Some(810));
        assert_eq!(time_sort_key("9:61 AM"), None);
        assert_eq!(time_sort_key("9:05am"), None);
    }

    #[test]
    fn test_player_range() {
        assert_eq!(normalize_players(Some("2-4")), (2, 4));
        assert_eq!(normalize_players(Some(" 1 - 3 ")), (1, 3));
    }

    #[test]
    fn test_player_range_with_trailing_words() {
        assert_eq!(normalize_players(Some("2-4 Players")), (2, 4));
        assert_eq!(normalize_players(Some("1 - 2 golfers")), (1, 2));
        assert_eq!(normalize_players(Some("2-4x")), (2, 4));
    }

    #[test]
    fn test_player_range_defaults() {
        assert_eq!(normalize_players(None), (1, 4));
        assert_eq!(normalize_players(Some("")), (1, 4));
        assert_eq!(normalize_players(Some("a-b")), (1, 4));
        assert_eq!(normalize_players(Some("4-2")), (1, 4));
        assert_eq!(normalize_players(Some("0-2")), (1, 4));
        assert_eq!(normalize_players(Some("Walkers welcome")), (1, 4));
    }

    #[test]
    fn test_single_player_count_is_upper_bound() {
        assert_eq!(normalize_players(Some("3")), (1, 3));
        assert_eq!(normalize_players(Some("4 players")), (1, 4));
        assert_eq!(normalize_players(Some("0 players")), (1, 4));
    }

    #[test]
    fn test_price() {
        assert_eq!(normalize_price(Some("$23.00 +tax")), Some(23.0));
        assert_eq!(normalize_price(Some("$45")), Some(45.0));
        assert_eq!(normalize_price(Some("")), None);
        assert_eq!(normalize_price(Some("Call for rate")), None);
        assert_eq!(normalize_price(Some("1.2.3")), None);
        assert_eq!(normalize_price(None), None);
    }

    #[test]
    fn test_price_sign_is_stripped() {
        assert_eq!(normalize_price(Some("-$5.50")), Some(5.5));
    }

    #[test]
    fn test_normalizer_builds_record_and_drops_timeless_slots() {
        let date = ResolvedDate {
            date: NaiveDate::from_ymd_opt(2025, 8, 4).unwrap(),
            derived: false,
        };
        let harvested_at = Utc::now();
        let normalizer = RecordNormalizer::for_day("pine-valley", date, harvested_at);

        let slots = vec![
            RawSlot::new("7:30am").with_players("2-4").with_price("$23.00 +tax"),
            RawSlot::new("no time here").with_price("$10"),
            RawSlot::default(),
        ];
        let records = normalizer.normalize_all(&slots);

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.course_id, "pine-valley");
        assert_eq!(record.time, "7:30 AM");
        assert_eq!(record.display_date, "MON, AUG 4, 2025");
        assert_eq!((record.min_players, record.max_players), (2, 4));
        assert_eq!(record.price, Some(23.0));
        assert!(!record.date_derived);
        assert_eq!(record.harvested_at, harvested_at);
    }
}
