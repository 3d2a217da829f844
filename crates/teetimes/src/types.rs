/// Shared data model for courses, raw slots and canonical tee-time records
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Front-end family a booking site belongs to.
///
/// Every family gets its own widget implementation in [`crate::adapter`];
/// the harvest loop itself never looks at this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteFamily {
    /// Booking engine with a datepicker calendar grid and a public-access
    /// booking class selector (ForeUP).
    #[serde(alias = "foreup")]
    CalendarGrid,
    /// Tee sheet rendered directly in the page with chevron day navigation
    /// (MemberSports).
    #[serde(alias = "membersports")]
    Direct,
    /// Tee sheet embedded in an iframe on a host page (Utah State Parks).
    #[serde(alias = "utah_state_parks")]
    Iframe,
}

impl fmt::Display for SiteFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SiteFamily::CalendarGrid => "calendar_grid",
            SiteFamily::Direct => "direct",
            SiteFamily::Iframe => "iframe",
        };
        f.write_str(name)
    }
}

/// A single booking site instance. Read-only for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub display_name: String,
    pub entry_url: String,
    pub site_family: SiteFamily,
    #[serde(default)]
    pub access_gate_label: Option<String>,
}

/// Opaque text identifying the day a source currently displays.
///
/// Only used to detect whether the page moved; never shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DayLabel(String);

impl DayLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DayLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One slot exactly as a source rendered it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSlot {
    pub time: Option<String>,
    pub players: Option<String>,
    pub price: Option<String>,
}

impl RawSlot {
    pub fn new(time: impl Into<String>) -> Self {
        Self {
            time: Some(time.into()),
            ..Default::default()
        }
    }

    pub fn with_players(mut self, players: impl Into<String>) -> Self {
        self.players = Some(players.into());
        self
    }

    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }
}

/// Canonical, persisted representation of a bookable slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeeTimeRecord {
    pub course_id: String,
    pub iso_date: NaiveDate,
    /// e.g. "MON, AUG 4, 2025"
    pub display_date: String,
    /// Always `H:MM AM` / `H:MM PM`
    pub time: String,
    pub min_players: u8,
    pub max_players: u8,
    pub price: Option<f64>,
    /// True when `iso_date` came from the fallback rule instead of the page label
    pub date_derived: bool,
    pub harvested_at: DateTime<Utc>,
}

/// Result classification for one harvested day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayStatus {
    Success,
    NoAvailability,
    ExtractionFailed,
    PersistenceFailed,
}

/// Why a day did not produce records, kept typed so a timeout is never
/// reported as a missing scaffold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayFault {
    /// The expected page structure was absent
    Scaffold(String),
    /// An adapter call hit its bounded wait
    TimedOut(String),
    /// The store rejected the day's write
    Persistence(String),
}

impl fmt::Display for DayFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayFault::Scaffold(message) => write!(f, "scaffold missing: {message}"),
            DayFault::TimedOut(message) => write!(f, "timed out: {message}"),
            DayFault::Persistence(message) => write!(f, "store write failed: {message}"),
        }
    }
}

/// Per-day entry of a harvest run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayOutcome {
    /// Text the page showed for this day, if it could be read
    pub label: Option<String>,
    pub iso_date: NaiveDate,
    pub date_derived: bool,
    pub status: DayStatus,
    pub record_count: usize,
    pub fault: Option<DayFault>,
}

impl fmt::Display for DayOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.status, self.record_count)
    }
}
