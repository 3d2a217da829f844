//! Calendar-grid booking pages (ForeUP).
//!
//! The day is chosen in a bootstrap datepicker; the selected day is the
//! `td.active.day` cell under the `.datepicker-switch` month heading. Tee
//! times render as tiles inside the `.js-times` container once a booking
//! class (usually "Public") has been picked.

use super::dom::{document_text, element_text, first_text, has_match, mentions_any};
use super::driver::{PageDriver, Timeouts};
use super::error::AdapterError;
use super::{SiteWidget, SlotScan};
use crate::types::{DayLabel, RawSlot, SiteFamily};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::sync::LazyLock;

pub(crate) const NEXT_DAY_SELECTOR: &str =
    ".ob-filters-date-selection-arrows.nextday, button[aria-label=\"Next Day\"], .DayPicker-NavButton--next";
const ACTIVE_DAY_SELECTOR: &str = "td.active.day";

static READY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".booking-classes button, .datepicker, .js-times, .DayPicker").unwrap()
});
static MONTH_SWITCH_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".datepicker-days .datepicker-switch, .datepicker-switch").unwrap());
static ACTIVE_DAY: LazyLock<Selector> = LazyLock::new(|| Selector::parse(ACTIVE_DAY_SELECTOR).unwrap());
static SELECTED_DAY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".DayPicker-Day--selected").unwrap());
static TIMES_CONTAINER_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".times-inner.js-times, .time-tiles-aggregate-booking, #times").unwrap()
});
static TILE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".time-tile-ob-no-details").unwrap());
static TILE_TIME_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".times-booking-start-time-label").unwrap());
static TILE_PLAYERS_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".time-summary-ob-player-count").unwrap());
static TILE_PRICE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".js-booking-green-fee").unwrap());
static EMPTY_NOTICE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".no-times, .js-no-times").unwrap());

const EMPTY_PHRASES: &[&str] = &["no tee times", "no times available", "no available times"];

/// ForeUP-style datepicker widget.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalendarGridWidget;

#[async_trait]
impl SiteWidget for CalendarGridWidget {
    fn family(&self) -> SiteFamily {
        SiteFamily::CalendarGrid
    }

    fn is_ready(&self, document: &Html) -> bool {
        has_match(document, &READY_SELECTOR)
    }

    fn day_label(&self, document: &Html) -> Option<DayLabel> {
        // DayPicker variant carries a full date in aria-label
        if let Some(selected) = document.select(&SELECTED_DAY_SELECTOR).next() {
            let label = selected
                .value()
                .attr("aria-label")
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| element_text(selected));
            if !label.is_empty() {
                return Some(DayLabel::new(label));
            }
        }

        let month_year = document_text(document, &MONTH_SWITCH_SELECTOR)?;
        let day = document_text(document, &ACTIVE_DAY)?;
        Some(DayLabel::new(format!("{month_year} {day}")))
    }

    fn scan_slots(&self, document: &Html) -> SlotScan {
        if has_match(document, &EMPTY_NOTICE_SELECTOR) {
            return SlotScan::Empty;
        }

        let Some(container) = document.select(&TIMES_CONTAINER_SELECTOR).next() else {
            return SlotScan::Missing;
        };

        let slots: Vec<RawSlot> = container
            .select(&TILE_SELECTOR)
            .map(|tile| RawSlot {
                time: first_text(tile, &TILE_TIME_SELECTOR),
                players: first_text(tile, &TILE_PLAYERS_SELECTOR),
                price: first_text(tile, &TILE_PRICE_SELECTOR),
            })
            .collect();

        if !slots.is_empty() {
            SlotScan::Slots(slots)
        } else if mentions_any(container, EMPTY_PHRASES) {
            SlotScan::Empty
        } else {
            SlotScan::Pending
        }
    }

    async fn after_gate(&self, driver: &mut dyn PageDriver) -> Result<(), AdapterError> {
        // Re-selecting the active cell makes the sheet load the displayed day.
        driver.click(ACTIVE_DAY_SELECTOR).await.map(|_| ())
    }

    async fn request_next_day(
        &self,
        driver: &mut dyn PageDriver,
        _timeouts: &Timeouts,
    ) -> Result<bool, AdapterError> {
        driver.click(NEXT_DAY_SELECTOR).await
    }
}
