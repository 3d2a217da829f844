//! Tee sheets rendered straight into the page (MemberSports).

use super::dom::{document_text, first_text, has_match, mentions_any};
use super::driver::{PageDriver, Timeouts};
use super::error::AdapterError;
use super::{SiteWidget, SlotScan};
use crate::types::{DayLabel, RawSlot, SiteFamily};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::sync::LazyLock;

pub(crate) const NEXT_DAY_SELECTOR: &str = ".dateNavigation img[src*=\"chevron-right\"]";

static DATE_LABEL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".dateFormat").unwrap());
static TEE_SHEET_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".teeTimes").unwrap());
static TEE_TIME_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".teeTime, .tee-time-slot").unwrap());
static TIME_COL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".timeCol").unwrap());
static AVAILABLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".availableBookings").unwrap());
static PRICE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".priceCol, .price").unwrap());
static EMPTY_NOTICE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".noTeeTimes, .no-tee-times").unwrap());

const EMPTY_PHRASES: &[&str] = &["no tee times", "no available tee times"];

/// MemberSports-style tee sheet with chevron day navigation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectWidget;

#[async_trait]
impl SiteWidget for DirectWidget {
    fn family(&self) -> SiteFamily {
        SiteFamily::Direct
    }

    fn is_ready(&self, document: &Html) -> bool {
        has_match(document, &DATE_LABEL_SELECTOR)
    }

    fn day_label(&self, document: &Html) -> Option<DayLabel> {
        document_text(document, &DATE_LABEL_SELECTOR).map(DayLabel::new)
    }

    fn scan_slots(&self, document: &Html) -> SlotScan {
        if has_match(document, &EMPTY_NOTICE_SELECTOR) {
            return SlotScan::Empty;
        }

        let Some(sheet) = document.select(&TEE_SHEET_SELECTOR).next() else {
            // The sheet container is dropped entirely on some empty days.
            return if mentions_any(document.root_element(), EMPTY_PHRASES) {
                SlotScan::Empty
            } else {
                SlotScan::Missing
            };
        };

        let slots: Vec<RawSlot> = sheet
            .select(&TEE_TIME_SELECTOR)
            .filter_map(|row| {
                let time = first_text(row, &TIME_COL_SELECTOR)?;
                Some(RawSlot {
                    time: Some(time),
                    players: first_text(row, &AVAILABLE_SELECTOR),
                    price: first_text(row, &PRICE_SELECTOR),
                })
            })
            .collect();

        if !slots.is_empty() {
            SlotScan::Slots(slots)
        } else if mentions_any(sheet, EMPTY_PHRASES) {
            SlotScan::Empty
        } else {
            SlotScan::Pending
        }
    }

    async fn request_next_day(
        &self,
        driver: &mut dyn PageDriver,
        _timeouts: &Timeouts,
    ) -> Result<bool, AdapterError> {
        driver.click(NEXT_DAY_SELECTOR).await
    }
}
