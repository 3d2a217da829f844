//! Tee sheets embedded in an iframe on a host page (Utah State Parks).
//!
//! The host page only carries the iframe; the widget inside is a MUI app
//! with a date-filter popover whose grid cells select the day. The adapter
//! navigates the session to the iframe's own URL and drives the widget as a
//! top-level document.

use super::dom::{element_text, first_text, has_match};
use super::driver::{bounded, wait_for_document, PageDriver, Timeouts};
use super::error::AdapterError;
use super::{SiteWidget, SlotScan};
use crate::types::{DayLabel, RawSlot, SiteFamily};
use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, warn};
use url::Url;

const DATE_FILTER_SELECTOR: &str = "button[aria-label=\"date-filter\"]";

/// Clicks the first enabled grid cell after the selected one and reports
/// what it found.
const NEXT_ENABLED_DAY_SCRIPT: &str = r#"(() => {
  const cells = [...document.querySelectorAll('button[role="gridcell"]')];
  if (cells.length === 0) return 'no-grid';
  const current = cells.findIndex((btn) => btn.getAttribute('aria-selected') === 'true');
  if (current === -1) return 'unselected';
  for (let i = current + 1; i < cells.length; i++) {
    if (!cells[i].disabled) {
      cells[i].click();
      return 'advanced';
    }
  }
  return 'last';
})()"#;

/// Outcome of one run of [`NEXT_ENABLED_DAY_SCRIPT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GridStep {
    Advanced,
    /// The selected cell is the last enabled day
    Last,
    /// The date popover is closed
    NoGrid,
    /// Cells rendered but none is selected
    Unselected,
}

impl GridStep {
    fn from_value(value: &serde_json::Value) -> Result<Self, AdapterError> {
        match value.as_str() {
            Some("advanced") => Ok(GridStep::Advanced),
            Some("last") => Ok(GridStep::Last),
            Some("no-grid") => Ok(GridStep::NoGrid),
            Some("unselected") => Ok(GridStep::Unselected),
            _ => Err(AdapterError::driver(format!("unexpected date grid result: {value}"))),
        }
    }
}

static FRAME_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("iframe[src]").unwrap());
static DATE_FILTER: LazyLock<Selector> = LazyLock::new(|| Selector::parse(DATE_FILTER_SELECTOR).unwrap());
static GRID_CELL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"button[role="gridcell"]"#).unwrap());
static DATE_PICKER_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#selectDatePicker").unwrap());
static NO_RECORDS_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[data-testid="no-records-found"]"#).unwrap());
static TILE_HEADER_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"[data-testid="teetimes-tile-header-component"]"#).unwrap()
});
static TILE_CONTENT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"[data-testid="teetimes-tile-content-component"]"#).unwrap()
});
static TILE_TIME_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[data-testid="teetimes-tile-time"]"#).unwrap());
static TILE_PLAYERS_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"[data-testid="teetimes-tile-available-players"]"#).unwrap()
});
static BODY_TEXT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".MuiTypography-body1").unwrap());
static PRICE_TEXT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$\d+(\.\d{2})?$").unwrap());

/// Where the widget document lives relative to the host page.
enum WidgetLocation {
    Frame(String),
    Inline,
}

/// MUI tee-sheet widget hosted in an iframe.
#[derive(Debug, Clone, Copy, Default)]
pub struct IframeWidget;

impl IframeWidget {
    fn locate(document: &Html) -> Option<WidgetLocation> {
        if has_match(document, &DATE_PICKER_SELECTOR) || has_match(document, &DATE_FILTER) {
            return Some(WidgetLocation::Inline);
        }
        document
            .select(&FRAME_SELECTOR)
            .filter_map(|frame| frame.value().attr("src"))
            .map(str::trim)
            .find(|src| !src.is_empty() && !src.starts_with("about:"))
            .map(|src| WidgetLocation::Frame(src.to_string()))
    }

    async fn step_grid(driver: &mut dyn PageDriver) -> Result<GridStep, AdapterError> {
        let value = driver.evaluate(NEXT_ENABLED_DAY_SCRIPT).await?;
        GridStep::from_value(&value)
    }

    /// Clicks the date filter and waits until its day cells render.
    async fn open_date_grid(driver: &mut dyn PageDriver, timeouts: &Timeouts) -> Result<(), AdapterError> {
        if !driver.click(DATE_FILTER_SELECTOR).await? {
            return Err(AdapterError::extraction("date filter button not found"));
        }
        wait_for_document(
            driver,
            "date_grid",
            timeouts.ready(),
            timeouts.poll_interval(),
            |document| has_match(document, &GRID_CELL_SELECTOR).then_some(()),
        )
        .await
    }
}

#[async_trait]
impl SiteWidget for IframeWidget {
    fn family(&self) -> SiteFamily {
        SiteFamily::Iframe
    }

    fn is_ready(&self, document: &Html) -> bool {
        has_match(document, &DATE_PICKER_SELECTOR)
    }

    fn day_label(&self, document: &Html) -> Option<DayLabel> {
        let picker = document.select(&DATE_PICKER_SELECTOR).next()?;
        let text = element_text(picker);
        let label = if text.is_empty() {
            picker.value().attr("value").map(str::trim).unwrap_or_default().to_string()
        } else {
            text
        };
        (!label.is_empty()).then(|| DayLabel::new(label))
    }

    fn scan_slots(&self, document: &Html) -> SlotScan {
        if has_match(document, &NO_RECORDS_SELECTOR) {
            return SlotScan::Empty;
        }

        let headers: Vec<_> = document.select(&TILE_HEADER_SELECTOR).collect();
        if headers.is_empty() {
            return if has_match(document, &DATE_PICKER_SELECTOR) {
                SlotScan::Pending
            } else {
                SlotScan::Missing
            };
        }

        // Header and content components render as siblings, paired by position.
        let contents: Vec<_> = document.select(&TILE_CONTENT_SELECTOR).collect();
        let slots = headers
            .iter()
            .zip(contents.iter().map(Some).chain(std::iter::repeat(None)))
            .map(|(header, content)| RawSlot {
                time: first_text(*header, &TILE_TIME_SELECTOR),
                players: first_text(*header, &TILE_PLAYERS_SELECTOR),
                price: content.and_then(|content| {
                    content
                        .select(&BODY_TEXT_SELECTOR)
                        .map(element_text)
                        .find(|text| PRICE_TEXT_REGEX.is_match(text))
                }),
            })
            .collect();
        SlotScan::Slots(slots)
    }

    async fn prepare(
        &self,
        driver: &mut dyn PageDriver,
        entry_url: &str,
        timeouts: &Timeouts,
    ) -> Result<(), AdapterError> {
        let location = wait_for_document(
            driver,
            "locate_widget",
            timeouts.ready(),
            timeouts.poll_interval(),
            Self::locate,
        )
        .await?;

        if let WidgetLocation::Frame(src) = location {
            let widget_url = Url::parse(entry_url)?.join(&src)?;
            debug!(url = %widget_url, "Following embedded tee sheet");
            bounded("open_frame", timeouts.navigation(), driver.goto(widget_url.as_str())).await?;
        }

        // The grid cells used for day navigation only exist while the date
        // filter popover is open.
        let filter = wait_for_document(
            driver,
            "date_filter",
            timeouts.ready(),
            timeouts.poll_interval(),
            |document| has_match(document, &DATE_FILTER).then_some(()),
        )
        .await;
        match filter {
            Ok(()) => {
                if !bounded("date_filter", timeouts.action(), driver.click(DATE_FILTER_SELECTOR)).await? {
                    warn!("Date filter button vanished before it could be clicked");
                }
            }
            Err(e) if e.is_timeout() => warn!("Date filter never rendered; day navigation may stop early"),
            Err(e) => return Err(e),
        }
        Ok(())
    }

    async fn request_next_day(
        &self,
        driver: &mut dyn PageDriver,
        timeouts: &Timeouts,
    ) -> Result<bool, AdapterError> {
        let mut step = Self::step_grid(driver).await?;
        if step == GridStep::NoGrid {
            // MUI closes the popover after every cell click.
            debug!("Date grid closed, reopening");
            Self::open_date_grid(driver, timeouts).await?;
            step = Self::step_grid(driver).await?;
        }

        match step {
            GridStep::Advanced => Ok(true),
            GridStep::Last => Ok(false),
            GridStep::NoGrid => Err(AdapterError::extraction("date grid did not open")),
            GridStep::Unselected => Err(AdapterError::extraction("date grid has no selected day")),
        }
    }
}
