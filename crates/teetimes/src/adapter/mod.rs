//! Source adapters: the five-operation contract the harvest loop drives,
//! and the shared page adapter every site family plugs into.
//!
//! A site family only describes its markup ([`SiteWidget`]): how to tell the
//! page is ready, where the day label lives, how to read the tee sheet, and
//! how to request the next day. Timeouts, polling, label-change detection and
//! the retry-safe advance live once in [`PageAdapter`].

mod calendar;
mod direct;
mod dom;
mod driver;
mod error;
mod iframe;

#[cfg(feature = "chromium")]
pub mod chromium;

#[cfg(test)]
pub(crate) mod testing;

pub use calendar::CalendarGridWidget;
pub use direct::DirectWidget;
pub use driver::{bounded, wait_for_document, PageDriver, Timeouts};
pub use error::AdapterError;
pub use iframe::IframeWidget;

use crate::types::{Course, DayLabel, RawSlot, SiteFamily};
use async_trait::async_trait;
use scraper::Html;
use tracing::{debug, info, warn};

/// Result of asking a source to show the next calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The displayed day label changed
    Advanced,
    /// The source offers no later day
    NoFurtherDays,
    /// The label did not change within the bounded wait
    Timeout,
}

/// Capability set the harvest controller needs from a booking source.
#[async_trait]
pub trait SourceAdapter: Send {
    /// Loads the entry page and waits for its scaffold.
    async fn open(&mut self, entry_url: &str) -> Result<(), AdapterError>;

    /// Best-effort click on a public-access affordance; `false` if absent.
    async fn pass_gate(&mut self, gate_label: &str) -> bool;

    /// Label of the day currently on screen.
    async fn current_day_label(&mut self) -> Result<DayLabel, AdapterError>;

    /// Requests the next day and waits for the label to change.
    async fn advance_day(&mut self) -> Result<AdvanceOutcome, AdapterError>;

    /// Raw slots for the displayed day; empty when the page says so.
    async fn extract_slots(&mut self) -> Result<Vec<RawSlot>, AdapterError>;
}

/// What a tee-sheet snapshot currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotScan {
    /// Rendered slots
    Slots(Vec<RawSlot>),
    /// The page explicitly reports no availability
    Empty,
    /// Scaffold present but slots have not rendered yet
    Pending,
    /// The tee-sheet scaffold is not on the page
    Missing,
}

/// Markup knowledge for one site family.
#[async_trait]
pub trait SiteWidget: Send + Sync {
    fn family(&self) -> SiteFamily;

    /// True once the page is usable after navigation.
    fn is_ready(&self, document: &Html) -> bool;

    fn day_label(&self, document: &Html) -> Option<DayLabel>;

    fn scan_slots(&self, document: &Html) -> SlotScan;

    /// Extra steps between navigation and the readiness wait.
    async fn prepare(
        &self,
        _driver: &mut dyn PageDriver,
        _entry_url: &str,
        _timeouts: &Timeouts,
    ) -> Result<(), AdapterError> {
        Ok(())
    }

    /// Extra steps after the access gate was clicked.
    async fn after_gate(&self, _driver: &mut dyn PageDriver) -> Result<(), AdapterError> {
        Ok(())
    }

    /// Asks the page for the next day; `false` only when the source has no
    /// later day to offer.
    async fn request_next_day(
        &self,
        driver: &mut dyn PageDriver,
        timeouts: &Timeouts,
    ) -> Result<bool, AdapterError>;
}

/// [`SourceAdapter`] over a [`PageDriver`] session and a [`SiteWidget`].
pub struct PageAdapter {
    driver: Box<dyn PageDriver>,
    widget: Box<dyn SiteWidget>,
    timeouts: Timeouts,
    /// Label shown before an advance whose outcome is still unknown
    pending_advance: Option<DayLabel>,
}

impl PageAdapter {
    pub fn new(driver: Box<dyn PageDriver>, widget: Box<dyn SiteWidget>, timeouts: Timeouts) -> Self {
        Self {
            driver,
            widget,
            timeouts,
            pending_advance: None,
        }
    }

    pub fn family(&self) -> SiteFamily {
        self.widget.family()
    }

    /// Reads the label from a single snapshot without waiting.
    async fn peek_label(&mut self) -> Result<Option<DayLabel>, AdapterError> {
        let html = bounded("peek_label", self.timeouts.action(), self.driver.content()).await?;
        let document = Html::parse_document(&html);
        Ok(self.widget.day_label(&document))
    }
}

/// Builds the adapter for a course's site family.
pub fn adapter_for(course: &Course, driver: Box<dyn PageDriver>, timeouts: Timeouts) -> PageAdapter {
    let widget: Box<dyn SiteWidget> = match course.site_family {
        SiteFamily::CalendarGrid => Box::new(CalendarGridWidget),
        SiteFamily::Direct => Box::new(DirectWidget),
        SiteFamily::Iframe => Box::new(IframeWidget),
    };
    PageAdapter::new(driver, widget, timeouts)
}

#[async_trait]
impl SourceAdapter for PageAdapter {
    async fn open(&mut self, entry_url: &str) -> Result<(), AdapterError> {
        let timeouts = self.timeouts;
        info!(family = %self.widget.family(), url = %entry_url, "Opening source");

        bounded("open", timeouts.navigation(), self.driver.goto(entry_url))
            .await
            .map_err(AdapterError::into_navigation)?;

        self.widget
            .prepare(self.driver.as_mut(), entry_url, &timeouts)
            .await
            .map_err(AdapterError::into_navigation)?;

        let widget = &self.widget;
        wait_for_document(
            self.driver.as_mut(),
            "open",
            timeouts.ready(),
            timeouts.poll_interval(),
            |document| widget.is_ready(document).then_some(()),
        )
        .await
        .map_err(AdapterError::into_navigation)
    }

    async fn pass_gate(&mut self, gate_label: &str) -> bool {
        let clicked = bounded(
            "pass_gate",
            self.timeouts.action(),
            self.driver.click_by_text("button, a, label", gate_label),
        )
        .await;

        match clicked {
            Ok(true) => {
                if let Err(e) = self.widget.after_gate(self.driver.as_mut()).await {
                    debug!(error = %e, "Post-gate step failed");
                }
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!(gate = %gate_label, error = %e, "Gate click failed");
                false
            }
        }
    }

    async fn current_day_label(&mut self) -> Result<DayLabel, AdapterError> {
        let widget = &self.widget;
        wait_for_document(
            self.driver.as_mut(),
            "current_day_label",
            self.timeouts.ready(),
            self.timeouts.poll_interval(),
            |document| widget.day_label(document),
        )
        .await
    }

    async fn advance_day(&mut self) -> Result<AdvanceOutcome, AdapterError> {
        // A previous request may have landed after its wait expired; clicking
        // again would then skip a day.
        let before = match self.pending_advance.clone() {
            Some(from) => match self.peek_label().await? {
                Some(now) if now != from => {
                    debug!(from = %from, to = %now, "Late advance observed");
                    self.pending_advance = None;
                    return Ok(AdvanceOutcome::Advanced);
                }
                _ => from,
            },
            None => self.current_day_label().await?,
        };

        let timeouts = self.timeouts;
        let requested = bounded(
            "advance_day",
            timeouts.action() + timeouts.ready(),
            self.widget.request_next_day(self.driver.as_mut(), &timeouts),
        )
        .await;

        match requested {
            Ok(true) => {}
            Ok(false) => {
                self.pending_advance = None;
                return Ok(AdvanceOutcome::NoFurtherDays);
            }
            Err(e) if e.is_timeout() => {
                self.pending_advance = Some(before);
                return Ok(AdvanceOutcome::Timeout);
            }
            Err(e) => return Err(e),
        }

        let widget = &self.widget;
        let changed = wait_for_document(
            self.driver.as_mut(),
            "advance_day",
            self.timeouts.advance(),
            self.timeouts.poll_interval(),
            |document| widget.day_label(document).filter(|label| *label != before),
        )
        .await;

        match changed {
            Ok(_) => {
                self.pending_advance = None;
                Ok(AdvanceOutcome::Advanced)
            }
            Err(e) if e.is_timeout() => {
                self.pending_advance = Some(before);
                Ok(AdvanceOutcome::Timeout)
            }
            Err(e) => Err(e),
        }
    }

    async fn extract_slots(&mut self) -> Result<Vec<RawSlot>, AdapterError> {
        let widget = &self.widget;
        let mut last_scan = None;

        let scanned = wait_for_document(
            self.driver.as_mut(),
            "extract_slots",
            self.timeouts.ready(),
            self.timeouts.poll_interval(),
            |document| match widget.scan_slots(document) {
                SlotScan::Slots(slots) => Some(slots),
                SlotScan::Empty => Some(Vec::new()),
                other => {
                    last_scan = Some(other);
                    None
                }
            },
        )
        .await;

        match (scanned, last_scan) {
            (Ok(slots), _) => Ok(slots),
            (Err(e), Some(SlotScan::Pending)) if e.is_timeout() => {
                debug!("Tee sheet rendered no slots before the deadline");
                Ok(Vec::new())
            }
            (Err(e), Some(SlotScan::Missing)) if e.is_timeout() => Err(AdapterError::extraction(
                format!("{} tee sheet not found on page", widget.family()),
            )),
            (Err(e), _) => Err(e),
        }
    }
}
