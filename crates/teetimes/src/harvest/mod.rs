//! Day-iteration harvest for a single course.
//!
//! The controller walks one adapter session through the requested number of
//! days:
//!
//! ```text
//! Init -> GateChecked -> DayReady -> Extracting -> Persisted -> Advancing
//!                            ^                                     |
//!                            +------------- Advanced --------------+--> Done / Aborted
//! ```
//!
//! Only navigation failures and a stalled advance end a course early. Every
//! other failure is recorded against its day and the walk continues. Each day
//! is written to the store before the next one is requested.

mod error;
mod types;

pub use error::HarvestAbort;
pub use types::{HarvestRun, HarvestSettings, RunOutcome};

use crate::adapter::{AdapterError, AdvanceOutcome, SourceAdapter};
use crate::normalize::{resolve_date, RecordNormalizer, ResolvedDate};
use crate::store::{StoreError, TeeTimeStore};
use crate::types::{Course, DayFault, DayOutcome, DayStatus, TeeTimeRecord};
use chrono::{Local, NaiveDate, Utc};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Longest pause between advance retries, before jitter.
const MAX_RETRY_BACKOFF_MS: u64 = 10_000;

/// Where the walk currently is.
enum Phase {
    Init,
    GateChecked,
    DayReady,
    Extracting(DayContext),
    Persisted,
    Advancing,
    Done(RunOutcome),
}

/// What is known about the displayed day before its slots are read.
struct DayContext {
    label: Option<String>,
    date: ResolvedDate,
    /// Set when the day label could not be read at all
    label_fault: Option<DayFault>,
}

/// Drives one course through its requested days.
pub struct HarvestController {
    store: Arc<dyn TeeTimeStore>,
    settings: HarvestSettings,
}

impl HarvestController {
    pub fn new(store: Arc<dyn TeeTimeStore>, settings: HarvestSettings) -> Self {
        Self { store, settings }
    }

    /// Harvests up to `requested_days` consecutive days starting from the day
    /// the source shows after opening.
    ///
    /// Always returns a [`HarvestRun`]; failures are reported through its
    /// day statuses and [`RunOutcome`].
    pub async fn run(
        &self,
        course: &Course,
        adapter: &mut dyn SourceAdapter,
        requested_days: u32,
    ) -> HarvestRun {
        self.run_from(course, adapter, requested_days, Local::now().date_naive())
            .await
    }

    /// Like [`HarvestController::run`], with labels resolved against
    /// `reference` (today in production).
    pub(crate) async fn run_from(
        &self,
        course: &Course,
        adapter: &mut dyn SourceAdapter,
        requested_days: u32,
        reference: NaiveDate,
    ) -> HarvestRun {
        let mut run = HarvestRun::new(&course.id, requested_days);
        if requested_days == 0 {
            return run;
        }

        info!(
            course = %course.id,
            family = %course.site_family,
            days = requested_days,
            "Starting harvest"
        );

        let mut previous_date: Option<NaiveDate> = None;
        let mut phase = Phase::Init;

        let outcome = loop {
            phase = match phase {
                Phase::Init => match adapter.open(&course.entry_url).await {
                    Ok(()) => Phase::GateChecked,
                    Err(e) => {
                        error!(course = %course.id, error = %e, "Could not open source");
                        Phase::Done(RunOutcome::Aborted(HarvestAbort::Navigation {
                            message: e.to_string(),
                        }))
                    }
                },

                Phase::GateChecked => {
                    if let Some(gate) = &course.access_gate_label {
                        if adapter.pass_gate(gate).await {
                            debug!(course = %course.id, gate = %gate, "Passed access gate");
                        } else {
                            info!(course = %course.id, gate = %gate, "Access gate not found, continuing");
                        }
                    }
                    Phase::DayReady
                }

                Phase::DayReady => {
                    // The day after the last resolved one; a derived date must
                    // never land on a key an earlier day already wrote.
                    let fallback = match previous_date {
                        Some(prev) => prev.succ_opt().unwrap_or(prev),
                        None => reference,
                    };
                    let context = match adapter.current_day_label().await {
                        Ok(label) => DayContext {
                            date: resolve_date(Some(label.as_str()), reference, fallback),
                            label: Some(label.as_str().to_string()),
                            label_fault: None,
                        },
                        Err(e) => {
                            warn!(course = %course.id, error = %e, "Could not read day label");
                            DayContext {
                                label: None,
                                date: resolve_date(None, reference, fallback),
                                label_fault: Some(day_fault(&e)),
                            }
                        }
                    };

                    if context.date.derived && context.label.is_some() {
                        warn!(
                            course = %course.id,
                            label = context.label.as_deref().unwrap_or_default(),
                            date = %context.date.date,
                            "Unrecognized day label, using derived date"
                        );
                    }
                    if previous_date.is_some_and(|prev| context.date.date <= prev) {
                        warn!(course = %course.id, date = %context.date.date, "Day did not move forward");
                    }
                    previous_date = Some(context.date.date);

                    Phase::Extracting(context)
                }

                Phase::Extracting(context) => {
                    let day = self.harvest_day(course, adapter, context).await;
                    info!(
                        course = %course.id,
                        day = day.label.as_deref().unwrap_or("?"),
                        date = %day.iso_date,
                        status = ?day.status,
                        records = day.record_count,
                        "Day harvested"
                    );
                    run.days.push(day);
                    Phase::Persisted
                }

                Phase::Persisted => {
                    if run.days.len() as u32 >= requested_days {
                        Phase::Done(RunOutcome::Completed)
                    } else {
                        Phase::Advancing
                    }
                }

                Phase::Advancing => match self.advance(course, adapter).await {
                    Ok(AdvanceOutcome::Advanced) => Phase::DayReady,
                    Ok(_) => {
                        let days_processed = run.days.len() as u32;
                        info!(course = %course.id, days_processed, "Source has no further days");
                        Phase::Done(RunOutcome::EndedEarly { days_processed })
                    }
                    Err(reason) => {
                        error!(course = %course.id, error = %reason, "Aborting course");
                        Phase::Done(RunOutcome::Aborted(reason))
                    }
                },

                Phase::Done(outcome) => break outcome,
            };
        };

        run.outcome = outcome;
        info!(
            course = %course.id,
            days = run.days.len(),
            records = run.records_persisted(),
            "Harvest finished"
        );
        run
    }

    /// Extracts, normalizes and persists the displayed day.
    async fn harvest_day(
        &self,
        course: &Course,
        adapter: &mut dyn SourceAdapter,
        context: DayContext,
    ) -> DayOutcome {
        let DayContext {
            label,
            date,
            label_fault,
        } = context;

        let extracted = match label_fault {
            Some(fault) => Err(fault),
            None => adapter.extract_slots().await.map_err(|e| day_fault(&e)),
        };

        let (status, records, fault) = match extracted {
            Ok(slots) if slots.is_empty() => (DayStatus::NoAvailability, Vec::new(), None),
            Ok(slots) => {
                let normalizer = RecordNormalizer::for_day(&course.id, date, Utc::now());
                let records = normalizer.normalize_all(&slots);
                if records.is_empty() {
                    warn!(course = %course.id, raw = slots.len(), "No slot had a usable time");
                    (DayStatus::NoAvailability, records, None)
                } else {
                    (DayStatus::Success, records, None)
                }
            }
            Err(fault) => {
                warn!(course = %course.id, date = %date.date, fault = %fault, "Extraction failed");
                (DayStatus::ExtractionFailed, Vec::new(), Some(fault))
            }
        };

        // Written even when empty so nothing stale survives for this key.
        let (status, record_count, fault) = match self.persist(&course.id, date.date, &records) {
            Ok(written) => (status, written, fault),
            Err(e) => {
                error!(
                    course = %course.id,
                    date = %date.date,
                    records = records.len(),
                    error = %e,
                    "Could not persist day"
                );
                (DayStatus::PersistenceFailed, 0, Some(DayFault::Persistence(e.to_string())))
            }
        };

        DayOutcome {
            label,
            iso_date: date.date,
            date_derived: date.derived,
            status,
            record_count,
            fault,
        }
    }

    fn persist(
        &self,
        course_id: &str,
        date: NaiveDate,
        records: &[TeeTimeRecord],
    ) -> Result<usize, StoreError> {
        self.store.replace_day(course_id, date, records)
    }

    /// Requests the next day, retrying stalls with backoff.
    ///
    /// Returns `Advanced` or `NoFurtherDays`; exhausting the retries is an
    /// abort.
    async fn advance(
        &self,
        course: &Course,
        adapter: &mut dyn SourceAdapter,
    ) -> Result<AdvanceOutcome, HarvestAbort> {
        let attempts = self.settings.advance_retries + 1;

        for attempt in 1..=attempts {
            match adapter.advance_day().await {
                Ok(AdvanceOutcome::Timeout) => {
                    warn!(course = %course.id, attempt, attempts, "Advance timed out");
                }
                Ok(outcome) => return Ok(outcome),
                Err(e) => {
                    warn!(course = %course.id, attempt, attempts, error = %e, "Advance failed");
                }
            }

            if attempt < attempts {
                let delay = self.retry_delay(attempt);
                debug!(course = %course.id, delay_ms = delay.as_millis() as u64, "Retrying advance");
                tokio::time::sleep(delay).await;
            }
        }

        Err(HarvestAbort::AdvanceTimeout { attempts })
    }

    /// Exponential backoff with up to 20% jitter.
    fn retry_delay(&self, attempt: u32) -> Duration {
        let base = self.settings.retry_backoff.as_millis() as u64;
        let exponential = base.saturating_mul(2u64.pow(attempt.saturating_sub(1).min(5)));
        let capped = exponential.min(MAX_RETRY_BACKOFF_MS);
        let jitter = rand::thread_rng().gen_range(0..=(capped / 5));
        Duration::from_millis(capped + jitter)
    }
}

fn day_fault(error: &AdapterError) -> DayFault {
    match error {
        AdapterError::Timeout { .. } => DayFault::TimedOut(error.to_string()),
        AdapterError::Extraction { message } => DayFault::Scaffold(message.clone()),
        other => DayFault::Scaffold(other.to_string()),
    }
}
