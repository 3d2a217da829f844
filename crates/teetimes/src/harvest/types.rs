/// Harvest run bookkeeping
use super::error::HarvestAbort;
use crate::types::{DayOutcome, DayStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Retry policy for the advancing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestSettings {
    /// Extra advance attempts after the first timeout
    pub advance_retries: u32,
    /// Delay before the first retry; doubled per retry, plus jitter
    pub retry_backoff: Duration,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            advance_retries: 2,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// How a course harvest ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Every requested day was processed
    Completed,
    /// The source ran out of days first
    EndedEarly { days_processed: u32 },
    Aborted(HarvestAbort),
}

/// One execution of N days for one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestRun {
    pub course_id: String,
    pub requested_days: u32,
    /// In the order the days were visited
    pub days: Vec<DayOutcome>,
    pub outcome: RunOutcome,
}

impl HarvestRun {
    pub(crate) fn new(course_id: &str, requested_days: u32) -> Self {
        Self {
            course_id: course_id.to_string(),
            requested_days,
            days: Vec::new(),
            outcome: RunOutcome::Completed,
        }
    }

    /// Records written to the store across all days.
    pub fn records_persisted(&self) -> usize {
        self.days
            .iter()
            .filter(|day| day.status == DayStatus::Success)
            .map(|day| day.record_count)
            .sum()
    }

    pub fn count(&self, status: DayStatus) -> usize {
        self.days.iter().filter(|day| day.status == status).count()
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.outcome, RunOutcome::Aborted(_))
    }

    pub fn abort_reason(&self) -> Option<&HarvestAbort> {
        match &self.outcome {
            RunOutcome::Aborted(reason) => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for HarvestRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days: Vec<String> = self.days.iter().map(ToString::to_string).collect();
        write!(f, "{}: [{}]", self.course_id, days.join(", "))?;
        match &self.outcome {
            RunOutcome::Completed => Ok(()),
            RunOutcome::EndedEarly { days_processed } => {
                write!(f, " ended early after {days_processed} of {} days", self.requested_days)
            }
            RunOutcome::Aborted(reason) => write!(f, " aborted: {reason}"),
        }
    }
}
