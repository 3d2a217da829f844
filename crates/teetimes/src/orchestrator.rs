/// Sequential multi-course harvesting and the run summary
use crate::adapter::SourceAdapter;
use crate::harvest::{HarvestController, HarvestRun, HarvestSettings, RunOutcome};
use crate::store::TeeTimeStore;
use crate::types::{Course, DayStatus};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info};

/// One course paired with the adapter session that will harvest it.
pub struct HarvestJob {
    pub course: Course,
    pub adapter: Box<dyn SourceAdapter>,
    pub requested_days: u32,
}

/// Per-course line of a [`HarvestReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseSummary {
    pub course_id: String,
    pub display_name: String,
    pub outcome: RunOutcome,
    pub days: usize,
    pub records: usize,
}

/// Aggregate result of harvesting every configured course.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HarvestReport {
    pub courses: Vec<CourseSummary>,
    pub total_records: usize,
    pub success_days: usize,
    pub no_availability_days: usize,
    pub extraction_failed_days: usize,
    pub persistence_failed_days: usize,
}

impl HarvestReport {
    fn add(&mut self, course: &Course, run: &HarvestRun) {
        self.total_records += run.records_persisted();
        self.success_days += run.count(DayStatus::Success);
        self.no_availability_days += run.count(DayStatus::NoAvailability);
        self.extraction_failed_days += run.count(DayStatus::ExtractionFailed);
        self.persistence_failed_days += run.count(DayStatus::PersistenceFailed);
        self.courses.push(CourseSummary {
            course_id: course.id.clone(),
            display_name: course.display_name.clone(),
            outcome: run.outcome.clone(),
            days: run.days.len(),
            records: run.records_persisted(),
        });
    }

    pub fn aborted_courses(&self) -> impl Iterator<Item = &CourseSummary> {
        self.courses
            .iter()
            .filter(|c| matches!(c.outcome, RunOutcome::Aborted(_)))
    }
}

impl fmt::Display for HarvestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for course in &self.courses {
            let outcome = match &course.outcome {
                RunOutcome::Completed => "completed".to_string(),
                RunOutcome::EndedEarly { days_processed } => {
                    format!("ended early after {days_processed} days")
                }
                RunOutcome::Aborted(reason) => format!("aborted: {reason}"),
            };
            writeln!(
                f,
                "{} ({}): {} days, {} records, {}",
                course.display_name, course.course_id, course.days, course.records, outcome
            )?;
        }
        write!(
            f,
            "{} courses, {} records; days: {} success, {} no availability, {} extraction failed, {} persistence failed",
            self.courses.len(),
            self.total_records,
            self.success_days,
            self.no_availability_days,
            self.extraction_failed_days,
            self.persistence_failed_days
        )
    }
}

/// Runs harvest jobs one after another against a shared store.
pub struct Orchestrator {
    controller: HarvestController,
}

impl Orchestrator {
    pub fn new(store: Arc<dyn TeeTimeStore>, settings: HarvestSettings) -> Self {
        Self {
            controller: HarvestController::new(store, settings),
        }
    }

    /// Harvests every job in order. An aborted course is logged and the
    /// next course still runs.
    pub async fn run(&self, jobs: Vec<HarvestJob>) -> HarvestReport {
        let mut report = HarvestReport::default();
        let total = jobs.len();

        for (index, mut job) in jobs.into_iter().enumerate() {
            info!(
                course = %job.course.id,
                name = %job.course.display_name,
                position = index + 1,
                total,
                "Harvesting course"
            );

            let run = self
                .controller
                .run(&job.course, job.adapter.as_mut(), job.requested_days)
                .await;

            if let Some(reason) = run.abort_reason() {
                error!(course = %job.course.id, reason = %reason, "Course aborted, moving on");
            }
            info!(summary = %run, "Course finished");

            report.add(&job.course, &run);
        }

        info!(
            courses = report.courses.len(),
            records = report.total_records,
            "Harvest complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::testing::{ScriptedDriver, ScriptedPage};
    use crate::adapter::{adapter_for, Timeouts};
    use crate::harvest::HarvestAbort;
    use crate::store::{SqliteTeeTimeStore, TeeTimeFilter};
    use crate::types::SiteFamily;
    use std::time::Duration;

    const NEXT_DAY: &str = ".dateNavigation img[src*=\"chevron-right\"]";

    fn quick_timeouts() -> Timeouts {
        Timeouts {
            navigation_ms: 200,
            ready_ms: 60,
            advance_ms: 60,
            action_ms: 200,
            poll_interval_ms: 5,
        }
    }

    fn settings() -> HarvestSettings {
        HarvestSettings {
            advance_retries: 1,
            retry_backoff: Duration::from_millis(1),
        }
    }

    fn course(id: &str) -> Course {
        Course {
            id: id.to_string(),
            display_name: id.replace('-', " "),
            entry_url: format!("https://example.test/{id}"),
            site_family: SiteFamily::Direct,
            access_gate_label: None,
        }
    }

    fn sheet(label: &str, times: &[&str]) -> ScriptedPage {
        let rows: String = times
            .iter()
            .map(|t| {
                format!(
                    r#"<div class="teeTime"><div class="timeCol">{t}</div><div class="availableBookings">2 - 4</div><div class="priceCol">$31.50</div></div>"#
                )
            })
            .collect();
        let body = if times.is_empty() {
            r#"<div class="noTeeTimes">No tee times available</div>"#.to_string()
        } else {
            format!(r#"<div class="teeTimes">{rows}</div>"#)
        };
        ScriptedPage::new(format!(
            r#"<html><body><div class="dateNavigation"><span class="dateFormat">{label}</span></div>{body}</body></html>"#
        ))
    }

    fn job(id: &str, driver: ScriptedDriver, days: u32) -> HarvestJob {
        let course = course(id);
        let adapter = adapter_for(&course, Box::new(driver), quick_timeouts());
        HarvestJob {
            course,
            adapter: Box::new(adapter),
            requested_days: days,
        }
    }

    #[tokio::test]
    async fn test_aborted_course_does_not_stop_the_rest() {
        let store = Arc::new(SqliteTeeTimeStore::open_in_memory().unwrap());
        let orchestrator = Orchestrator::new(store.clone(), settings());

        let first = ScriptedDriver::new(vec![
            sheet("Mon, Aug 4, 2025", &["7:00 AM", "7:10 AM"]),
            sheet("Tue, Aug 5, 2025", &[]),
        ])
        .with_next_selector(NEXT_DAY);
        let unreachable = ScriptedDriver::new(vec![]).unreachable();
        let last = ScriptedDriver::new(vec![sheet("Mon, Aug 4, 2025", &["9:30 AM"])])
            .with_next_selector(NEXT_DAY);

        let report = orchestrator
            .run(vec![
                job("pine-valley", first, 2),
                job("oak-ridge", unreachable, 2),
                job("cedar-hills", last, 3),
            ])
            .await;

        assert_eq!(report.courses.len(), 3);
        assert_eq!(report.courses[0].outcome, RunOutcome::Completed);
        assert!(matches!(
            report.courses[1].outcome,
            RunOutcome::Aborted(HarvestAbort::Navigation { .. })
        ));
        assert_eq!(report.courses[2].outcome, RunOutcome::EndedEarly { days_processed: 1 });
        assert_eq!(report.aborted_courses().count(), 1);

        assert_eq!(report.total_records, 3);
        assert_eq!(report.success_days, 2);
        assert_eq!(report.no_availability_days, 1);
        assert_eq!(report.extraction_failed_days, 0);

        let stored = store.query(&TeeTimeFilter::all().course("pine-valley")).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].price, Some(31.5));
        assert_eq!((stored[0].min_players, stored[0].max_players), (2, 4));
        assert_eq!(store.courses().unwrap(), vec!["cedar-hills", "pine-valley"]);
    }

    #[test]
    fn test_report_display() {
        let mut report = HarvestReport::default();
        let mut run = HarvestRun {
            course_id: "pine-valley".to_string(),
            requested_days: 3,
            days: Vec::new(),
            outcome: RunOutcome::Aborted(HarvestAbort::AdvanceTimeout { attempts: 3 }),
        };
        report.add(&course("pine-valley"), &run);
        run.outcome = RunOutcome::Completed;
        report.add(&course("oak-ridge"), &run);

        let text = report.to_string();
        assert!(text.contains("pine valley (pine-valley): 0 days, 0 records, aborted: Advance stalled after 3 attempts"));
        assert!(text.contains("oak ridge (oak-ridge): 0 days, 0 records, completed"));
        assert!(text.ends_with("2 courses, 0 records; days: 0 success, 0 no availability, 0 extraction failed, 0 persistence failed"));
    }
}
