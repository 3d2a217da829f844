/// Query filter for stored tee times
use chrono::NaiveDate;

/// Conjunctive filter; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeeTimeFilter {
    pub course_id: Option<String>,
    /// Inclusive lower bound
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound
    pub to: Option<NaiveDate>,
}

impl TeeTimeFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn course(mut self, course_id: impl Into<String>) -> Self {
        self.course_id = Some(course_id.into());
        self
    }

    pub fn since(mut self, date: NaiveDate) -> Self {
        self.from = Some(date);
        self
    }

    pub fn until(mut self, date: NaiveDate) -> Self {
        self.to = Some(date);
        self
    }

    /// Restricts to a single calendar day.
    pub fn on(self, date: NaiveDate) -> Self {
        self.since(date).until(date)
    }
}
