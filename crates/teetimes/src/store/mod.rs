//! Persistence for canonical tee-time records.
//!
//! A (course, date) pair is the unit of replacement: every harvest of a day
//! overwrites whatever an earlier run stored for it, so re-running a harvest
//! never accumulates duplicates.

mod error;
mod sqlite;
mod types;

pub use error::StoreError;
pub use sqlite::SqliteTeeTimeStore;
pub use types::TeeTimeFilter;

use crate::types::TeeTimeRecord;
use chrono::NaiveDate;

/// Storage seam used by the harvest controller.
pub trait TeeTimeStore: Send + Sync {
    /// Atomically replaces every record for `(course_id, iso_date)` with
    /// `records`. An empty slice clears the key. Returns the number written.
    fn replace_day(
        &self,
        course_id: &str,
        iso_date: NaiveDate,
        records: &[TeeTimeRecord],
    ) -> Result<usize, StoreError>;

    /// Records matching `filter`, ordered by date then time of day.
    fn query(&self, filter: &TeeTimeFilter) -> Result<Vec<TeeTimeRecord>, StoreError>;
}
