//! Reasons a course harvest stops before its requested days are done.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal, course-level failures. Day-level failures never end up here.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarvestAbort {
    /// The entry page never became usable
    #[error("Navigation failed: {message}")]
    Navigation { message: String },

    /// The displayed day would not move forward
    #[error("Advance stalled after {attempts} attempts")]
    AdvanceTimeout { attempts: u32 },
}
