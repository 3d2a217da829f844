//! Tee-time availability harvester.
//!
//! Drives golf booking sites one calendar day at a time, normalizes every
//! bookable slot into a canonical [`TeeTimeRecord`], and replaces each
//! (course, date) in a SQLite store.

pub mod adapter;
pub mod config;
pub mod harvest;
pub mod normalize;
pub mod orchestrator;
pub mod store;
pub mod types;

pub use adapter::{adapter_for, AdapterError, AdvanceOutcome, PageAdapter, SourceAdapter};
pub use config::{ConfigError, CourseBinding, HarvestConfig};
pub use harvest::{HarvestAbort, HarvestController, HarvestRun, HarvestSettings, RunOutcome};
pub use normalize::RecordNormalizer;
pub use orchestrator::{HarvestJob, HarvestReport, Orchestrator};
pub use store::{SqliteTeeTimeStore, StoreError, TeeTimeFilter, TeeTimeStore};
pub use types::{Course, DayOutcome, DayStatus, SiteFamily, TeeTimeRecord};
