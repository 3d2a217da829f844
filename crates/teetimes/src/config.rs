/// Harvest configuration loaded from a JSON file
use crate::adapter::Timeouts;
use crate::harvest::HarvestSettings;
use crate::types::Course;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while loading a harvest configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {message}")]
    Invalid { message: String },
}

/// Top-level harvest configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestConfig {
    pub database_path: PathBuf,
    /// Days per course unless a course overrides it
    #[serde(default = "default_requested_days")]
    pub requested_days: u32,
    #[serde(default)]
    pub timeouts: Timeouts,
    #[serde(default = "default_advance_retries")]
    pub advance_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    pub courses: Vec<CourseBinding>,
}

/// A course plus its per-course overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseBinding {
    #[serde(flatten)]
    pub course: Course,
    #[serde(default)]
    pub requested_days: Option<u32>,
}

fn default_requested_days() -> u32 {
    5
}

fn default_advance_retries() -> u32 {
    HarvestSettings::default().advance_retries
}

fn default_retry_backoff_ms() -> u64 {
    HarvestSettings::default().retry_backoff.as_millis() as u64
}

impl HarvestConfig {
    /// Reads, parses and validates a config file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: HarvestConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants serde can't express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::Invalid { message });

        if self.courses.is_empty() {
            return invalid("no courses configured".to_string());
        }
        if self.requested_days == 0 {
            return invalid("requested_days must be at least 1".to_string());
        }

        let mut seen = HashSet::new();
        for binding in &self.courses {
            let course = &binding.course;
            if course.id.trim().is_empty() {
                return invalid(format!("course '{}' has an empty id", course.display_name));
            }
            if !seen.insert(course.id.as_str()) {
                return invalid(format!("duplicate course id '{}'", course.id));
            }
            if url::Url::parse(&course.entry_url).is_err() {
                return invalid(format!("course '{}' has an invalid entry_url", course.id));
            }
            if binding.requested_days == Some(0) {
                return invalid(format!("course '{}' requests zero days", course.id));
            }
        }
        Ok(())
    }

    pub fn harvest_settings(&self) -> HarvestSettings {
        HarvestSettings {
            advance_retries: self.advance_retries,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    /// Days to harvest for `binding`, after overrides.
    pub fn days_for(&self, binding: &CourseBinding) -> u32 {
        binding.requested_days.unwrap_or(self.requested_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SiteFamily;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "database_path": "data/tee_times.db",
        "timeouts": { "ready_ms": 20000 },
        "courses": [
            {
                "id": "pine-valley",
                "display_name": "Pine Valley",
                "entry_url": "https://foreupsoftware.com/index.php/booking/19765/2431",
                "site_family": "foreup",
                "access_gate_label": "Public"
            },
            {
                "id": "soldier-hollow",
                "display_name": "Soldier Hollow",
                "entry_url": "https://stateparks.utah.gov/golf/soldier-hollow/teetime/",
                "site_family": "iframe",
                "requested_days": 3
            }
        ]
    }"#;

    #[test]
    fn test_defaults_and_overrides() {
        let config: HarvestConfig = serde_json::from_str(SAMPLE).unwrap();
        config.validate().unwrap();

        assert_eq!(config.requested_days, 5);
        assert_eq!(config.timeouts.ready_ms, 20_000);
        assert_eq!(config.timeouts.navigation_ms, Timeouts::default().navigation_ms);
        assert_eq!(config.harvest_settings(), HarvestSettings::default());

        let pine = &config.courses[0];
        assert_eq!(pine.course.site_family, SiteFamily::CalendarGrid);
        assert_eq!(pine.course.access_gate_label.as_deref(), Some("Public"));
        assert_eq!(config.days_for(pine), 5);
        assert_eq!(config.days_for(&config.courses[1]), 3);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut config: HarvestConfig = serde_json::from_str(SAMPLE).unwrap();
        config.courses[1].course.id = "pine-valley".to_string();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref message } if message.contains("duplicate")));
    }

    #[test]
    fn test_zero_days_rejected() {
        let mut config: HarvestConfig = serde_json::from_str(SAMPLE).unwrap();
        config.courses[0].requested_days = Some(0);
        assert!(config.validate().is_err());

        config.courses[0].requested_days = None;
        config.requested_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = HarvestConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.courses.len(), 2);
        assert_eq!(config.database_path, PathBuf::from("data/tee_times.db"));
    }

    #[test]
    fn test_load_errors_are_typed() {
        let missing = HarvestConfig::load_from_file(Path::new("/nonexistent/harvest.json"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        assert!(matches!(
            HarvestConfig::load_from_file(file.path()),
            Err(ConfigError::Json(_))
        ));
    }
}
