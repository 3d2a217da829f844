//! Error types for source adapters and page drivers.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while driving a booking page.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// Entry page or its scaffold never became ready
    #[error("Navigation error: {message}")]
    Navigation { message: String },

    /// The expected tee-sheet structure is absent from the page
    #[error("Extraction error: {message}")]
    Extraction { message: String },

    /// A bounded wait elapsed
    #[error("{operation} timed out after {waited:?}")]
    Timeout {
        operation: &'static str,
        waited: Duration,
    },

    /// The page-driving collaborator itself failed
    #[error("Driver error: {message}")]
    Driver { message: String },
}

impl AdapterError {
    pub fn driver(message: impl Into<String>) -> Self {
        AdapterError::Driver {
            message: message.into(),
        }
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        AdapterError::Extraction {
            message: message.into(),
        }
    }

    /// Returns true if this error is a bounded wait elapsing.
    pub fn is_timeout(&self) -> bool {
        matches!(self, AdapterError::Timeout { .. })
    }

    /// Returns true if the page structure itself was wrong.
    pub fn is_structural(&self) -> bool {
        matches!(self, AdapterError::Extraction { .. })
    }

    /// Folds any failure during `open` into a navigation error.
    pub fn into_navigation(self) -> Self {
        match self {
            AdapterError::Navigation { .. } => self,
            other => AdapterError::Navigation {
                message: other.to_string(),
            },
        }
    }
}

impl From<url::ParseError> for AdapterError {
    fn from(err: url::ParseError) -> Self {
        AdapterError::Navigation {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_navigation_keeps_message() {
        let err = AdapterError::Timeout {
            operation: "open",
            waited: Duration::from_secs(15),
        }
        .into_navigation();
        assert_eq!(
            err,
            AdapterError::Navigation {
                message: "open timed out after 15s".to_string()
            }
        );
    }

    #[test]
    fn test_timeout_is_not_structural() {
        let timeout = AdapterError::Timeout {
            operation: "extract_slots",
            waited: Duration::from_millis(10),
        };
        assert!(timeout.is_timeout());
        assert!(!timeout.is_structural());
        assert!(AdapterError::extraction("no tee sheet").is_structural());
    }
}
