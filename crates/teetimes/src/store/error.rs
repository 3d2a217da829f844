//! Error types for the tee-time store.

use thiserror::Error;

/// Errors that can occur while reading or writing tee times.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite rejected the statement or the connection failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The database file's directory could not be prepared
    #[error("Store path error: {0}")]
    Io(#[from] std::io::Error),

    /// A previous writer panicked while holding the connection
    #[error("Store connection lock poisoned")]
    Poisoned,
}
