//! Persistence layer error types

use std::fmt;
use thiserror::Error;

/// Which external store an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Store {
    Database,
    Cache,
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database => f.write_str("database"),
            Self::Cache => f.write_str("cache"),
        }
    }
}

/// Persistence layer errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to connect to {store}: {message}")]
    Connection { store: Store, message: String },

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Cache write failed for key {key}: {message}")]
    Write { key: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PersistenceError {
    pub fn connection(store: Store, err: impl fmt::Display) -> Self {
        Self::Connection {
            store,
            message: err.to_string(),
        }
    }

    pub fn write(key: &str, err: impl fmt::Display) -> Self {
        Self::Write {
            key: key.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PersistenceError>;
