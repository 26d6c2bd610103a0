//! Error types for shelf-core

use shelf_domain::ValidationErrors;
use thiserror::Error;

use crate::config::ConfigError;
use crate::http::HttpError;
use crate::sources::SourceError;

/// Result type alias for shelf operations
pub type Result<T> = std::result::Result<T, ShelfError>;

/// Main error type for shelf operations
#[derive(Error, Debug)]
pub enum ShelfError {
    /// Item rejected at the point of entry
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Persistence backend failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// External source failure
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Configuration problem
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Persistence-specific errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// No item with that id
    #[error("Item not found: {0}")]
    NotFound(String),

    /// An item with that id already exists
    #[error("Duplicate item id: {0}")]
    Duplicate(String),

    /// Local database error
    #[error("Database error: {0}")]
    Database(String),

    /// The hosted row store rejected the request
    #[error("Remote store returned {status}: {message}")]
    Remote { status: u16, message: String },

    /// Transport failure talking to the hosted row store
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}
