//! Common traits for source adapters

use async_trait::async_trait;
use shelf_domain::LibraryItem;
use thiserror::Error;

use super::gemini::CoverRecognition;
use crate::http::HttpError;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(HttpError),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Rate limited")]
    RateLimit,
    #[error("Not found")]
    NotFound,
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Upstream returned status {0}")]
    Status(u16),
}

impl From<HttpError> for SourceError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::RateLimited => SourceError::RateLimit,
            other => SourceError::Http(other),
        }
    }
}

/// Metadata about a source
#[derive(Debug, Clone, Copy)]
pub struct SourceMetadata {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub base_url: &'static str,
    pub requires_api_key: bool,
}

/// Free-text book search
#[async_trait]
pub trait BookSearch: Send + Sync {
    fn metadata(&self) -> SourceMetadata;

    async fn search_books(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<LibraryItem>, SourceError>;
}

/// Free-text paper search
#[async_trait]
pub trait PaperSearch: Send + Sync {
    fn metadata(&self) -> SourceMetadata;

    async fn search_papers(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<LibraryItem>, SourceError>;
}

/// Best-effort identification of a cover photo
#[async_trait]
pub trait CoverRecognizer: Send + Sync {
    fn metadata(&self) -> SourceMetadata;

    async fn recognize(&self, image: &[u8], mime_type: &str)
        -> Result<CoverRecognition, SourceError>;
}

/// Reject blank queries before any request is made
pub fn require_query(query: &str) -> Result<&str, SourceError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        Err(SourceError::InvalidQuery("query is empty".to_string()))
    } else {
        Ok(trimmed)
    }
}
