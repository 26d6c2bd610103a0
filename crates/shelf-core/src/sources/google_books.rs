//! Google Books source adapter
//!
//! API docs: https://developers.google.com/books/docs/v1/using
//! Quota: 1,000 requests/day without a key

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use shelf_domain::{ItemType, LibraryItem};

use super::mapping::{apply_mapping_all, FieldRule, ItemField, SourceMapping, Transform};
use super::traits::{require_query, BookSearch, SourceError, SourceMetadata};
use crate::http::HttpClient;

const BASE_URL: &str = "https://www.googleapis.com/books/v1/volumes";

/// The API rejects larger page sizes
pub const MAX_PAGE_SIZE: u32 = 40;

const FIELDS: &[FieldRule] = &[
    FieldRule::new(ItemField::Title, &["volumeInfo", "title"], Transform::Text),
    FieldRule::new(ItemField::Author, &["volumeInfo", "authors"], Transform::JoinList),
    FieldRule::new(ItemField::Publisher, &["volumeInfo", "publisher"], Transform::Text),
    FieldRule::new(
        ItemField::PublishingYear,
        &["volumeInfo", "publishedDate"],
        Transform::LeadingYear,
    ),
    FieldRule::new(ItemField::Summary, &["volumeInfo", "description"], Transform::Text),
    FieldRule::new(ItemField::Pages, &["volumeInfo", "pageCount"], Transform::Count),
    FieldRule::new(
        ItemField::Category,
        &["volumeInfo", "categories"],
        Transform::FirstOfList,
    ),
    FieldRule::new(ItemField::Language, &["volumeInfo", "language"], Transform::Text),
    FieldRule::new(
        ItemField::CoverUrl,
        &["volumeInfo", "imageLinks", "thumbnail"],
        Transform::HttpsUrl,
    ),
    FieldRule::new(ItemField::Url, &["volumeInfo", "infoLink"], Transform::HttpsUrl),
    FieldRule::new(
        ItemField::Isbn,
        &["volumeInfo", "industryIdentifiers"],
        Transform::PreferredIsbn,
    ),
];

/// Field mapping for a Google Books volume resource
pub const GOOGLE_BOOKS_MAPPING: SourceMapping = SourceMapping {
    source_id: "google_books",
    item_type: Some(ItemType::Book),
    rules: FIELDS,
};

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Value>,
}

pub struct GoogleBooksSource {
    http: HttpClient,
    api_key: Option<String>,
    base_url: String,
}

impl GoogleBooksSource {
    pub fn new(http: HttpClient, api_key: Option<String>) -> Self {
        Self {
            http,
            api_key,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn source_metadata() -> SourceMetadata {
        SourceMetadata {
            id: "google_books",
            name: "Google Books",
            description: "Book metadata, covers and ISBNs",
            base_url: BASE_URL,
            requires_api_key: false,
        }
    }

    /// Parse a volumes list response
    pub fn parse_search_response(json: &str) -> Result<Vec<LibraryItem>, SourceError> {
        let response: VolumesResponse = serde_json::from_str(json)
            .map_err(|e| SourceError::Parse(format!("Invalid Google Books JSON: {}", e)))?;

        Ok(apply_mapping_all(&response.items, &GOOGLE_BOOKS_MAPPING))
    }

    /// Parse a single volume resource
    pub fn parse_volume(json: &str) -> Result<LibraryItem, SourceError> {
        let volume: Value = serde_json::from_str(json)
            .map_err(|e| SourceError::Parse(format!("Invalid Google Books JSON: {}", e)))?;

        super::mapping::apply_mapping(&volume, &GOOGLE_BOOKS_MAPPING)
            .ok_or_else(|| SourceError::Parse("Volume has no title".to_string()))
    }
}

#[async_trait]
impl BookSearch for GoogleBooksSource {
    fn metadata(&self) -> SourceMetadata {
        Self::source_metadata()
    }

    async fn search_books(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<LibraryItem>, SourceError> {
        let query = require_query(query)?;
        let max = max_results.clamp(1, MAX_PAGE_SIZE).to_string();

        let mut params = vec![("q", query), ("maxResults", max.as_str()), ("printType", "books")];
        if let Some(key) = self.api_key.as_deref() {
            params.push(("key", key));
        }

        tracing::debug!(query, "Searching Google Books");
        let response = self.http.get_with_params(&self.base_url, &params).await?;
        if !response.is_success() {
            return Err(SourceError::Status(response.status));
        }

        Self::parse_search_response(&response.body)
    }
}
