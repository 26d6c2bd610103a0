//! Semantic Scholar source adapter
//!
//! Structured alternative to scraping Scholar.
//! API docs: https://api.semanticscholar.org/api-docs/graph

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use shelf_domain::{ItemType, LibraryItem};

use super::mapping::{apply_mapping_all, FieldRule, ItemField, SourceMapping, Transform};
use super::traits::{require_query, PaperSearch, SourceError, SourceMetadata};
use crate::http::HttpClient;

const BASE_URL: &str = "https://api.semanticscholar.org/graph/v1";
const FIELDS_PARAM: &str = "title,authors,year,abstract,citationCount,url,venue,fieldsOfStudy";
pub const MAX_PAGE_SIZE: u32 = 100;

const FIELDS: &[FieldRule] = &[
    FieldRule::new(ItemField::Title, &["title"], Transform::Text),
    FieldRule::new(ItemField::Author, &["authors"], Transform::JoinList),
    FieldRule::new(ItemField::PublishingYear, &["year"], Transform::LeadingYear),
    FieldRule::new(ItemField::Summary, &["abstract"], Transform::Text),
    FieldRule::new(ItemField::CitationCount, &["citationCount"], Transform::CountOrZero),
    FieldRule::new(ItemField::Url, &["url"], Transform::Text),
    FieldRule::new(ItemField::Category, &["fieldsOfStudy"], Transform::FirstOfList),
    FieldRule::new(ItemField::Publisher, &["venue"], Transform::Text),
];

/// Field mapping for a Semantic Scholar paper object
pub const SEMANTIC_SCHOLAR_MAPPING: SourceMapping = SourceMapping {
    source_id: "semantic_scholar",
    item_type: Some(ItemType::Paper),
    rules: FIELDS,
};

#[derive(Debug, Deserialize)]
struct PaperSearchResponse {
    #[serde(default)]
    data: Vec<Value>,
}

pub struct SemanticScholarSource {
    http: HttpClient,
    base_url: String,
}

impl SemanticScholarSource {
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn source_metadata() -> SourceMetadata {
        SourceMetadata {
            id: "semantic_scholar",
            name: "Semantic Scholar",
            description: "AI-powered research tool with a public graph API",
            base_url: BASE_URL,
            requires_api_key: false,
        }
    }

    /// Parse a paper search response
    pub fn parse_search_response(json: &str) -> Result<Vec<LibraryItem>, SourceError> {
        let response: PaperSearchResponse = serde_json::from_str(json)
            .map_err(|e| SourceError::Parse(format!("Invalid Semantic Scholar JSON: {}", e)))?;

        Ok(apply_mapping_all(&response.data, &SEMANTIC_SCHOLAR_MAPPING))
    }
}

#[async_trait]
impl PaperSearch for SemanticScholarSource {
    fn metadata(&self) -> SourceMetadata {
        Self::source_metadata()
    }

    async fn search_papers(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<LibraryItem>, SourceError> {
        let query = require_query(query)?;
        let limit = max_results.clamp(1, MAX_PAGE_SIZE).to_string();
        let url = format!("{}/paper/search", self.base_url);

        tracing::debug!(query, "Searching Semantic Scholar");
        let response = self
            .http
            .get_with_params(
                &url,
                &[("query", query), ("limit", limit.as_str()), ("fields", FIELDS_PARAM)],
            )
            .await?;

        if !response.is_success() {
            return Err(SourceError::Status(response.status));
        }

        Self::parse_search_response(&response.body)
    }
}
