//! Failure-absorbing facade over the external sources
//!
//! Callers never see a source error: a failed book or paper search becomes an
//! empty list, a failed recognition becomes the placeholder.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shelf_domain::LibraryItem;

use super::gemini::{CoverGuess, CoverRecognition, GeminiRecognizer};
use super::google_books::GoogleBooksSource;
use super::scholar::ScholarSource;
use super::semantic_scholar::SemanticScholarSource;
use super::traits::{BookSearch, CoverRecognizer, PaperSearch, SourceMetadata};
use crate::config::{PaperProvider, ShelfConfig};
use crate::error::Result;

/// Books and papers found for one query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedResults {
    pub books: Vec<LibraryItem>,
    pub papers: Vec<LibraryItem>,
}

/// A recognized cover plus the verified matches found for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub recognition: CoverRecognition,
    pub candidates: Vec<LibraryItem>,
}

pub struct Catalog {
    books: Arc<dyn BookSearch>,
    papers: Arc<dyn PaperSearch>,
    covers: Option<Arc<dyn CoverRecognizer>>,
}

impl Catalog {
    pub fn new(
        books: Arc<dyn BookSearch>,
        papers: Arc<dyn PaperSearch>,
        covers: Option<Arc<dyn CoverRecognizer>>,
    ) -> Self {
        Self {
            books,
            papers,
            covers,
        }
    }

    /// Wire up the configured providers
    pub fn from_config(config: &ShelfConfig) -> Result<Self> {
        let http = config.http_client()?;

        let books = Arc::new(GoogleBooksSource::new(
            http.clone(),
            config.google_books.api_key.clone(),
        ));

        let papers: Arc<dyn PaperSearch> = match config.papers.provider {
            PaperProvider::Scholar => Arc::new(ScholarSource::new(
                http.clone(),
                config.scholar.proxy_url.clone(),
            )),
            PaperProvider::SemanticScholar => Arc::new(SemanticScholarSource::new(http.clone())),
        };

        let covers = config.gemini.api_key.clone().map(|key| {
            Arc::new(GeminiRecognizer::new(
                http.clone(),
                key,
                config.gemini.model.clone(),
            )) as Arc<dyn CoverRecognizer>
        });

        if covers.is_none() {
            tracing::info!("No Gemini API key configured, cover recognition disabled");
        }

        Ok(Self::new(books, papers, covers))
    }

    pub fn book_source(&self) -> SourceMetadata {
        self.books.metadata()
    }

    pub fn paper_source(&self) -> SourceMetadata {
        self.papers.metadata()
    }

    pub fn cover_source(&self) -> Option<SourceMetadata> {
        self.covers.as_ref().map(|c| c.metadata())
    }

    pub async fn search_books(&self, query: &str, max_results: u32) -> Vec<LibraryItem> {
        match self.books.search_books(query, max_results).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(source = self.books.metadata().id, "Book search failed: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn search_papers(&self, query: &str, max_results: u32) -> Vec<LibraryItem> {
        match self.papers.search_papers(query, max_results).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(source = self.papers.metadata().id, "Paper search failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Run book and paper searches concurrently
    pub async fn search_all(&self, query: &str, max_results: u32) -> CombinedResults {
        let (books, papers) = tokio::join!(
            self.search_books(query, max_results),
            self.search_papers(query, max_results)
        );
        CombinedResults { books, papers }
    }

    pub async fn recognize_cover(&self, image: &[u8], mime_type: &str) -> CoverRecognition {
        let Some(covers) = self.covers.as_ref() else {
            return CoverRecognition::fallback();
        };

        match covers.recognize(image, mime_type).await {
            Ok(recognition) => recognition,
            Err(e) => {
                tracing::warn!("Cover recognition failed: {}", e);
                CoverRecognition::fallback()
            }
        }
    }

    /// Recognize a cover, then re-search Google Books with what was read.
    ///
    /// The guess itself is never trusted as a library item.
    pub async fn identify_cover(
        &self,
        image: &[u8],
        mime_type: &str,
        max_results: u32,
    ) -> ScanOutcome {
        let recognition = self.recognize_cover(image, mime_type).await;

        let candidates = match research_query(&recognition) {
            Some(query) => self.search_books(&query, max_results).await,
            None => Vec::new(),
        };

        ScanOutcome {
            recognition,
            candidates,
        }
    }
}

/// Google Books query for a recognized cover; `None` for the placeholder
pub fn research_query(recognition: &CoverRecognition) -> Option<String> {
    if recognition.is_fallback() {
        return None;
    }

    let CoverGuess {
        title, author, isbn, ..
    } = recognition.guess();

    if let Some(isbn) = isbn {
        let digits: String = isbn
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == 'X' || *c == 'x')
            .collect();
        if digits.len() == 10 || digits.len() == 13 {
            return Some(format!("isbn:{}", digits));
        }
    }

    let mut terms = Vec::new();
    if let Some(title) = title {
        terms.push(format!("intitle:\"{}\"", title));
    }
    if let Some(author) = author {
        terms.push(format!("inauthor:\"{}\"", author));
    }

    (!terms.is_empty()).then(|| terms.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::gemini::Confidence;
    use crate::sources::traits::SourceError;
    use async_trait::async_trait;

    const META: SourceMetadata = SourceMetadata {
        id: "stub",
        name: "Stub",
        description: "",
        base_url: "",
        requires_api_key: false,
    };

    struct FailingBooks;

    #[async_trait]
    impl BookSearch for FailingBooks {
        fn metadata(&self) -> SourceMetadata {
            META
        }

        async fn search_books(&self, _: &str, _: u32) -> std::result::Result<Vec<LibraryItem>, SourceError> {
            Err(SourceError::RateLimit)
        }
    }

    struct EchoPapers;

    #[async_trait]
    impl PaperSearch for EchoPapers {
        fn metadata(&self) -> SourceMetadata {
            META
        }

        async fn search_papers(&self, query: &str, _: u32) -> std::result::Result<Vec<LibraryItem>, SourceError> {
            Ok(vec![LibraryItem::new(query)])
        }
    }

    struct BrokenRecognizer;

    #[async_trait]
    impl CoverRecognizer for BrokenRecognizer {
        fn metadata(&self) -> SourceMetadata {
            META
        }

        async fn recognize(&self, _: &[u8], _: &str) -> std::result::Result<CoverRecognition, SourceError> {
            Err(SourceError::Parse("garbled".to_string()))
        }
    }

    fn catalog(covers: Option<Arc<dyn CoverRecognizer>>) -> Catalog {
        Catalog::new(Arc::new(FailingBooks), Arc::new(EchoPapers), covers)
    }

    #[tokio::test]
    async fn test_failures_degrade_to_empty() {
        let results = catalog(None).search_all("graphs", 10).await;
        assert!(results.books.is_empty());
        assert_eq!(results.papers.len(), 1);
    }

    #[tokio::test]
    async fn test_recognition_failure_is_placeholder() {
        let catalog = catalog(Some(Arc::new(BrokenRecognizer)));
        let outcome = catalog.identify_cover(b"jpeg", "image/jpeg", 5).await;
        assert!(outcome.recognition.is_fallback());
        assert!(outcome.candidates.is_empty());
    }

    #[tokio::test]
    async fn test_recognition_disabled_is_placeholder() {
        let recognition = catalog(None).recognize_cover(b"png", "image/png").await;
        assert_eq!(recognition, CoverRecognition::fallback());
    }

    #[test]
    fn test_research_query_prefers_isbn() {
        let guess = CoverGuess {
            title: Some("Dune".to_string()),
            isbn: Some("978-0-441-01359-3".to_string()),
            confidence: Confidence::High,
            ..Default::default()
        };
        assert_eq!(
            research_query(&CoverRecognition::Parsed(guess)).as_deref(),
            Some("isbn:9780441013593")
        );
    }

    #[test]
    fn test_research_query_title_author() {
        let guess = CoverGuess {
            title: Some("Emma".to_string()),
            author: Some("Jane Austen".to_string()),
            isbn: Some("12".to_string()),
            ..Default::default()
        };
        assert_eq!(
            research_query(&CoverRecognition::PartiallyParsed(guess)).as_deref(),
            Some("intitle:\"Emma\" inauthor:\"Jane Austen\"")
        );
        assert_eq!(research_query(&CoverRecognition::fallback()), None);
    }
}
