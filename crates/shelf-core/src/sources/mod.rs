//! External sources
//!
//! Each provider response is normalized into a [`LibraryItem`](shelf_domain::LibraryItem)
//! through a declarative [`SourceMapping`] table.

pub mod catalog;
pub mod gemini;
pub mod google_books;
pub mod mapping;
pub mod scholar;
pub mod semantic_scholar;
pub mod traits;

pub use catalog::{research_query, Catalog, CombinedResults, ScanOutcome};
pub use gemini::{parse_recognition, Confidence, CoverGuess, CoverRecognition, GeminiRecognizer};
pub use google_books::GoogleBooksSource;
pub use mapping::{apply_mapping, apply_mapping_all, SourceMapping};
pub use scholar::ScholarSource;
pub use semantic_scholar::SemanticScholarSource;
pub use traits::*;
