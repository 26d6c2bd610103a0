//! Shelf Core
//!
//! Core library for the imshelf personal library:
//! - Predicate filter and free-text search over library items
//! - In-memory library and explicit per-session state
//! - Source adapters for Google Books, Google Scholar, Semantic Scholar and
//!   Gemini cover recognition, each normalized through a mapping table
//! - Item stores (local SQLite, hosted row store) and identity verification
//! - Debounced live search with stale-result discarding

pub mod auth;
pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod library;
pub mod live;
pub mod search;
pub mod session;
pub mod sources;
pub mod store;

pub use auth::Identity;
pub use config::ShelfConfig;
pub use error::{Result, ShelfError};
pub use filter::{apply_filter, filter_items, Constraint, DifficultyBucket, FilterConfig};
pub use library::Library;
pub use live::{LiveResult, LiveSearch};
pub use search::{search_items, SearchOutcome, SearchView};
pub use session::LibrarySession;
pub use sources::{Catalog, CoverRecognition, ScanOutcome};
pub use store::{ItemStore, LocalStore, SupabaseStore};

pub use shelf_domain::{ItemId, ItemType, LibraryItem};
