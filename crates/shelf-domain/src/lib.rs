//! Domain types for the imshelf personal library
//!
//! This crate provides the one record the whole suite revolves around:
//! - LibraryItem: a book, paper, article or report in a user's collection
//! - ItemId: opaque identity (integer or string)
//! - ItemType: the enumerated item kinds
//! - Validation: entry-point checks applied before an item is admitted

pub mod item;
pub mod validation;

pub use item::*;
pub use validation::*;
