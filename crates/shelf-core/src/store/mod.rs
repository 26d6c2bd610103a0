//! Item persistence
//!
//! Two backends sit behind [`ItemStore`]: a local SQLite file used when no
//! session is present, and the hosted row store used for signed-in users.

pub mod local;
pub mod schema;
pub mod supabase;

use async_trait::async_trait;
use shelf_domain::{ItemId, LibraryItem};

use crate::error::StoreError;

pub use local::{LocalStore, LOCAL_OWNER};
pub use supabase::{ItemRow, SupabaseStore};

/// Persistence backend for one user's items
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;

    /// All items in insertion order
    async fn get_all(&self) -> Result<Vec<LibraryItem>, StoreError>;

    /// Persist a new item, returning it as stored
    async fn insert(&self, item: &LibraryItem) -> Result<LibraryItem, StoreError>;

    /// Overwrite the item with this id, returning it as stored
    async fn update(&self, id: &ItemId, item: &LibraryItem) -> Result<LibraryItem, StoreError>;

    async fn delete(&self, id: &ItemId) -> Result<(), StoreError>;
}
