//! Per-session library state
//!
//! One `LibrarySession` per signed-in user (or per local client) holds the
//! loaded items, the active filter and the store those items persist to.
//! Every change is validated first, then persisted, then applied in memory,
//! so a store failure leaves the in-memory library untouched.

use std::sync::Arc;

use shelf_domain::{ItemId, LibraryItem};

use crate::auth::Identity;
use crate::error::{Result, ShelfError};
use crate::filter::{filter_items, FilterConfig};
use crate::library::Library;
use crate::search::{search_items, SearchOutcome, SearchView};
use crate::store::ItemStore;

pub struct LibrarySession {
    library: Library,
    filter: FilterConfig,
    identity: Option<Identity>,
    store: Arc<dyn ItemStore>,
}

impl LibrarySession {
    pub fn new(store: Arc<dyn ItemStore>, identity: Option<Identity>) -> Self {
        Self {
            library: Library::new(),
            filter: FilterConfig::all(),
            identity,
            store,
        }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn filter(&self) -> &FilterConfig {
        &self.filter
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Replace the in-memory library with the store's contents
    pub async fn load(&mut self) -> Result<usize> {
        let items = self.store.get_all().await?;
        self.library.load(items);
        tracing::info!(
            backend = self.store.backend(),
            count = self.library.len(),
            "Loaded library"
        );
        Ok(self.library.len())
    }

    pub async fn add(&mut self, item: LibraryItem) -> Result<LibraryItem> {
        let prepared = self.library.prepare_new(item)?;
        let stored = self.store.insert(&prepared).await?;
        self.library.push_prepared(stored.clone());
        Ok(stored)
    }

    pub async fn update(&mut self, id: &ItemId, item: LibraryItem) -> Result<LibraryItem> {
        let prepared = self.library.prepare_update(id, item)?;
        let stored = self.store.update(id, &prepared).await?;
        self.library.replace(stored.clone())?;
        Ok(stored)
    }

    pub async fn remove(&mut self, id: &ItemId) -> Result<LibraryItem> {
        if !self.library.contains(id) {
            return Err(ShelfError::NotFound(format!("item {}", id)));
        }

        self.store.delete(id).await?;
        self.library
            .remove(id)
            .ok_or_else(|| ShelfError::NotFound(format!("item {}", id)))
    }

    pub fn set_filter(&mut self, filter: FilterConfig) {
        self.filter = filter;
    }

    /// Items passing the active filter, in collection order
    pub fn visible_items(&self) -> Vec<&LibraryItem> {
        self.library.filtered(&self.filter)
    }

    /// Free-text search over the whole library, ignoring the filter
    pub fn search(&self, query: &str, view: SearchView) -> SearchOutcome<'_> {
        self.library.search(query, view)
    }

    /// Filter, then search within what is visible.
    ///
    /// `None` means nothing to highlight (overlay view, empty query).
    pub fn visible_matches(&self, query: &str, view: SearchView) -> Option<Vec<LibraryItem>> {
        let visible = filter_items(self.library.items(), &self.filter);
        match search_items(&visible, query, view) {
            SearchOutcome::Matches(items) => Some(items.into_iter().cloned().collect()),
            SearchOutcome::NoHighlight => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::LocalStore;
    use async_trait::async_trait;
    use shelf_domain::ItemType;

    struct DownStore;

    #[async_trait]
    impl ItemStore for DownStore {
        fn backend(&self) -> &'static str {
            "down"
        }

        async fn get_all(&self) -> std::result::Result<Vec<LibraryItem>, StoreError> {
            Ok(Vec::new())
        }

        async fn insert(&self, _: &LibraryItem) -> std::result::Result<LibraryItem, StoreError> {
            Err(StoreError::Remote {
                status: 503,
                message: "unavailable".to_string(),
            })
        }

        async fn update(
            &self,
            id: &ItemId,
            _: &LibraryItem,
        ) -> std::result::Result<LibraryItem, StoreError> {
            Err(StoreError::NotFound(id.to_string()))
        }

        async fn delete(&self, id: &ItemId) -> std::result::Result<(), StoreError> {
            Err(StoreError::NotFound(id.to_string()))
        }
    }

    /// Hands out integer keys like a hosted table with an identity column
    #[derive(Default)]
    struct SerialStore {
        received: std::sync::Mutex<Vec<ItemId>>,
    }

    #[async_trait]
    impl ItemStore for SerialStore {
        fn backend(&self) -> &'static str {
            "serial"
        }

        async fn get_all(&self) -> std::result::Result<Vec<LibraryItem>, StoreError> {
            Ok(Vec::new())
        }

        async fn insert(&self, item: &LibraryItem) -> std::result::Result<LibraryItem, StoreError> {
            let mut received = self.received.lock().unwrap();
            received.push(item.id.clone());
            let mut stored = item.clone();
            stored.id = ItemId::Int(received.len() as i64);
            Ok(stored)
        }

        async fn update(
            &self,
            _: &ItemId,
            item: &LibraryItem,
        ) -> std::result::Result<LibraryItem, StoreError> {
            Ok(item.clone())
        }

        async fn delete(&self, _: &ItemId) -> std::result::Result<(), StoreError> {
            Ok(())
        }
    }

    fn local_session() -> LibrarySession {
        LibrarySession::new(Arc::new(LocalStore::in_memory().unwrap()), None)
    }

    #[tokio::test]
    async fn test_add_persists_and_reloads() {
        let mut session = local_session();
        let added = session
            .add(LibraryItem::new("Dune").with_type(ItemType::Book))
            .await
            .unwrap();
        assert!(added.date_added.is_some());

        session.load().await.unwrap();
        assert_eq!(session.library().len(), 1);
        assert_eq!(session.library().items()[0].id, added.id);
    }

    #[tokio::test]
    async fn test_store_assigns_id_for_new_items() {
        let store = Arc::new(SerialStore::default());
        let mut session = LibrarySession::new(store.clone(), None);

        let first = session.add(LibraryItem::new("Dune")).await.unwrap();
        let second = session.add(LibraryItem::new("Emma")).await.unwrap();
        assert_eq!(first.id, ItemId::Int(1));
        assert_eq!(second.id, ItemId::Int(2));
        assert!(store.received.lock().unwrap().iter().all(ItemId::is_unassigned));
        assert_eq!(session.library().items()[1].id, ItemId::Int(2));
    }

    #[tokio::test]
    async fn test_invalid_item_never_reaches_store() {
        let mut session = LibrarySession::new(Arc::new(DownStore), None);
        let result = session.add(LibraryItem::new("  ")).await;
        assert!(matches!(result, Err(ShelfError::Validation(_))));
    }

    #[tokio::test]
    async fn test_store_failure_leaves_library_untouched() {
        let mut session = LibrarySession::new(Arc::new(DownStore), None);
        let result = session.add(LibraryItem::new("Dune")).await;
        assert!(matches!(result, Err(ShelfError::Store(StoreError::Remote { .. }))));
        assert!(session.library().is_empty());
    }

    #[tokio::test]
    async fn test_update_keeps_position_and_date_added() {
        let mut session = local_session();
        let first = session.add(LibraryItem::new("One")).await.unwrap();
        session.add(LibraryItem::new("Two")).await.unwrap();

        let updated = session
            .update(&first.id, LibraryItem::new("One, revised"))
            .await
            .unwrap();
        assert_eq!(updated.date_added, first.date_added);
        assert_eq!(session.library().items()[0].title, "One, revised");
    }

    #[tokio::test]
    async fn test_remove_unknown_id() {
        let mut session = local_session();
        let result = session.remove(&ItemId::Int(404)).await;
        assert!(matches!(result, Err(ShelfError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_filter_then_search() {
        let mut session = local_session();
        session
            .add(LibraryItem::new("Dune").with_type(ItemType::Book))
            .await
            .unwrap();
        session
            .add(LibraryItem::new("Dune ecology").with_type(ItemType::Paper))
            .await
            .unwrap();

        session.set_filter(FilterConfig::from_pairs([("type", "paper")]));
        assert_eq!(session.visible_items().len(), 1);

        let matches = session.visible_matches("dune", SearchView::Library).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].title, "Dune ecology");
        assert!(session.visible_matches(" ", SearchView::Overlay).is_none());
        assert_eq!(session.search("DUNE", SearchView::Library).len(), 2);
    }
}
