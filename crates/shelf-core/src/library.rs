//! In-memory ordered item collection

use chrono::Utc;
use shelf_domain::{ensure_valid, ItemId, LibraryItem};
use std::collections::HashSet;

use crate::error::{Result, ShelfError, StoreError};
use crate::filter::{apply_filter, FilterConfig};
use crate::search::{search_items, SearchOutcome, SearchView};

/// Ordered collection of library items with unique ids
#[derive(Debug, Clone, Default)]
pub struct Library {
    items: Vec<LibraryItem>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection. Later duplicates of an id are dropped.
    pub fn load(&mut self, items: Vec<LibraryItem>) {
        let mut seen = HashSet::new();
        let before = items.len();
        self.items = items
            .into_iter()
            .filter(|item| seen.insert(item.id.clone()))
            .collect();

        if self.items.len() != before {
            tracing::warn!(
                dropped = before - self.items.len(),
                "Dropped items with duplicate ids on load"
            );
        }
    }

    pub fn items(&self) -> &[LibraryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &ItemId) -> Option<&LibraryItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.get(id).is_some()
    }

    /// Validate and stamp an item so it is ready to be admitted.
    ///
    /// Rejects an id already present. An unassigned id is left for the
    /// store to fill in.
    pub fn prepare_new(&self, mut item: LibraryItem) -> Result<LibraryItem> {
        ensure_valid(&item)?;

        if !item.id.is_unassigned() && self.contains(&item.id) {
            return Err(StoreError::Duplicate(item.id.to_string()).into());
        }

        item.touch_created(Utc::now());
        Ok(item)
    }

    /// Admit a new item at the end of the collection
    pub fn add(&mut self, item: LibraryItem) -> Result<&LibraryItem> {
        let mut item = self.prepare_new(item)?;
        if item.id.is_unassigned() {
            item.id = ItemId::generate();
        }
        self.push_prepared(item);
        Ok(&self.items[self.items.len() - 1])
    }

    /// Append an item already prepared (and possibly persisted)
    pub fn push_prepared(&mut self, item: LibraryItem) {
        if let Some(existing) = self.items.iter_mut().find(|i| i.id == item.id) {
            *existing = item;
        } else {
            self.items.push(item);
        }
    }

    /// Validate an edit against the current item, keeping id and `dateAdded`
    pub fn prepare_update(&self, id: &ItemId, mut item: LibraryItem) -> Result<LibraryItem> {
        ensure_valid(&item)?;

        let current = self
            .get(id)
            .ok_or_else(|| ShelfError::NotFound(format!("item {}", id)))?;

        item.id = current.id.clone();
        item.date_added = current.date_added;
        item.touch_modified(Utc::now());
        Ok(item)
    }

    /// Edit an item in place; its position does not change
    pub fn update(&mut self, id: &ItemId, item: LibraryItem) -> Result<&LibraryItem> {
        let item = self.prepare_update(id, item)?;
        self.replace(item)
    }

    /// Swap in an already prepared version of an existing item
    pub fn replace(&mut self, item: LibraryItem) -> Result<&LibraryItem> {
        let slot = self
            .items
            .iter_mut()
            .find(|i| i.id == item.id)
            .ok_or_else(|| ShelfError::NotFound(format!("item {}", item.id)))?;
        *slot = item;
        Ok(&*slot)
    }

    /// Remove exactly the item with this id; the rest keep their order
    pub fn remove(&mut self, id: &ItemId) -> Option<LibraryItem> {
        let index = self.items.iter().position(|item| &item.id == id)?;
        Some(self.items.remove(index))
    }

    pub fn filtered(&self, config: &FilterConfig) -> Vec<&LibraryItem> {
        apply_filter(&self.items, config)
    }

    pub fn search(&self, query: &str, view: SearchView) -> SearchOutcome<'_> {
        search_items(&self.items, query, view)
    }
}
