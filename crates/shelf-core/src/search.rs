//! Free-text search over library items
//!
//! Independent of the predicate filter: a lowercase substring match against
//! title, author, category and type. The two call sites treat an empty query
//! differently, see [`SearchView`].

use serde::{Deserialize, Serialize};
use shelf_domain::LibraryItem;

/// Where the search box lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchView {
    /// Library view: an empty query shows the whole collection
    #[default]
    Library,
    /// Overlay on the planet view: an empty query clears highlighting
    Overlay,
}

/// Result of a free-text search
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome<'a> {
    /// Items that matched, in collection order
    Matches(Vec<&'a LibraryItem>),
    /// Nothing to highlight (overlay view, empty query)
    NoHighlight,
}

impl<'a> SearchOutcome<'a> {
    /// Matched items, empty for `NoHighlight`
    pub fn items(&self) -> &[&'a LibraryItem] {
        match self {
            SearchOutcome::Matches(items) => items,
            SearchOutcome::NoHighlight => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }
}

/// Whether an item matches an already-lowercased needle
pub fn item_matches(item: &LibraryItem, needle: &str) -> bool {
    let contains = |field: &str| field.to_lowercase().contains(needle);

    contains(&item.title)
        || item.author.as_deref().is_some_and(contains)
        || item.category.as_deref().is_some_and(contains)
        || item.item_type.is_some_and(|t| contains(t.as_str()))
}

/// Search a collection
pub fn search_items<'a>(items: &'a [LibraryItem], query: &str, view: SearchView) -> SearchOutcome<'a> {
    if query.trim().is_empty() {
        return match view {
            SearchView::Library => SearchOutcome::Matches(items.iter().collect()),
            SearchView::Overlay => SearchOutcome::NoHighlight,
        };
    }

    let needle = query.to_lowercase();
    SearchOutcome::Matches(items.iter().filter(|item| item_matches(item, &needle)).collect())
}
