//! Predicate filter for library items.
//!
//! A [`FilterConfig`] holds one constraint per filterable field. The literal
//! `"all"` disables a predicate; every enabled predicate must pass (AND).
//!
//! # Fields
//!
//! ```text
//! type=book status=reading rating=4 difficulty=easy language=en category=Physics
//! ```
//!
//! - `rating` is a minimum threshold; items without a rating never pass
//! - `difficulty` is a bucket name: `easy` (1–3), `medium` (4–7), `hard` (8–10)
//! - everything else is exact equality; a missing field never matches
//!
//! Malformed values (non-numeric rating, unknown bucket or type) never raise:
//! the predicate simply matches nothing.

use serde::{Deserialize, Serialize};
use shelf_domain::{ItemType, LibraryItem};

/// Sentinel that disables a predicate
pub const ALL: &str = "all";

/// One field's constraint
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Constraint<T> {
    /// Predicate disabled
    #[default]
    All,
    /// Concrete value the field must satisfy
    Is(T),
    /// Value that could not be interpreted; matches no item
    Invalid(String),
}

impl<T> Constraint<T> {
    pub fn is_all(&self) -> bool {
        matches!(self, Constraint::All)
    }

    /// Interpret a raw value with `parse`, honouring the `"all"` sentinel
    fn from_raw(raw: Option<&str>, parse: impl FnOnce(&str) -> Option<T>) -> Self {
        match raw.map(str::trim) {
            None | Some("") | Some(ALL) => Constraint::All,
            Some(value) => match parse(value) {
                Some(parsed) => Constraint::Is(parsed),
                None => Constraint::Invalid(value.to_string()),
            },
        }
    }

    /// Evaluate against an item field; `None` never satisfies a concrete value
    fn check<V>(&self, value: Option<V>, pred: impl FnOnce(&T, V) -> bool) -> bool {
        match self {
            Constraint::All => true,
            Constraint::Invalid(_) => false,
            Constraint::Is(expected) => value.is_some_and(|v| pred(expected, v)),
        }
    }
}

/// Difficulty bucket.
///
/// The ranges span 1–10 while item difficulty is validated to 1–5, so
/// `Medium` only ever sees 4–5 and `Hard` never matches. Kept as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyBucket {
    Easy,
    Medium,
    Hard,
}

impl DifficultyBucket {
    /// Inclusive difficulty range covered by the bucket
    pub fn range(&self) -> (u8, u8) {
        match self {
            DifficultyBucket::Easy => (1, 3),
            DifficultyBucket::Medium => (4, 7),
            DifficultyBucket::Hard => (8, 10),
        }
    }

    pub fn contains(&self, difficulty: u8) -> bool {
        let (lo, hi) = self.range();
        (lo..=hi).contains(&difficulty)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_lowercase().as_str() {
            "easy" => Some(DifficultyBucket::Easy),
            "medium" => Some(DifficultyBucket::Medium),
            "hard" => Some(DifficultyBucket::Hard),
            _ => None,
        }
    }
}

/// Raw filter values as they arrive from a query string or UI selects
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterParams {
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub status: Option<String>,
    pub rating: Option<String>,
    pub difficulty: Option<String>,
    pub language: Option<String>,
    pub category: Option<String>,
}

/// Active predicate values, one per filterable field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterConfig {
    pub item_type: Constraint<ItemType>,
    pub status: Constraint<String>,
    pub rating: Constraint<f64>,
    pub difficulty: Constraint<DifficultyBucket>,
    pub language: Constraint<String>,
    pub category: Constraint<String>,
}

impl FilterConfig {
    /// Configuration with every predicate disabled
    pub fn all() -> Self {
        Self::default()
    }

    pub fn from_params(params: &FilterParams) -> Self {
        Self {
            item_type: Constraint::from_raw(params.item_type.as_deref(), ItemType::parse),
            status: Constraint::from_raw(params.status.as_deref(), |s| Some(s.to_string())),
            rating: Constraint::from_raw(params.rating.as_deref(), |s| {
                s.parse::<f64>().ok().filter(|t| t.is_finite())
            }),
            difficulty: Constraint::from_raw(params.difficulty.as_deref(), DifficultyBucket::parse),
            language: Constraint::from_raw(params.language.as_deref(), |s| Some(s.to_string())),
            category: Constraint::from_raw(params.category.as_deref(), |s| Some(s.to_string())),
        }
    }

    /// Build from `(key, value)` pairs; unknown keys are ignored
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut params = FilterParams::default();
        for (key, value) in pairs {
            let slot = match key {
                "type" => &mut params.item_type,
                "status" => &mut params.status,
                "rating" => &mut params.rating,
                "difficulty" => &mut params.difficulty,
                "language" => &mut params.language,
                "category" => &mut params.category,
                _ => continue,
            };
            *slot = Some(value.to_string());
        }
        Self::from_params(&params)
    }

    /// Whether every predicate is disabled (matches everything)
    pub fn is_all(&self) -> bool {
        self.item_type.is_all()
            && self.status.is_all()
            && self.rating.is_all()
            && self.difficulty.is_all()
            && self.language.is_all()
            && self.category.is_all()
    }

    /// Whether one item satisfies every active predicate
    pub fn matches(&self, item: &LibraryItem) -> bool {
        self.item_type.check(item.item_type, |t, v| *t == v)
            && self.status.check(item.status.as_deref(), |s, v| s == v)
            && self.rating.check(item.rating, |t, v| v >= *t)
            && self.difficulty.check(item.difficulty, |b, v| b.contains(v))
            && self.language.check(item.language.as_deref(), |s, v| s == v)
            && self.category.check(item.category.as_deref(), |s, v| s == v)
    }
}

/// Narrow a collection, preserving relative order
pub fn apply_filter<'a>(items: &'a [LibraryItem], config: &FilterConfig) -> Vec<&'a LibraryItem> {
    items.iter().filter(|item| config.matches(item)).collect()
}

/// Owned variant of [`apply_filter`]
pub fn filter_items(items: &[LibraryItem], config: &FilterConfig) -> Vec<LibraryItem> {
    apply_filter(items, config).into_iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<LibraryItem> {
        vec![
            LibraryItem::new("Attention Is All You Need")
                .with_id("p1")
                .with_type(ItemType::Paper)
                .with_rating(4.5)
                .with_difficulty(4)
                .with_language("en"),
            LibraryItem::new("Dune")
                .with_id("b1")
                .with_type(ItemType::Book)
                .with_status("read")
                .with_rating(3.0)
                .with_difficulty(2),
            LibraryItem::new("Untitled report")
                .with_id("r1")
                .with_type(ItemType::Report),
        ]
    }

    fn titles(items: &[&LibraryItem]) -> Vec<String> {
        items.iter().map(|i| i.title.clone()).collect()
    }

    #[test]
    fn parse_all_sentinel() {
        let config = FilterConfig::from_pairs([("type", "all"), ("rating", "all")]);
        assert!(config.is_all());
    }

    #[test]
    fn filter_by_type() {
        let items = sample();
        let config = FilterConfig::from_pairs([("type", "book")]);
        assert_eq!(titles(&apply_filter(&items, &config)), vec!["Dune"]);
    }

    #[test]
    fn rating_threshold_excludes_unrated() {
        let items = sample();
        let config = FilterConfig::from_pairs([("rating", "3")]);
        let result = apply_filter(&items, &config);
        assert_eq!(titles(&result), vec!["Attention Is All You Need", "Dune"]);
    }

    #[test]
    fn difficulty_buckets() {
        let items = sample();
        let easy = FilterConfig::from_pairs([("difficulty", "easy")]);
        assert_eq!(titles(&apply_filter(&items, &easy)), vec!["Dune"]);

        let medium = FilterConfig::from_pairs([("difficulty", "medium")]);
        assert_eq!(
            titles(&apply_filter(&items, &medium)),
            vec!["Attention Is All You Need"]
        );

        let hard = FilterConfig::from_pairs([("difficulty", "hard")]);
        assert!(apply_filter(&items, &hard).is_empty());
    }

    #[test]
    fn missing_field_never_matches() {
        let items = sample();
        let config = FilterConfig::from_pairs([("status", "read")]);
        assert_eq!(titles(&apply_filter(&items, &config)), vec!["Dune"]);
    }

    #[test]
    fn malformed_values_match_nothing() {
        let items = sample();
        for (key, value) in [("rating", "lots"), ("difficulty", "brutal"), ("type", "thesis")] {
            let config = FilterConfig::from_pairs([(key, value)]);
            assert!(!config.is_all());
            assert!(apply_filter(&items, &config).is_empty());
        }

        let config = FilterConfig::from_pairs([("rating", "lots")]);
        assert_eq!(config.rating, Constraint::Invalid("lots".to_string()));
    }

    #[test]
    fn conjunction_of_predicates() {
        let items = sample();
        let config = FilterConfig::from_pairs([("type", "paper"), ("language", "de")]);
        assert!(apply_filter(&items, &config).is_empty());

        let config = FilterConfig::from_pairs([("type", "paper"), ("language", "en")]);
        assert_eq!(apply_filter(&items, &config).len(), 1);
    }

    #[test]
    fn filter_items_does_not_mutate_input() {
        let items = sample();
        let before = items.clone();
        let _ = filter_items(&items, &FilterConfig::from_pairs([("type", "book")]));
        assert_eq!(items, before);
    }
}
