//! Predicate filter and free-text search integration tests

mod common;

use common::fixtures::sample_library;
use proptest::prelude::*;
use rstest::rstest;
use shelf_core::{
    apply_filter, filter_items, search_items, FilterConfig, ItemType, LibraryItem, SearchOutcome,
    SearchView,
};

fn ids(items: &[&LibraryItem]) -> Vec<String> {
    items.iter().map(|item| item.id.to_string()).collect()
}

// === Predicate filter over the sample library ===

#[rstest]
#[case::all_sentinels(&[("type", "all"), ("status", "all"), ("rating", "all")], &["1", "2", "b7c1", "b7c2", "b7c3"])]
#[case::type_book(&[("type", "book")], &["1", "b7c1"])]
#[case::status_read(&[("status", "read")], &["2", "b7c1", "b7c3"])]
#[case::rating_threshold(&[("rating", "4")], &["1", "2", "b7c1"])]
#[case::rating_fractional(&[("rating", "4.6")], &["1"])]
#[case::difficulty_easy(&[("difficulty", "easy")], &["1", "2", "b7c3"])]
#[case::difficulty_medium(&[("difficulty", "medium")], &["b7c2"])]
#[case::difficulty_hard(&[("difficulty", "hard")], &[])]
#[case::language(&[("language", "fr")], &["b7c1"])]
#[case::category(&[("category", "Fiction")], &["b7c1"])]
#[case::conjunction(&[("type", "book"), ("language", "en")], &["1"])]
#[case::malformed_rating(&[("rating", "abc")], &[])]
#[case::unknown_type(&[("type", "magazine")], &[])]
#[case::unknown_bucket(&[("difficulty", "brutal")], &[])]
fn test_filter_sample_library(#[case] pairs: &[(&str, &str)], #[case] expected: &[&str]) {
    let items = sample_library();
    let config = FilterConfig::from_pairs(pairs.iter().copied());
    assert_eq!(ids(&apply_filter(&items, &config)), expected);
}

#[test]
fn test_unrated_item_never_passes_threshold() {
    let items = sample_library();
    let config = FilterConfig::from_pairs([("rating", "0")]);
    let kept = apply_filter(&items, &config);
    assert!(kept.iter().all(|item| item.rating.is_some()));
    assert!(!ids(&kept).contains(&"b7c2".to_string()));
}

// === Free-text search ===

#[rstest]
#[case::author("HOFSTADTER", &["1"])]
#[case::type_name("book", &["1", "b7c1"])]
#[case::category("machine", &["2"])]
#[case::accented_author("saint-exupéry", &["b7c1"])]
#[case::no_match("zzz", &[])]
fn test_search_sample_library(#[case] query: &str, #[case] expected: &[&str]) {
    let items = sample_library();
    let outcome = search_items(&items, query, SearchView::Library);
    assert_eq!(ids(outcome.items()), expected);
}

#[test]
fn test_empty_query_per_view() {
    let items = sample_library();
    assert_eq!(search_items(&items, "", SearchView::Library).len(), items.len());
    assert_eq!(
        search_items(&items, "  ", SearchView::Overlay),
        SearchOutcome::NoHighlight
    );
}

#[test]
fn test_search_ignores_filter_fields() {
    // Status and language are not searchable
    let items = sample_library();
    assert!(search_items(&items, "to-read", SearchView::Library).is_empty());
}

// === Properties ===

fn arb_item() -> impl Strategy<Value = LibraryItem> {
    (
        "[a-zA-Z ]{1,20}",
        proptest::option::of(0usize..4),
        proptest::option::of(prop_oneof![Just("read"), Just("reading"), Just("to-read")]),
        proptest::option::of(0.0f64..=5.0),
        proptest::option::of(1u8..=5),
        proptest::option::of(prop_oneof![Just("en"), Just("fr"), Just("de")]),
    )
        .prop_map(|(title, kind, status, rating, difficulty, language)| LibraryItem {
            title,
            item_type: kind.map(|k| ItemType::ALL[k]),
            status: status.map(str::to_string),
            rating,
            difficulty,
            language: language.map(str::to_string),
            ..Default::default()
        })
}

fn arb_config() -> impl Strategy<Value = FilterConfig> {
    (
        prop_oneof![Just("all"), Just("book"), Just("paper"), Just("video")],
        prop_oneof![Just("all"), Just("read"), Just("reading")],
        prop_oneof![Just("all"), Just("2.5"), Just("4"), Just("x")],
        prop_oneof![Just("all"), Just("easy"), Just("medium"), Just("hard")],
        prop_oneof![Just("all"), Just("en"), Just("fr")],
    )
        .prop_map(|(t, s, r, d, l)| {
            FilterConfig::from_pairs([
                ("type", t),
                ("status", s),
                ("rating", r),
                ("difficulty", d),
                ("language", l),
            ])
        })
}

proptest! {
    #[test]
    fn prop_all_filter_is_identity(items in prop::collection::vec(arb_item(), 0..30)) {
        let config = FilterConfig::from_pairs([
            ("type", "all"), ("status", "all"), ("rating", "all"),
            ("difficulty", "all"), ("language", "all"), ("category", "all"),
        ]);
        prop_assert!(config.is_all());
        prop_assert_eq!(filter_items(&items, &config), items);
    }

    #[test]
    fn prop_rating_threshold(
        items in prop::collection::vec(arb_item(), 0..30),
        threshold in 0.0f64..=5.0,
    ) {
        let raw = threshold.to_string();
        let config = FilterConfig::from_pairs([("rating", raw.as_str())]);
        let kept = filter_items(&items, &config);
        let expected: Vec<LibraryItem> = items
            .iter()
            .filter(|item| item.rating.is_some_and(|r| r >= threshold))
            .cloned()
            .collect();
        prop_assert_eq!(kept, expected);
    }

    #[test]
    fn prop_filter_is_idempotent(
        items in prop::collection::vec(arb_item(), 0..30),
        config in arb_config(),
    ) {
        let once = filter_items(&items, &config);
        let twice = filter_items(&once, &config);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_search_is_case_insensitive(
        items in prop::collection::vec(arb_item(), 0..30),
        query in "[a-zA-Z]{1,3}",
    ) {
        let lower = search_items(&items, &query.to_lowercase(), SearchView::Library);
        let upper = search_items(&items, &query.to_uppercase(), SearchView::Library);
        prop_assert_eq!(ids(lower.items()), ids(upper.items()));
    }
}
