//! Test fixture loading utilities

use std::path::PathBuf;

use shelf_core::LibraryItem;

/// Get the path to a fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_fixtures")
        .join(name)
}

/// Load a fixture file as a string
#[allow(dead_code)]
pub fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name))
        .unwrap_or_else(|_| panic!("Failed to load fixture: {}", name))
}

/// Load a captured provider response
#[allow(dead_code)]
pub fn load_response_fixture(name: &str) -> String {
    load_fixture(&format!("responses/{}", name))
}

/// The sample library: five items, one of each type plus an extra book
#[allow(dead_code)]
pub fn sample_library() -> Vec<LibraryItem> {
    serde_json::from_str(&load_fixture("library.json")).expect("library.json is valid")
}
