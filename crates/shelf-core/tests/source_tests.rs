//! Provider normalization tests against captured responses

mod common;

use common::fixtures::load_response_fixture;
use shelf_core::sources::{
    parse_recognition, research_query, Confidence, CoverRecognition, GoogleBooksSource,
    ScholarSource, SemanticScholarSource,
};
use shelf_core::ItemType;

// === Google Books ===

#[test]
fn test_google_books_fixture() {
    let json = load_response_fixture("google_books_search.json");
    let items = GoogleBooksSource::parse_search_response(&json).unwrap();

    // The untitled volume is dropped
    assert_eq!(items.len(), 2);

    let pragmatic = &items[0];
    assert_eq!(pragmatic.title, "The Pragmatic Programmer");
    assert_eq!(pragmatic.author.as_deref(), Some("David Thomas, Andrew Hunt"));
    assert_eq!(pragmatic.publishing_year, Some(2019));
    assert_eq!(pragmatic.pages, Some(352));
    assert_eq!(pragmatic.category.as_deref(), Some("Computers"));
    assert_eq!(pragmatic.language.as_deref(), Some("en"));
    assert_eq!(pragmatic.item_type, Some(ItemType::Book));
    assert_eq!(
        pragmatic.cover_url.as_deref(),
        Some("https://books.google.com/books/content?id=nOA5DwAAQBAJ&zoom=1")
    );
}

#[test]
fn test_google_books_prefers_isbn_13() {
    let json = load_response_fixture("google_books_search.json");
    let items = GoogleBooksSource::parse_search_response(&json).unwrap();

    assert_eq!(items[0].isbn.as_deref(), Some("9780135956977"));
    // Only an ISBN_10 (and a non-ISBN identifier) available
    assert_eq!(items[1].isbn.as_deref(), Some("0262510871"));
    assert_eq!(items[1].publishing_year, Some(1996));
    assert_eq!(items[1].pages, None);
}

// === Scholar ===

#[test]
fn test_scholar_fixture() {
    let html = load_response_fixture("scholar_results.html");
    let items = ScholarSource::parse_search_page(&html).unwrap();
    assert_eq!(items.len(), 2);

    let imagenet = &items[0];
    assert_eq!(
        imagenet.author.as_deref(),
        Some("A Krizhevsky, I Sutskever, GE Hinton")
    );
    assert_eq!(imagenet.publishing_year, Some(2017));
    assert_eq!(imagenet.citation_count, Some(150231));
    assert_eq!(imagenet.item_type, Some(ItemType::Paper));

    let deep = &items[1];
    assert_eq!(deep.title, "Deep learning");
    assert_eq!(deep.publishing_year, Some(2015));
    assert_eq!(deep.citation_count, Some(0));
    assert_eq!(
        deep.url.as_deref(),
        Some("https://www.nature.com/articles/nature14539")
    );
}

// === Semantic Scholar ===

#[test]
fn test_semantic_scholar_fixture() {
    let json = load_response_fixture("semantic_scholar_search.json");
    let items = SemanticScholarSource::parse_search_response(&json).unwrap();
    assert_eq!(items.len(), 2);

    assert_eq!(items[0].author.as_deref(), Some("Jacob Devlin, Ming-Wei Chang"));
    assert_eq!(items[0].citation_count, Some(90000));
    assert_eq!(items[0].category.as_deref(), Some("Computer Science"));

    let preprint = &items[1];
    assert_eq!(preprint.author, None);
    assert_eq!(preprint.publishing_year, None);
    assert_eq!(preprint.citation_count, Some(0));
}

// === Gemini cover recognition ===

#[test]
fn test_gemini_json_inside_prose() {
    let text = load_response_fixture("gemini_prose_json.txt");
    let recognition = parse_recognition(&text);

    let CoverRecognition::Parsed(guess) = &recognition else {
        panic!("expected Parsed, got {:?}", recognition);
    };
    assert_eq!(guess.title.as_deref(), Some("The Left Hand of Darkness"));
    assert_eq!(guess.author.as_deref(), Some("Ursula K. Le Guin"));
    assert_eq!(guess.isbn, None);
    assert_eq!(guess.publisher.as_deref(), Some("Ace Books"));
    assert_eq!(guess.year, Some(1969));
    assert_eq!(guess.category.as_deref(), Some("Science Fiction"));
    assert_eq!(guess.confidence, Confidence::High);

    assert_eq!(
        research_query(&recognition).as_deref(),
        Some("intitle:\"The Left Hand of Darkness\" inauthor:\"Ursula K. Le Guin\"")
    );
}

#[test]
fn test_gemini_key_value_lines() {
    let text = load_response_fixture("gemini_key_value.txt");
    let recognition = parse_recognition(&text);

    let CoverRecognition::PartiallyParsed(guess) = &recognition else {
        panic!("expected PartiallyParsed, got {:?}", recognition);
    };
    assert_eq!(guess.title.as_deref(), Some("Middlemarch"));
    assert_eq!(guess.author.as_deref(), Some("George Eliot"));
    assert_eq!(guess.year, Some(1871));
    assert_eq!(guess.confidence, Confidence::Medium);

    let draft = recognition.to_item().unwrap();
    assert_eq!(draft.title, "Middlemarch");
    assert_eq!(draft.item_type, Some(ItemType::Book));
}

#[test]
fn test_gemini_unparseable_is_placeholder() {
    let text = load_response_fixture("gemini_unparseable.txt");
    let recognition = parse_recognition(&text);

    assert_eq!(recognition, CoverRecognition::fallback());
    assert_eq!(recognition.guess().title.as_deref(), Some("Unknown Title"));
    assert_eq!(recognition.guess().confidence, Confidence::Low);
    assert!(recognition.to_item().is_none());
    assert!(research_query(&recognition).is_none());
}
