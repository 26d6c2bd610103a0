//! Declarative field mapping from provider records to library items
//!
//! Each source describes its record shape once, as a table of
//! [`FieldRule`]s: which item field to fill, where to find the value in the
//! provider's JSON, and how to convert it. Records are plain
//! `serde_json::Value`s; scraped sources build one before mapping.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use shelf_domain::{ItemType, LibraryItem};

lazy_static! {
    static ref YEAR_RUN: Regex = Regex::new(r"\d{4}").unwrap();
    static ref LEADING_NUMBER: Regex = Regex::new(r"^\s*(\d+)").unwrap();
    static ref COUNT: Regex = Regex::new(r"\d[\d,]*").unwrap();
}

/// Target field on [`LibraryItem`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Title,
    Author,
    Category,
    PublishingYear,
    Pages,
    Language,
    Summary,
    CoverUrl,
    Url,
    Publisher,
    Isbn,
    CitationCount,
}

/// Conversion applied to the raw value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// String (trimmed, non-empty) or number rendered as text
    Text,
    /// Array of strings or `{name}` objects joined with ", "
    JoinList,
    /// First element of an array of strings
    FirstOfList,
    /// Leading numeric component, e.g. `"2004-05-01"` → 2004
    LeadingYear,
    /// First run of four digits anywhere in the text
    FirstYearRun,
    /// Integer, or the first digit group in text (`"Cited by 1,024"` → 1024)
    Count,
    /// Like `Count`, but 0 when absent or unparseable
    CountOrZero,
    /// `[{type, identifier}]` list, ISBN_13 preferred over ISBN_10
    PreferredIsbn,
    /// Text with `http://` upgraded to `https://`
    HttpsUrl,
}

/// One row of a mapping table
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: ItemField,
    pub path: &'static [&'static str],
    pub transform: Transform,
}

impl FieldRule {
    pub const fn new(
        field: ItemField,
        path: &'static [&'static str],
        transform: Transform,
    ) -> Self {
        Self {
            field,
            path,
            transform,
        }
    }
}

/// A source's complete mapping
#[derive(Debug, Clone, Copy)]
pub struct SourceMapping {
    pub source_id: &'static str,
    pub item_type: Option<ItemType>,
    pub rules: &'static [FieldRule],
}

#[derive(Debug, Clone, PartialEq)]
enum FieldValue {
    Text(String),
    Number(i64),
}

/// Follow a key path through nested objects
pub fn lookup<'a>(record: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(record, |value, key| value.get(*key))
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_count(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => COUNT
            .find(s)
            .and_then(|m| m.as_str().replace(',', "").parse().ok()),
        _ => None,
    }
}

/// Pick the ISBN from a Google Books style identifier list
pub fn preferred_isbn(identifiers: &Value) -> Option<String> {
    let list = identifiers.as_array()?;
    let find = |kind: &str| {
        list.iter()
            .find(|entry| entry.get("type").and_then(Value::as_str) == Some(kind))
            .and_then(|entry| entry.get("identifier"))
            .and_then(as_text)
    };
    find("ISBN_13").or_else(|| find("ISBN_10"))
}

fn convert(value: &Value, transform: Transform) -> Option<FieldValue> {
    match transform {
        Transform::Text => as_text(value).map(FieldValue::Text),
        Transform::JoinList => match value {
            Value::Array(entries) => {
                let names: Vec<String> = entries
                    .iter()
                    .filter_map(|entry| match entry {
                        Value::Object(_) => entry.get("name").and_then(as_text),
                        other => as_text(other),
                    })
                    .collect();
                (!names.is_empty()).then(|| FieldValue::Text(names.join(", ")))
            }
            other => as_text(other).map(FieldValue::Text),
        },
        Transform::FirstOfList => match value {
            Value::Array(entries) => entries.iter().find_map(as_text).map(FieldValue::Text),
            other => as_text(other).map(FieldValue::Text),
        },
        Transform::LeadingYear => match value {
            Value::Number(n) => n.as_i64().map(FieldValue::Number),
            Value::String(s) => LEADING_NUMBER
                .captures(s)
                .and_then(|c| c[1].parse().ok())
                .map(FieldValue::Number),
            _ => None,
        },
        Transform::FirstYearRun => match value {
            Value::Number(n) => n.as_i64().map(FieldValue::Number),
            Value::String(s) => YEAR_RUN
                .find(s)
                .and_then(|m| m.as_str().parse().ok())
                .map(FieldValue::Number),
            _ => None,
        },
        Transform::Count => parse_count(value).map(FieldValue::Number),
        Transform::CountOrZero => Some(FieldValue::Number(parse_count(value).unwrap_or(0))),
        Transform::PreferredIsbn => preferred_isbn(value).map(FieldValue::Text),
        Transform::HttpsUrl => as_text(value).map(|url| match url.strip_prefix("http://") {
            Some(rest) => FieldValue::Text(format!("https://{}", rest)),
            None => FieldValue::Text(url),
        }),
    }
}

fn assign(item: &mut LibraryItem, field: ItemField, value: FieldValue) {
    let text = |value: FieldValue| match value {
        FieldValue::Text(s) => s,
        FieldValue::Number(n) => n.to_string(),
    };
    let number = |value: FieldValue| match value {
        FieldValue::Number(n) => Some(n),
        FieldValue::Text(s) => s.trim().parse().ok(),
    };

    match field {
        ItemField::Title => item.title = text(value),
        ItemField::Author => item.author = Some(text(value)),
        ItemField::Category => item.category = Some(text(value)),
        ItemField::Language => item.language = Some(text(value)),
        ItemField::Summary => item.summary = Some(text(value)),
        ItemField::CoverUrl => item.cover_url = Some(text(value)),
        ItemField::Url => item.url = Some(text(value)),
        ItemField::Publisher => item.publisher = Some(text(value)),
        ItemField::Isbn => item.isbn = Some(text(value)),
        ItemField::PublishingYear => {
            item.publishing_year = number(value).and_then(|n| i32::try_from(n).ok())
        }
        ItemField::Pages => item.pages = number(value).and_then(|n| u32::try_from(n).ok()),
        ItemField::CitationCount => {
            item.citation_count = number(value).and_then(|n| u32::try_from(n).ok())
        }
    }
}

/// Map one provider record to an item. Records without a title are dropped.
pub fn apply_mapping(record: &Value, mapping: &SourceMapping) -> Option<LibraryItem> {
    let mut item = LibraryItem {
        item_type: mapping.item_type,
        ..Default::default()
    };

    for rule in mapping.rules {
        let raw = lookup(record, rule.path).unwrap_or(&Value::Null);
        if let Some(value) = convert(raw, rule.transform) {
            assign(&mut item, rule.field, value);
        }
    }

    if item.title.trim().is_empty() {
        tracing::debug!(source = mapping.source_id, "Dropping record without title");
        return None;
    }

    Some(item)
}

/// Map every record, dropping those without a title
pub fn apply_mapping_all<'a>(
    records: impl IntoIterator<Item = &'a Value>,
    mapping: &SourceMapping,
) -> Vec<LibraryItem> {
    records
        .into_iter()
        .filter_map(|record| apply_mapping(record, mapping))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TEST_RULES: &[FieldRule] = &[
        FieldRule::new(ItemField::Title, &["info", "title"], Transform::Text),
        FieldRule::new(ItemField::Author, &["people"], Transform::JoinList),
        FieldRule::new(ItemField::PublishingYear, &["date"], Transform::LeadingYear),
        FieldRule::new(ItemField::CitationCount, &["cited"], Transform::CountOrZero),
        FieldRule::new(ItemField::CoverUrl, &["cover"], Transform::HttpsUrl),
    ];

    const TEST_MAPPING: SourceMapping = SourceMapping {
        source_id: "test",
        item_type: Some(ItemType::Article),
        rules: TEST_RULES,
    };

    #[test]
    fn test_lookup_nested() {
        let record = json!({"a": {"b": {"c": 1}}});
        assert_eq!(lookup(&record, &["a", "b", "c"]), Some(&json!(1)));
        assert_eq!(lookup(&record, &["a", "x"]), None);
    }

    #[test]
    fn test_apply_mapping() {
        let record = json!({
            "info": {"title": "  Spacetime  "},
            "people": [{"name": "Ada"}, "Grace"],
            "date": "1999-12",
            "cited": "Cited by 1,024",
            "cover": "http://img.example/c.jpg"
        });
        let item = apply_mapping(&record, &TEST_MAPPING).unwrap();
        assert_eq!(item.title, "Spacetime");
        assert_eq!(item.author.as_deref(), Some("Ada, Grace"));
        assert_eq!(item.publishing_year, Some(1999));
        assert_eq!(item.citation_count, Some(1024));
        assert_eq!(item.cover_url.as_deref(), Some("https://img.example/c.jpg"));
        assert_eq!(item.item_type, Some(ItemType::Article));
    }

    #[test]
    fn test_missing_title_excluded() {
        let record = json!({"people": ["Nobody"]});
        assert!(apply_mapping(&record, &TEST_MAPPING).is_none());
    }

    #[test]
    fn test_count_or_zero_default() {
        let record = json!({"info": {"title": "T"}});
        let item = apply_mapping(&record, &TEST_MAPPING).unwrap();
        assert_eq!(item.citation_count, Some(0));
    }

    #[test]
    fn test_first_year_run() {
        let value = json!("A Vaswani, N Shazeer - Advances in NeurIPS, 2017 - neurips.cc");
        assert_eq!(
            convert(&value, Transform::FirstYearRun),
            Some(FieldValue::Number(2017))
        );
        assert_eq!(convert(&json!("no year"), Transform::FirstYearRun), None);
    }

    #[test]
    fn test_preferred_isbn() {
        let ids = json!([
            {"type": "ISBN_10", "identifier": "0441013597"},
            {"type": "ISBN_13", "identifier": "9780441013593"}
        ]);
        assert_eq!(preferred_isbn(&ids), Some("9780441013593".to_string()));

        let only_10 = json!([{"type": "ISBN_10", "identifier": "0441013597"}]);
        assert_eq!(preferred_isbn(&only_10), Some("0441013597".to_string()));

        let other = json!([{"type": "OTHER", "identifier": "UOM:39015"}]);
        assert_eq!(preferred_isbn(&other), None);
    }
}
