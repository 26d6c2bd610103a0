//! Gemini cover recognition
//!
//! The model is asked for a fixed JSON object, but its output is not
//! guaranteed to be well formed. Parsing falls through three tiers and the
//! tier reached is kept in the result:
//!
//! 1. the first balanced `{...}` span parses as a JSON object → `Parsed`
//! 2. line-oriented `key: value` scanning finds a known key → `PartiallyParsed`
//! 3. otherwise the fixed low-confidence placeholder → `Fallback`

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use shelf_domain::{ItemType, LibraryItem};

use super::mapping::{apply_mapping, FieldRule, ItemField, SourceMapping, Transform};
use super::traits::{CoverRecognizer, SourceError, SourceMetadata};
use crate::http::HttpClient;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

pub const SUPPORTED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/heic",
    "image/heif",
];

pub const PLACEHOLDER_TITLE: &str = "Unknown Title";
pub const PLACEHOLDER_AUTHOR: &str = "Unknown Author";

const PROMPT: &str = r#"Analyze this book cover image and extract the following information.
Respond ONLY with a JSON object in exactly this format:
{
  "title": "book title",
  "author": "author name(s)",
  "isbn": "ISBN if visible, otherwise null",
  "publisher": "publisher if visible, otherwise null",
  "year": "publication year if visible, otherwise null",
  "category": "best guess genre or subject",
  "confidence": "high, medium or low"
}"#;

lazy_static! {
    static ref YEAR_RUN: Regex = Regex::new(r"\d{4}").unwrap();
}

/// How sure the model claims to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    #[default]
    Low,
}

impl Confidence {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "high" => Some(Confidence::High),
            "medium" => Some(Confidence::Medium),
            "low" => Some(Confidence::Low),
            _ => None,
        }
    }
}

/// The model's structured guess about a cover
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CoverGuess {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub publisher: Option<String>,
    pub year: Option<i32>,
    pub category: Option<String>,
    pub confidence: Confidence,
}

impl CoverGuess {
    /// The fixed record returned when nothing could be extracted
    pub fn placeholder() -> Self {
        Self {
            title: Some(PLACEHOLDER_TITLE.to_string()),
            author: Some(PLACEHOLDER_AUTHOR.to_string()),
            confidence: Confidence::Low,
            ..Default::default()
        }
    }

    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.isbn.is_none()
            && self.publisher.is_none()
            && self.year.is_none()
            && self.category.is_none()
    }

    /// Set a field from a loosely typed key; returns whether the key was known
    fn set(&mut self, key: &str, value: &str) -> bool {
        let key = key.trim().to_lowercase();
        let value = clean_value(value);

        let slot = match key.as_str() {
            "title" | "book title" => &mut self.title,
            "author" | "authors" | "author(s)" => &mut self.author,
            "isbn" | "isbn-13" | "isbn13" | "isbn-10" => &mut self.isbn,
            "publisher" => &mut self.publisher,
            "category" | "genre" | "subject" => &mut self.category,
            "year" | "publication year" | "published" => {
                self.year = value.as_deref().and_then(first_year);
                return true;
            }
            "confidence" => {
                if let Some(c) = value.as_deref().and_then(Confidence::parse) {
                    self.confidence = c;
                }
                return true;
            }
            _ => return false,
        };
        *slot = value;
        true
    }
}

/// Field mapping for a recognized cover, applied to the serialized guess
const FIELDS: &[FieldRule] = &[
    FieldRule::new(ItemField::Title, &["title"], Transform::Text),
    FieldRule::new(ItemField::Author, &["author"], Transform::Text),
    FieldRule::new(ItemField::Isbn, &["isbn"], Transform::Text),
    FieldRule::new(ItemField::Publisher, &["publisher"], Transform::Text),
    FieldRule::new(ItemField::PublishingYear, &["year"], Transform::LeadingYear),
    FieldRule::new(ItemField::Category, &["category"], Transform::Text),
];

pub const GEMINI_MAPPING: SourceMapping = SourceMapping {
    source_id: "gemini",
    item_type: Some(ItemType::Book),
    rules: FIELDS,
};

/// Outcome of parsing the model's text, tagged by how it was obtained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "guess", rename_all = "snake_case")]
pub enum CoverRecognition {
    /// A JSON object was found and parsed
    Parsed(CoverGuess),
    /// Only `key: value` lines could be recovered
    PartiallyParsed(CoverGuess),
    /// Nothing usable; the fixed placeholder
    Fallback(CoverGuess),
}

impl CoverRecognition {
    pub fn fallback() -> Self {
        CoverRecognition::Fallback(CoverGuess::placeholder())
    }

    pub fn guess(&self) -> &CoverGuess {
        match self {
            CoverRecognition::Parsed(g)
            | CoverRecognition::PartiallyParsed(g)
            | CoverRecognition::Fallback(g) => g,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, CoverRecognition::Fallback(_))
    }

    /// Draft item built from the guess; `None` for the placeholder
    pub fn to_item(&self) -> Option<LibraryItem> {
        if self.is_fallback() {
            return None;
        }
        let record = serde_json::to_value(self.guess()).ok()?;
        apply_mapping(&record, &GEMINI_MAPPING)
    }
}

fn clean_value(raw: &str) -> Option<String> {
    let value = raw
        .trim()
        .trim_end_matches(',')
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '*' || c == '`')
        .trim();

    match value.to_lowercase().as_str() {
        "" | "null" | "none" | "n/a" | "unknown" | "not visible" => None,
        _ => Some(value.to_string()),
    }
}

fn first_year(text: &str) -> Option<i32> {
    YEAR_RUN.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Balanced `{...}` span opening at byte `start`, ignoring braces inside strings
fn balanced_span_at(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

/// First embedded JSON object, trying each `{` in turn
pub fn find_json_object(text: &str) -> Option<Map<String, Value>> {
    text.match_indices('{').find_map(|(start, _)| {
        let span = balanced_span_at(text, start)?;
        match serde_json::from_str::<Value>(span) {
            Ok(Value::Object(object)) => Some(object),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(start, "Brace span is not JSON: {}", e);
                None
            }
        }
    })
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(entries) => {
            let parts: Vec<String> = entries.iter().filter_map(value_as_text).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        _ => None,
    }
}

fn guess_from_object(object: &Map<String, Value>) -> CoverGuess {
    let mut guess = CoverGuess::default();
    for (key, value) in object {
        if let Some(text) = value_as_text(value) {
            guess.set(key, &text);
        }
    }
    guess
}

fn scan_key_values(text: &str) -> Option<CoverGuess> {
    let mut guess = CoverGuess::default();
    let mut found = false;

    for line in text.lines() {
        let line = line
            .trim()
            .trim_start_matches(|c: char| c == '-' || c == '*' || c == '•')
            .trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim_matches(|c: char| c == '"' || c == '*' || c == '{' || c.is_whitespace());
        if guess.set(key, value) {
            found = true;
        }
    }

    (found && !guess.is_empty()).then_some(guess)
}

/// Parse raw model output into a tagged recognition. Never fails.
pub fn parse_recognition(text: &str) -> CoverRecognition {
    if let Some(object) = find_json_object(text) {
        return CoverRecognition::Parsed(guess_from_object(&object));
    }

    if let Some(guess) = scan_key_values(text) {
        return CoverRecognition::PartiallyParsed(guess);
    }

    tracing::warn!("Cover recognition output unusable, returning placeholder");
    CoverRecognition::fallback()
}

pub struct GeminiRecognizer {
    http: HttpClient,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiRecognizer {
    pub fn new(http: HttpClient, api_key: impl Into<String>, model: Option<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn source_metadata() -> SourceMetadata {
        SourceMetadata {
            id: "gemini",
            name: "Gemini",
            description: "Cover image recognition via a multimodal model",
            base_url: BASE_URL,
            requires_api_key: true,
        }
    }

    /// Request body for `generateContent`
    pub fn build_request(image: &[u8], mime_type: &str) -> Value {
        json!({
            "contents": [{
                "parts": [
                    {"text": PROMPT},
                    {"inline_data": {"mime_type": mime_type, "data": BASE64.encode(image)}}
                ]
            }]
        })
    }

    /// Concatenate the text parts of the first candidate
    pub fn extract_text(response: &Value) -> Option<String> {
        let parts = response
            .get("candidates")?
            .get(0)?
            .get("content")?
            .get("parts")?
            .as_array()?;

        let text: String = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n");

        (!text.trim().is_empty()).then_some(text)
    }
}

#[async_trait]
impl CoverRecognizer for GeminiRecognizer {
    fn metadata(&self) -> SourceMetadata {
        Self::source_metadata()
    }

    async fn recognize(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> Result<CoverRecognition, SourceError> {
        if image.is_empty() {
            return Err(SourceError::InvalidQuery("image is empty".to_string()));
        }
        if !SUPPORTED_MIME_TYPES.contains(&mime_type) {
            return Err(SourceError::InvalidQuery(format!(
                "unsupported image type {}",
                mime_type
            )));
        }

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url,
            self.model,
            urlencoding::encode(&self.api_key)
        );

        tracing::debug!(model = %self.model, bytes = image.len(), "Requesting cover recognition");
        let response = self
            .http
            .post_json(&url, &Self::build_request(image, mime_type))
            .await?;

        if !response.is_success() {
            return Err(SourceError::Status(response.status));
        }

        let body: Value = response
            .json()
            .map_err(|e| SourceError::Parse(e.to_string()))?;
        let text = Self::extract_text(&body)
            .ok_or_else(|| SourceError::Parse("Response has no text parts".to_string()))?;

        Ok(parse_recognition(&text))
    }
}
