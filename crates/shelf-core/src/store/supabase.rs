//! Hosted row store (Supabase PostgREST)
//!
//! Rows carry `user_id`; row-level security on the service scopes every
//! request to the bearer token's user.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use shelf_domain::{ItemId, ItemType, LibraryItem};

use super::ItemStore;
use crate::auth::Identity;
use crate::error::StoreError;
use crate::http::{HttpClient, HttpResponse};

/// Snake-case row shape of the items table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRow {
    #[serde(default, skip_serializing_if = "ItemId::is_unassigned")]
    pub id: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(rename = "type", default)]
    pub item_type: Option<ItemType>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub publishing_year: Option<i32>,
    #[serde(default)]
    pub pages: Option<u32>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub difficulty: Option<u8>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub citation_count: Option<u32>,
    #[serde(default)]
    pub date_added: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_modified: Option<DateTime<Utc>>,
}

impl ItemRow {
    pub fn from_item(item: &LibraryItem, user_id: Option<&str>) -> Self {
        let item = item.clone();
        Self {
            id: item.id,
            user_id: user_id.map(str::to_string),
            title: item.title,
            author: item.author,
            item_type: item.item_type,
            category: item.category,
            publishing_year: item.publishing_year,
            pages: item.pages,
            language: item.language,
            status: item.status,
            difficulty: item.difficulty,
            rating: item.rating,
            summary: item.summary,
            notes: item.notes,
            cover_url: item.cover_url,
            url: item.url,
            publisher: item.publisher,
            isbn: item.isbn,
            citation_count: item.citation_count,
            date_added: item.date_added,
            date_modified: item.date_modified,
        }
    }

    pub fn into_item(self) -> LibraryItem {
        LibraryItem {
            id: self.id,
            title: self.title,
            author: self.author,
            item_type: self.item_type,
            category: self.category,
            publishing_year: self.publishing_year,
            pages: self.pages,
            language: self.language,
            status: self.status,
            difficulty: self.difficulty,
            rating: self.rating,
            summary: self.summary,
            notes: self.notes,
            cover_url: self.cover_url,
            url: self.url,
            publisher: self.publisher,
            isbn: self.isbn,
            citation_count: self.citation_count,
            date_added: self.date_added,
            date_modified: self.date_modified,
        }
    }
}

pub struct SupabaseStore {
    http: HttpClient,
    rest_url: String,
    anon_key: String,
    identity: Identity,
}

impl SupabaseStore {
    /// Store acting as `identity` against `{url}/rest/v1/{table}`
    pub fn for_identity(
        http: HttpClient,
        url: &str,
        anon_key: impl Into<String>,
        table: &str,
        identity: Identity,
    ) -> Self {
        Self {
            http,
            rest_url: format!("{}/rest/v1/{}", url.trim_end_matches('/'), table),
            anon_key: anon_key.into(),
            identity,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    fn id_filter(id: &ItemId) -> String {
        format!("eq.{}", id.as_key())
    }

    async fn call(
        &self,
        method: Method,
        params: &[(&str, String)],
        body: Option<&ItemRow>,
    ) -> Result<HttpResponse, StoreError> {
        let mut request = self
            .http
            .request(method, &self.rest_url)
            .query(params)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.identity.access_token)
            .header("Prefer", "return=representation");

        if let Some(row) = body {
            request = request.json(row);
        }

        let response = self.http.send(request).await?;
        if !response.is_success() {
            return Err(remote_error(&response));
        }
        Ok(response)
    }
}

/// Map a PostgREST error body onto a store error
fn remote_error(response: &HttpResponse) -> StoreError {
    #[derive(Deserialize)]
    struct PostgrestError {
        #[serde(default)]
        code: Option<String>,
        #[serde(default)]
        message: Option<String>,
    }

    let parsed: Option<PostgrestError> = serde_json::from_str(&response.body).ok();
    let message = parsed
        .as_ref()
        .and_then(|e| e.message.clone())
        .unwrap_or_else(|| response.body.clone());

    // 23505: unique_violation
    if response.status == 409 || parsed.and_then(|e| e.code).as_deref() == Some("23505") {
        return StoreError::Duplicate(message);
    }

    StoreError::Remote {
        status: response.status,
        message,
    }
}

fn parse_rows(body: &str) -> Result<Vec<LibraryItem>, StoreError> {
    let rows: Vec<ItemRow> = serde_json::from_str(body)?;
    Ok(rows.into_iter().map(ItemRow::into_item).collect())
}

#[async_trait]
impl ItemStore for SupabaseStore {
    fn backend(&self) -> &'static str {
        "supabase"
    }

    async fn get_all(&self) -> Result<Vec<LibraryItem>, StoreError> {
        let params = [
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", self.identity.user_id)),
            ("order", "date_added.asc.nullsfirst".to_string()),
        ];
        let response = self.call(Method::GET, &params, None).await?;
        parse_rows(&response.body)
    }

    async fn insert(&self, item: &LibraryItem) -> Result<LibraryItem, StoreError> {
        let row = ItemRow::from_item(item, Some(&self.identity.user_id));
        let response = self.call(Method::POST, &[], Some(&row)).await?;

        parse_rows(&response.body)?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Serialization("insert returned no row".to_string()))
    }

    async fn update(&self, id: &ItemId, item: &LibraryItem) -> Result<LibraryItem, StoreError> {
        let mut row = ItemRow::from_item(item, Some(&self.identity.user_id));
        row.id = id.clone();
        let params = [("id", Self::id_filter(id))];
        let response = self.call(Method::PATCH, &params, Some(&row)).await?;

        parse_rows(&response.body)?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(id.as_key()))
    }

    async fn delete(&self, id: &ItemId) -> Result<(), StoreError> {
        let params = [("id", Self::id_filter(id))];
        let response = self.call(Method::DELETE, &params, None).await?;

        if parse_rows(&response.body)?.is_empty() {
            return Err(StoreError::NotFound(id.as_key()));
        }
        Ok(())
    }
}
