//! HTTP endpoint handlers

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::json;

use shelf_core::error::StoreError;
use shelf_core::{
    CoverRecognition, FilterConfig, ItemId, LibraryItem, LibrarySession, ScanOutcome, SearchView,
    ShelfError,
};

use crate::auth::CurrentUser;
use crate::AppState;

pub type ApiError = (StatusCode, String);

const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// Map a core error onto a status code and message
pub fn error_response(error: ShelfError) -> ApiError {
    let status = match &error {
        ShelfError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ShelfError::NotFound(_) | ShelfError::Store(StoreError::NotFound(_)) => {
            StatusCode::NOT_FOUND
        }
        ShelfError::Store(StoreError::Duplicate(_)) => StatusCode::CONFLICT,
        ShelfError::Store(_) | ShelfError::Source(_) => StatusCode::BAD_GATEWAY,
        ShelfError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::warn!("Request failed: {}", error);
    }
    (status, error.to_string())
}

fn require_query(q: Option<&str>) -> Result<&str, ApiError> {
    q.map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                "Query parameter 'q' is required".to_string(),
            )
        })
}

// ==================== System ====================

/// Liveness plus which providers are configured
pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "providers": {
            "books": state.catalog.book_source().id,
            "papers": state.catalog.paper_source().id,
            "covers": state.catalog.cover_source().map(|s| s.id),
        },
        "hostedStore": state.auth.is_some(),
    }))
}

// ==================== Provider proxy ====================

#[derive(Debug, Deserialize)]
pub struct BookSearchQuery {
    pub q: Option<String>,
    #[serde(rename = "maxResults")]
    pub max_results: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct PaperSearchQuery {
    pub q: Option<String>,
    pub num: Option<u32>,
}

/// Normalized provider results
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub source: String,
    pub items: Vec<LibraryItem>,
}

pub async fn search_books(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookSearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let q = require_query(query.q.as_deref())?;
    let max = query
        .max_results
        .unwrap_or(state.config.search.max_results);

    let items = state.catalog.search_books(q, max).await;
    Ok(Json(SearchResponse {
        source: state.catalog.book_source().id.to_string(),
        items,
    }))
}

pub async fn search_papers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PaperSearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let q = require_query(query.q.as_deref())?;
    let max = query.num.unwrap_or(state.config.search.max_results);

    let items = state.catalog.search_papers(q, max).await;
    Ok(Json(SearchResponse {
        source: state.catalog.paper_source().id.to_string(),
        items,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverRequest {
    /// Base64 image, optionally as a `data:<mime>;base64,` URL
    pub image: String,
    pub mime_type: Option<String>,
}

impl CoverRequest {
    /// Decoded bytes and the effective MIME type
    pub fn decode(&self) -> Result<(Vec<u8>, String), ApiError> {
        let (data_url_mime, payload) = match self.image.strip_prefix("data:") {
            Some(rest) => match rest.split_once(";base64,") {
                Some((mime, payload)) => (Some(mime.to_string()), payload),
                None => {
                    return Err((
                        StatusCode::BAD_REQUEST,
                        "Unsupported data URL encoding".to_string(),
                    ))
                }
            },
            None => (None, self.image.as_str()),
        };

        let bytes = BASE64
            .decode(payload.trim())
            .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid base64 image: {}", e)))?;
        if bytes.is_empty() {
            return Err((StatusCode::BAD_REQUEST, "Image is empty".to_string()));
        }

        let mime = self
            .mime_type
            .clone()
            .or(data_url_mime)
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());
        Ok((bytes, mime))
    }
}

pub async fn recognize_cover(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CoverRequest>,
) -> Result<Json<CoverRecognition>, ApiError> {
    let (image, mime) = request.decode()?;
    Ok(Json(state.catalog.recognize_cover(&image, &mime).await))
}

pub async fn scan_cover(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CoverRequest>,
) -> Result<Json<ScanOutcome>, ApiError> {
    let (image, mime) = request.decode()?;
    let outcome = state
        .catalog
        .identify_cover(&image, &mime, state.config.search.max_results)
        .await;
    Ok(Json(outcome))
}

// ==================== Items ====================

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemsResponse {
    pub items: Vec<LibraryItem>,
    /// Size of the whole library before filtering
    pub total: usize,
    /// False when an overlay search with an empty query cleared highlighting
    pub highlight: bool,
}

async fn open_session(state: &AppState, user: CurrentUser) -> Result<LibrarySession, ApiError> {
    let store = state.store_for(user.0.as_ref());
    let mut session = LibrarySession::new(store, user.0);
    session.load().await.map_err(error_response)?;
    Ok(session)
}

/// Load, filter, then optionally free-text search
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ItemsResponse>, ApiError> {
    let mut session = open_session(&state, user).await?;
    session.set_filter(FilterConfig::from_pairs(
        params.iter().map(|(k, v)| (k.as_str(), v.as_str())),
    ));

    let view = match params.get("view").map(String::as_str) {
        Some("overlay") => SearchView::Overlay,
        _ => SearchView::Library,
    };
    let query = params.get("q").map(String::as_str).unwrap_or("");

    let total = session.library().len();
    let response = match session.visible_matches(query, view) {
        Some(items) => ItemsResponse {
            items,
            total,
            highlight: true,
        },
        None => ItemsResponse {
            items: Vec::new(),
            total,
            highlight: false,
        },
    };
    Ok(Json(response))
}

pub async fn create_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(item): Json<LibraryItem>,
) -> Result<(StatusCode, Json<LibraryItem>), ApiError> {
    let mut session = open_session(&state, user).await?;
    let stored = session.add(item).await.map_err(error_response)?;
    tracing::info!(id = %stored.id, backend = session.backend(), "Item added");
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(item): Json<LibraryItem>,
) -> Result<Json<LibraryItem>, ApiError> {
    let mut session = open_session(&state, user).await?;
    let stored = session
        .update(&ItemId::parse(&id), item)
        .await
        .map_err(error_response)?;
    Ok(Json(stored))
}

pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut session = open_session(&state, user).await?;
    session
        .remove(&ItemId::parse(&id))
        .await
        .map_err(error_response)?;
    tracing::info!(id = %id, backend = session.backend(), "Item deleted");
    Ok(StatusCode::NO_CONTENT)
}
