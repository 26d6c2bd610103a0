//! Shelf Server - provider proxy and item API
//!
//! Fronts Google Books, the paper provider and Gemini for the browser, and
//! serves the item API backed by the local store or the hosted row store.

pub mod auth;
pub mod http;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use shelf_core::auth::SupabaseAuth;
use shelf_core::http::HttpClient;
use shelf_core::{Catalog, Identity, ItemStore, LocalStore, ShelfConfig, ShelfError, SupabaseStore};

/// Cover photos arrive base64-encoded in JSON
const BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Shared application state
pub struct AppState {
    pub config: ShelfConfig,
    pub catalog: Catalog,
    pub local_store: LocalStore,
    pub auth: Option<SupabaseAuth>,
    http: HttpClient,
}

impl AppState {
    /// State without hosted auth; every request uses the local store
    pub fn new(config: ShelfConfig, catalog: Catalog, local_store: LocalStore) -> Result<Self, ShelfError> {
        let http = config.http_client()?;
        Ok(Self {
            config,
            catalog,
            local_store,
            auth: None,
            http,
        })
    }

    /// Wire up providers, the local database and hosted auth from config
    pub fn from_config(config: ShelfConfig) -> Result<Self, ShelfError> {
        let catalog = Catalog::from_config(&config)?;
        let local_store = LocalStore::open(config.storage.database_path())?;
        let mut state = Self::new(config, catalog, local_store)?;

        if let Some((url, anon_key)) = state.config.supabase.credentials() {
            tracing::info!(url, "Hosted auth and storage enabled");
            state.auth = Some(SupabaseAuth::new(state.http.clone(), url, anon_key));
        }

        Ok(state)
    }

    /// Store for a request: the hosted row store when signed in, else local
    pub fn store_for(&self, identity: Option<&Identity>) -> Arc<dyn ItemStore> {
        match (identity, self.config.supabase.credentials()) {
            (Some(identity), Some((url, anon_key))) => Arc::new(SupabaseStore::for_identity(
                self.http.clone(),
                url,
                anon_key,
                &self.config.supabase.table,
                identity.clone(),
            )),
            _ => Arc::new(self.local_store.clone()),
        }
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // System
        .route("/api/health", get(http::health))
        // Provider proxy
        .route("/api/books/search", get(http::search_books))
        .route("/api/papers/search", get(http::search_papers))
        .route("/api/covers/recognize", post(http::recognize_cover))
        .route("/api/covers/scan", post(http::scan_cover))
        // Items
        .route("/api/items", get(http::list_items).post(http::create_item))
        .route(
            "/api/items/{id}",
            put(http::update_item).delete(http::delete_item),
        )
        // Middleware
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the server
pub async fn serve(addr: &str, state: Arc<AppState>) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Shelf server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
