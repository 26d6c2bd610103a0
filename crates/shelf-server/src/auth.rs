//! Session resolution

use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

use shelf_core::auth::bearer_token;
use shelf_core::Identity;

use crate::AppState;

/// The verified user for this request, if any
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<Identity>);

/// Resolve `Authorization: Bearer <jwt>` into a [`CurrentUser`] extension.
///
/// Requests are never rejected here: a missing, invalid or unverifiable
/// token means no session, and item routes fall back to the local store.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_string);

    let identity = match (token, state.auth.as_ref()) {
        (Some(token), Some(auth)) => auth.verify(&token).await,
        _ => None,
    };

    request.extensions_mut().insert(CurrentUser(identity));
    next.run(request).await
}
