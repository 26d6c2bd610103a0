//! Identity verification against the hosted auth service

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::http::HttpClient;

/// A verified signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// The bearer token the identity was verified from
    #[serde(skip)]
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// Extract the token from an `Authorization: Bearer <jwt>` header value
pub fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// Build an identity from an `/auth/v1/user` response body
pub fn parse_user(body: &str, access_token: &str) -> Option<Identity> {
    let user: AuthUser = serde_json::from_str(body).ok()?;
    if user.id.trim().is_empty() {
        return None;
    }
    Some(Identity {
        user_id: user.id,
        email: user.email,
        access_token: access_token.to_string(),
    })
}

#[derive(Clone)]
pub struct SupabaseAuth {
    http: HttpClient,
    url: String,
    anon_key: String,
}

impl SupabaseAuth {
    pub fn new(http: HttpClient, url: &str, anon_key: impl Into<String>) -> Self {
        Self {
            http,
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }

    /// Resolve a bearer token to an identity.
    ///
    /// Rejected tokens and unreachable auth both mean "no session".
    pub async fn verify(&self, access_token: &str) -> Option<Identity> {
        let url = format!("{}/auth/v1/user", self.url);
        let request = self
            .http
            .request(Method::GET, &url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token);

        match self.http.send(request).await {
            Ok(response) if response.is_success() => parse_user(&response.body, access_token),
            Ok(response) => {
                tracing::debug!(status = response.status, "Token rejected by auth service");
                None
            }
            Err(e) => {
                tracing::warn!("Auth service unreachable: {}", e);
                None
            }
        }
    }
}
