//! Configuration for imshelf
//!
//! Loading order: built-in defaults, then a TOML file, then environment
//! overrides. Every section is optional in the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::{HttpClient, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use crate::sources::SourceError;

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "SHELF_CONFIG";

/// Service-wide configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShelfConfig {
    pub server: ServerConfig,
    pub http: HttpConfig,
    pub search: SearchConfig,
    pub google_books: GoogleBooksConfig,
    pub papers: PapersConfig,
    pub scholar: ScholarConfig,
    pub gemini: GeminiConfig,
    pub supabase: SupabaseConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the HTTP server binds to
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Outbound HTTP settings shared by every provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet period after the last keystroke before a live search fires
    pub debounce_ms: u64,
    /// Default result cap for provider searches
    pub max_results: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            max_results: 20,
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleBooksConfig {
    pub api_key: Option<String>,
}

/// Which provider answers paper searches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperProvider {
    #[default]
    Scholar,
    SemanticScholar,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PapersConfig {
    pub provider: PaperProvider,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScholarConfig {
    /// Scraping proxy URL template containing `{url}`
    pub proxy_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
}

/// Hosted row store and auth service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupabaseConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
    pub table: String,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            table: "library_items".to_string(),
        }
    }
}

impl SupabaseConfig {
    /// `(url, anon_key)` when both are set
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.url.as_deref(), self.anon_key.as_deref()) {
            (Some(url), Some(key)) => Some((url.trim_end_matches('/'), key)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Location of the local SQLite database
    pub fn database_path(&self) -> PathBuf {
        let dir = self
            .data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("imshelf")))
            .unwrap_or_else(|| PathBuf::from("."));
        dir.join("library.db")
    }
}

impl ShelfConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml(&contents)
    }

    /// `<config dir>/imshelf/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("imshelf").join("config.toml"))
    }

    /// Load from an explicit path, `SHELF_CONFIG`, or the default location,
    /// then apply environment overrides and validate.
    ///
    /// An explicit or `SHELF_CONFIG` path must exist; the default location
    /// is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup; blank values are ignored
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("GOOGLE_BOOKS_API_KEY") {
            self.google_books.api_key = Some(key);
        }
        if let Some(key) = get("GEMINI_API_KEY") {
            self.gemini.api_key = Some(key);
        }
        if let Some(url) = get("SUPABASE_URL") {
            self.supabase.url = Some(url);
        }
        if let Some(key) = get("SUPABASE_ANON_KEY") {
            self.supabase.anon_key = Some(key);
        }
        if let Some(addr) = get("SHELF_ADDR") {
            self.server.addr = addr;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::OutOfRange(
                "http.timeout_secs must be positive".to_string(),
            ));
        }

        if self.search.max_results == 0 {
            return Err(ConfigError::OutOfRange(
                "search.max_results must be positive".to_string(),
            ));
        }

        match (&self.supabase.url, &self.supabase.anon_key) {
            (Some(_), None) => {
                return Err(ConfigError::MissingField("supabase.anon_key".to_string()))
            }
            (None, Some(_)) => return Err(ConfigError::MissingField("supabase.url".to_string())),
            (Some(url), Some(_)) => {
                let parsed =
                    url::Url::parse(url).map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", url, e)))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(ConfigError::InvalidUrl(url.clone()));
                }
            }
            _ => {}
        }

        if let Some(proxy) = self.scholar.proxy_url.as_deref() {
            if !proxy.contains("{url}") {
                return Err(ConfigError::OutOfRange(
                    "scholar.proxy_url must contain a {url} placeholder".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Build the shared outbound HTTP client
    pub fn http_client(&self) -> Result<HttpClient, SourceError> {
        Ok(HttpClient::new(&self.http.user_agent, self.http.timeout())?)
    }
}

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("Invalid config file: {0}")]
    Parse(String),

    #[error("Value out of range: {0}")]
    OutOfRange(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
