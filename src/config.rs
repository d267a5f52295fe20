//! Configuration file parser for ~/.config/watchly/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are accepted by serde but logged as warnings, since they are
//! usually typos. API keys may also come from the environment, which wins
//! over the file.
use crate::catalog::CategoryDescriptor;
use crate::util::{validate_base_url, UrlValidationError};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use url::Url;

pub const DEFAULT_CATALOG_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid {field}: {source}")]
    BaseUrl {
        field: &'static str,
        #[source]
        source: UrlValidationError,
    },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// Every field has a default so any subset of keys can be specified.
/// `Debug` masks both API keys.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// TMDB v3 API key (alternative to the TMDB_API_KEY env var).
    pub tmdb_api_key: Option<String>,

    /// Firebase web API key (alternative to the FIREBASE_API_KEY env var).
    pub firebase_api_key: Option<String>,

    pub catalog_base_url: String,
    pub identity_base_url: String,
    pub image_base_url: String,

    /// Home screen rows. Empty means the built-in set.
    pub rows: Vec<CategoryDescriptor>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tmdb_api_key: None,
            firebase_api_key: None,
            catalog_base_url: DEFAULT_CATALOG_BASE_URL.to_string(),
            identity_base_url: DEFAULT_IDENTITY_BASE_URL.to_string(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            rows: Vec::new(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field(
                "tmdb_api_key",
                &self.tmdb_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "firebase_api_key",
                &self.firebase_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("catalog_base_url", &self.catalog_base_url)
            .field("identity_base_url", &self.identity_base_url)
            .field("image_base_url", &self.image_base_url)
            .field("rows", &self.rows)
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 6] = [
        "tmdb_api_key",
        "firebase_api_key",
        "catalog_base_url",
        "identity_base_url",
        "image_base_url",
        "rows",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::parse(&content)
    }

    /// Parse configuration from TOML text. Blank input yields defaults.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(rows = config.rows.len(), "Loaded configuration");
        Ok(config)
    }

    /// Fill API keys from `TMDB_API_KEY` / `FIREBASE_API_KEY`, which take
    /// precedence over the file.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("TMDB_API_KEY").filter(|k| !k.is_empty()) {
            self.tmdb_api_key = Some(key);
        }
        if let Some(key) = lookup("FIREBASE_API_KEY").filter(|k| !k.is_empty()) {
            self.firebase_api_key = Some(key);
        }
    }

    /// TMDB key wrapped for handing to the catalog client.
    pub fn tmdb_secret(&self) -> Option<SecretString> {
        self.tmdb_api_key.clone().map(SecretString::from)
    }

    pub fn firebase_secret(&self) -> Option<SecretString> {
        self.firebase_api_key.clone().map(SecretString::from)
    }

    pub fn catalog_url(&self) -> Result<Url, ConfigError> {
        validate_base_url(&self.catalog_base_url).map_err(|source| ConfigError::BaseUrl {
            field: "catalog_base_url",
            source,
        })
    }

    pub fn identity_url(&self) -> Result<Url, ConfigError> {
        validate_base_url(&self.identity_base_url).map_err(|source| ConfigError::BaseUrl {
            field: "identity_base_url",
            source,
        })
    }

    /// Poster base, validated like the service URLs. Poster paths start
    /// with `/`, so the result never ends in one.
    pub fn image_url(&self) -> Result<String, ConfigError> {
        let url = validate_base_url(&self.image_base_url).map_err(|source| {
            ConfigError::BaseUrl {
                field: "image_base_url",
                source,
            }
        })?;
        Ok(url.as_str().trim_end_matches('/').to_string())
    }

    /// Configured rows, or the built-in home screen set when none are given.
    pub fn home_rows(&self) -> Vec<CategoryDescriptor> {
        if self.rows.is_empty() {
            crate::catalog::default_rows()
        } else {
            self.rows.clone()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
