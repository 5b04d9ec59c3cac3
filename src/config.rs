//! Configuration file parser for ~/.config/pressroom/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are accepted but logged, since they are usually typos.
use crate::api::{AuthScheme, ClientOptions, PostStatus};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable that overrides the configured password.
pub const PASSWORD_ENV: &str = "PRESSROOM_PASSWORD";

const DEFAULT_BASE_URL: &str = "http://localhost/wp";
const DEFAULT_PLACEHOLDER: &str = "http://localhost/wp/wp-content/uploads/no-image.jpg";

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

    #[error("Invalid value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// `Debug` never prints the password.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site root; the REST API lives under `<base_url>/wp-json`.
    pub base_url: String,

    pub username: Option<String>,

    /// Login password or application password. The env var wins when set.
    #[serde(deserialize_with = "deserialize_secret")]
    pub password: Option<SecretString>,

    pub auth: AuthScheme,

    /// Image URL shown for posts without a resolvable featured image.
    pub placeholder_image_url: String,

    /// Statuses requested by the post listing.
    pub statuses: Vec<PostStatus>,

    /// Posts per listing request (1-100).
    pub per_page: u32,

    pub request_timeout_secs: u64,

    /// Ask before deleting a post.
    pub confirm_delete: bool,

    /// Custom keybinding overrides. Keys are action names, values are key strings.
    pub keybindings: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            username: None,
            password: None,
            auth: AuthScheme::default(),
            placeholder_image_url: DEFAULT_PLACEHOLDER.to_string(),
            statuses: PostStatus::LISTED.to_vec(),
            per_page: 100,
            request_timeout_secs: 30,
            confirm_delete: true,
            keybindings: HashMap::new(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("auth", &self.auth)
            .field("placeholder_image_url", &self.placeholder_image_url)
            .field("statuses", &self.statuses)
            .field("per_page", &self.per_page)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("confirm_delete", &self.confirm_delete)
            .field("keybindings", &self.keybindings)
            .finish()
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 10] = [
        "base_url",
        "username",
        "password",
        "auth",
        "placeholder_image_url",
        "statuses",
        "per_page",
        "request_timeout_secs",
        "confirm_delete",
        "keybindings",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Out-of-range values → `Err(ConfigError::Invalid)`
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

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        tracing::info!(
            path = %path.display(),
            base_url = %config.base_url,
            auth = config.auth.name(),
            "Loaded configuration"
        );
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.per_page) {
            return Err(ConfigError::Invalid {
                key: "per_page",
                reason: format!("{} is outside 1-100", self.per_page),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "request_timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.statuses.is_empty() || self.statuses.contains(&PostStatus::Other) {
            return Err(ConfigError::Invalid {
                key: "statuses",
                reason: "expected a non-empty list of known statuses".to_string(),
            });
        }
        Ok(())
    }

    /// Password from `PRESSROOM_PASSWORD`, falling back to the file.
    pub fn resolve_password(&self) -> Option<SecretString> {
        Self::password_from(std::env::var(PASSWORD_ENV).ok(), self.password.clone())
    }

    fn password_from(env: Option<String>, file: Option<SecretString>) -> Option<SecretString> {
        env.filter(|v| !v.is_empty())
            .map(SecretString::from)
            .or(file)
    }

    /// HTTP settings derived from this configuration.
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            timeout: Duration::from_secs(self.request_timeout_secs),
            per_page: self.per_page,
            ..ClientOptions::default()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
