//! Configuration system (layered: code > env > config file > defaults).

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::auth::AuthError;
use crate::error::DevtrexError;

pub const CLIENT_ID_ENV: &str = "EXPO_PUBLIC_LINKEDIN_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "EXPO_PUBLIC_LINKEDIN_CLIENT_SECRET";
pub const REDIRECT_URI_ENV: &str = "EXPO_PUBLIC_LINKEDIN_REDIRECT_URI";
pub const API_URL_ENV: &str = "EXPO_PUBLIC_API_URL";
pub const CONFIG_PATH_ENV: &str = "DEVTREX_AUTH_CONFIG";
pub const HTTP_TIMEOUT_ENV: &str = "DEVTREX_HTTP_TIMEOUT_SECS";

pub const DEFAULT_AUTHORIZATION_URL: &str = "https://www.linkedin.com/oauth/v2/authorization";
pub const DEFAULT_TOKEN_URL: &str = "https://www.linkedin.com/oauth/v2/accessToken";
pub const DEFAULT_USERINFO_URL: &str = "https://api.linkedin.com/v2/userinfo";
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8765/auth/linkedin";
pub const DEFAULT_SCOPES: [&str; 3] = ["openid", "profile", "email"];

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PROMPT_TIMEOUT_SECS: u64 = 300;

/// Values shipped in `.env.example` files that were never filled in.
const CLIENT_ID_PLACEHOLDERS: &[&str] = &["your_linkedin_client_id_here", "YOUR_LINKEDIN_CLIENT_ID"];
const CLIENT_SECRET_PLACEHOLDERS: &[&str] =
    &["your_linkedin_client_secret_here", "YOUR_LINKEDIN_CLIENT_SECRET"];

/// Static configuration of the LinkedIn OAuth client.
///
/// # Example
/// ```
/// use devtrex_auth::config::LinkedInConfig;
///
/// let config = LinkedInConfig::default()
///     .with_client_credentials("client-id", "client-secret");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone)]
pub struct LinkedInConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub authorization_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    /// Backend base URL used by the rest of the app; carried, not called.
    pub api_url: Option<String>,
    pub http_timeout: Duration,
    pub prompt_timeout: Duration,
    pub storage_dir: Option<PathBuf>,
}

impl fmt::Debug for LinkedInConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedInConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"..")
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("authorization_url", &self.authorization_url)
            .field("token_url", &self.token_url)
            .field("userinfo_url", &self.userinfo_url)
            .field("api_url", &self.api_url)
            .field("http_timeout", &self.http_timeout)
            .field("prompt_timeout", &self.prompt_timeout)
            .field("storage_dir", &self.storage_dir)
            .finish()
    }
}

impl Default for LinkedInConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            authorization_url: DEFAULT_AUTHORIZATION_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            userinfo_url: DEFAULT_USERINFO_URL.to_string(),
            api_url: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            prompt_timeout: Duration::from_secs(DEFAULT_PROMPT_TIMEOUT_SECS),
            storage_dir: None,
        }
    }
}

impl LinkedInConfig {
    /// Load from `.env`, the optional `DEVTREX_AUTH_CONFIG` file, then
    /// environment variables.
    ///
    /// A config file that cannot be read is logged and skipped.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::default();

        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            match read_config_file(Path::new(&path)) {
                Ok(file) => config.apply_file(file),
                Err(err) => tracing::warn!(path = %path, error = %err, "Ignoring config file"),
            }
        }

        config.apply_env();
        config
    }

    /// Load a TOML config file on top of the defaults.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, DevtrexError> {
        let mut config = Self::default();
        config.apply_file(read_config_file(path.as_ref())?);
        Ok(config)
    }

    /// Override fields from environment variables that are set.
    pub fn apply_env(&mut self) {
        if let Ok(value) = std::env::var(CLIENT_ID_ENV) {
            self.client_id = value;
        }
        if let Ok(value) = std::env::var(CLIENT_SECRET_ENV) {
            self.client_secret = value;
        }
        if let Ok(value) = std::env::var(REDIRECT_URI_ENV) {
            if !value.trim().is_empty() {
                self.redirect_uri = value;
            }
        }
        if let Ok(value) = std::env::var(API_URL_ENV) {
            if !value.trim().is_empty() {
                self.api_url = Some(value);
            }
        }
        if let Ok(value) = std::env::var(HTTP_TIMEOUT_ENV) {
            match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.http_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %value, "Ignoring invalid {HTTP_TIMEOUT_ENV}"),
            }
        }
    }

    fn apply_file(&mut self, file: ConfigFile) {
        let ConfigFile {
            client_id,
            client_secret,
            redirect_uri,
            scopes,
            authorization_url,
            token_url,
            userinfo_url,
            api_url,
            http_timeout_secs,
            prompt_timeout_secs,
            storage_dir,
        } = file;

        if let Some(value) = client_id {
            self.client_id = value;
        }
        if let Some(value) = client_secret {
            self.client_secret = value;
        }
        if let Some(value) = redirect_uri {
            self.redirect_uri = value;
        }
        if let Some(value) = scopes {
            self.scopes = value;
        }
        if let Some(value) = authorization_url {
            self.authorization_url = value;
        }
        if let Some(value) = token_url {
            self.token_url = value;
        }
        if let Some(value) = userinfo_url {
            self.userinfo_url = value;
        }
        if api_url.is_some() {
            self.api_url = api_url;
        }
        if let Some(secs) = http_timeout_secs.filter(|s| *s > 0) {
            self.http_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = prompt_timeout_secs.filter(|s| *s > 0) {
            self.prompt_timeout = Duration::from_secs(secs);
        }
        if storage_dir.is_some() {
            self.storage_dir = storage_dir;
        }
    }

    pub fn with_client_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.client_id = client_id.into();
        self.client_secret = client_secret.into();
        self
    }

    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = uri.into();
        self
    }

    pub fn with_authorization_url(mut self, url: impl Into<String>) -> Self {
        self.authorization_url = url.into();
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn with_userinfo_url(mut self, url: impl Into<String>) -> Self {
        self.userinfo_url = url.into();
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn with_prompt_timeout(mut self, timeout: Duration) -> Self {
        self.prompt_timeout = timeout;
        self
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// Fail fast on credentials that were never filled in.
    pub fn validate(&self) -> Result<(), AuthError> {
        let client_id = self.client_id.trim();
        if client_id.is_empty() || CLIENT_ID_PLACEHOLDERS.contains(&client_id) {
            return Err(AuthError::Configuration(format!(
                "LinkedIn Client ID not configured. Please set {CLIENT_ID_ENV} in your .env file"
            )));
        }
        let client_secret = self.client_secret.trim();
        if client_secret.is_empty() || CLIENT_SECRET_PLACEHOLDERS.contains(&client_secret) {
            return Err(AuthError::Configuration(format!(
                "LinkedIn Client Secret not configured. Please set {CLIENT_SECRET_ENV} in your .env file"
            )));
        }
        if self.redirect_uri.trim().is_empty() {
            return Err(AuthError::Configuration(
                "LinkedIn redirect URI is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Directory for [`crate::auth::FileSecureStorage`].
    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir
            .clone()
            .unwrap_or_else(crate::auth::store::default_storage_dir)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_uri: Option<String>,
    scopes: Option<Vec<String>>,
    authorization_url: Option<String>,
    token_url: Option<String>,
    userinfo_url: Option<String>,
    api_url: Option<String>,
    http_timeout_secs: Option<u64>,
    prompt_timeout_secs: Option<u64>,
    storage_dir: Option<PathBuf>,
}

fn read_config_file(path: &Path) -> Result<ConfigFile, DevtrexError> {
    let raw = std::fs::read_to_string(path)?;
    toml::from_str(&raw).map_err(|err| {
        DevtrexError::Configuration(format!("Invalid config file {}: {err}", path.display()))
    })
}
