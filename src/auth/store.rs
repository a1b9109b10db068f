use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::AuthError;
use super::token::TokenSet;

pub const ACCESS_TOKEN_KEY: &str = "linkedin_access_token";
pub const REFRESH_TOKEN_KEY: &str = "linkedin_refresh_token";
pub const TOKEN_EXPIRY_KEY: &str = "linkedin_token_expiry";

/// String-keyed secret storage backing the [`TokenStore`].
///
/// Each key is an independent entry; there is no atomic multi-key write.
pub trait SecureStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, AuthError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), AuthError>;
    /// Removing a missing key succeeds.
    fn delete_item(&self, key: &str) -> Result<(), AuthError>;
}

/// File-backed storage, one TOML file per key.
///
/// # Example
/// ```no_run
/// use devtrex_auth::auth::{FileSecureStorage, SecureStorage};
///
/// let storage = FileSecureStorage::new_default();
/// storage.set_item("linkedin_access_token", "access")?;
/// # Ok::<(), devtrex_auth::auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileSecureStorage {
    base_dir: PathBuf,
}

impl FileSecureStorage {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn new_default() -> Self {
        Self {
            base_dir: default_storage_dir(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn item_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.toml", normalize_key(key)))
    }

    fn ensure_parent(path: &Path) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl SecureStorage for FileSecureStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, AuthError> {
        let path = self.item_path(key);
        let raw = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(AuthError::Storage(err.to_string())),
        };
        let file: StoredItem = toml::from_str(&raw)?;
        Ok(Some(file.value))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), AuthError> {
        let path = self.item_path(key);
        Self::ensure_parent(&path)?;
        let file = StoredItem {
            version: 1,
            key: key.to_string(),
            value: value.to_string(),
            saved_at: Utc::now(),
        };
        let serialized = toml::to_string(&file)?;
        fs::write(&path, serialized)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn delete_item(&self, key: &str) -> Result<(), AuthError> {
        let path = self.item_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Storage(err.to_string())),
        }
    }
}

/// In-process storage. Nothing survives the process; use it where no secure
/// store exists, or in tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .items
            .lock()
            .map(|items| items.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, AuthError> {
        self.items
            .lock()
            .map_err(|_| AuthError::Storage("memory storage lock poisoned".to_string()))
    }
}

impl SecureStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), AuthError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete_item(&self, key: &str) -> Result<(), AuthError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Persists the LinkedIn token set under three independent keys.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn SecureStorage>,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}

impl TokenStore {
    pub fn new(storage: Arc<dyn SecureStorage>) -> Self {
        Self { storage }
    }

    /// Write the access token, plus refresh token and absolute expiry when
    /// the provider sent them.
    ///
    /// Entries left over from an earlier session are removed when the new
    /// token set does not carry them.
    pub fn store(&self, tokens: &TokenSet) -> Result<(), AuthError> {
        self.store_at(tokens, Utc::now())
    }

    pub(crate) fn store_at(&self, tokens: &TokenSet, now: DateTime<Utc>) -> Result<(), AuthError> {
        // Optional entries from the previous session never outlive it, even
        // when a later write fails.
        self.storage.delete_item(REFRESH_TOKEN_KEY)?;
        self.storage.delete_item(TOKEN_EXPIRY_KEY)?;

        self.storage.set_item(ACCESS_TOKEN_KEY, &tokens.access_token)?;

        if let Some(refresh) = tokens.refresh_token.as_deref().filter(|t| !t.is_empty()) {
            self.storage.set_item(REFRESH_TOKEN_KEY, refresh)?;
        }
        if let Some(millis) = tokens.expires_in_millis() {
            let expiry = now.timestamp_millis().saturating_add(millis);
            self.storage
                .set_item(TOKEN_EXPIRY_KEY, &expiry.to_string())?;
        }
        Ok(())
    }

    /// Stored access token. Read failures are logged and reported as absent.
    pub fn access_token(&self) -> Option<String> {
        match self.storage.get_item(ACCESS_TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(err) => {
                tracing::warn!(error = %err, "Failed to read stored access token");
                None
            }
        }
    }

    pub fn refresh_token(&self) -> Result<Option<String>, AuthError> {
        self.storage.get_item(REFRESH_TOKEN_KEY)
    }

    /// Absolute expiry written by [`store`](Self::store), if any.
    pub fn expires_at(&self) -> Result<Option<DateTime<Utc>>, AuthError> {
        let Some(raw) = self.storage.get_item(TOKEN_EXPIRY_KEY)? else {
            return Ok(None);
        };
        let millis: i64 = raw.trim().parse().map_err(|_| {
            AuthError::Storage(format!("Stored token expiry is not a timestamp: {raw}"))
        })?;
        Ok(DateTime::<Utc>::from_timestamp_millis(millis))
    }

    /// Opt-in expiry check. `None` when no expiry was recorded.
    pub fn is_expired(&self, now: DateTime<Utc>) -> Result<Option<bool>, AuthError> {
        Ok(self.expires_at()?.map(|expiry| now >= expiry))
    }

    /// True iff an access token is stored. The stored expiry is not consulted.
    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    /// Remove every token entry. Safe to call when nothing is stored.
    pub fn clear(&self) -> Result<(), AuthError> {
        let mut first_error = None;
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TOKEN_EXPIRY_KEY] {
            if let Err(err) = self.storage.delete_item(key) {
                tracing::warn!(key, error = %err, "Failed to delete stored token entry");
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredItem {
    version: u32,
    key: String,
    value: String,
    saved_at: DateTime<Utc>,
}

pub(crate) fn default_storage_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".devtrex"))
        .unwrap_or_else(|| PathBuf::from(".devtrex"))
}

fn normalize_key(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "default".to_string();
    }
    trimmed
        .chars()
        .map(|ch| {
            let lower = ch.to_ascii_lowercase();
            if lower.is_ascii_alphanumeric() || lower == '-' || lower == '_' {
                lower
            } else {
                '-'
            }
        })
        .collect()
}
