use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{Config, TokenStorage};

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Keychain service name
const SERVICE_NAME: &str = "lulu-admin";

/// Keychain account the token is stored under
const KEYRING_ACCOUNT: &str = "auth_token";

/// Token lifetime in minutes.
/// The backend issues admin tokens valid for 24 hours.
const TOKEN_LIFETIME_MINUTES: i64 = 1440;

/// What gets persisted: the bearer token and when it was stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub token: String,
    pub stored_at: DateTime<Utc>,
}

impl StoredToken {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
            stored_at: Utc::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        let expiry = self.stored_at + Duration::minutes(TOKEN_LIFETIME_MINUTES);
        Utc::now() > expiry
    }
}

/// Durable storage for the single token slot.
pub trait TokenBackend: Send + Sync {
    fn load(&self) -> Result<Option<StoredToken>>;
    fn store(&self, token: &StoredToken) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// `session.json` in the cache directory.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            path: cache_dir.join(SESSION_FILE),
        }
    }
}

impl TokenBackend for FileBackend {
    fn load(&self) -> Result<Option<StoredToken>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents =
            std::fs::read_to_string(&self.path).context("Failed to read session file")?;
        let stored = serde_json::from_str(&contents).context("Failed to parse session file")?;
        Ok(Some(stored))
    }

    fn store(&self, token: &StoredToken) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(token)?;
        std::fs::write(&self.path, contents).context("Failed to write session file")?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).context("Failed to remove session file")?;
        }
        Ok(())
    }
}

/// OS keychain entry.
pub struct KeyringBackend;

impl KeyringBackend {
    fn entry() -> Result<Entry> {
        Entry::new(SERVICE_NAME, KEYRING_ACCOUNT).context("Failed to create keyring entry")
    }
}

impl TokenBackend for KeyringBackend {
    fn load(&self) -> Result<Option<StoredToken>> {
        match Self::entry()?.get_password() {
            Ok(secret) => Ok(Some(
                serde_json::from_str(&secret).context("Failed to parse keychain token")?,
            )),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read token from keychain"),
        }
    }

    fn store(&self, token: &StoredToken) -> Result<()> {
        let secret = serde_json::to_string(token)?;
        Self::entry()?
            .set_password(&secret)
            .context("Failed to store token in keychain")
    }

    fn clear(&self) -> Result<()> {
        match Self::entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

/// Keeps the token for the lifetime of the process only.
#[derive(Default)]
pub struct MemoryBackend {
    slot: Mutex<Option<StoredToken>>,
}

impl MemoryBackend {
    pub fn with_token(token: StoredToken) -> Self {
        Self {
            slot: Mutex::new(Some(token)),
        }
    }
}

impl TokenBackend for MemoryBackend {
    fn load(&self) -> Result<Option<StoredToken>> {
        Ok(self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn store(&self, token: &StoredToken) -> Result<()> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

/// The auth token store: one bearer token, read from durable storage at
/// startup and written through on every change.
///
/// Presence of a token is the authentication signal; whether the backend
/// still accepts it is only known after a `/auth/me` call.
pub struct TokenStore {
    backend: Box<dyn TokenBackend>,
    current: Mutex<Option<String>>,
}

impl TokenStore {
    /// Open the store, loading any persisted token.
    ///
    /// Unreadable or expired tokens are dropped here so the session starts
    /// anonymous instead of failing.
    pub fn open(backend: Box<dyn TokenBackend>) -> Self {
        let current = match backend.load() {
            Ok(Some(stored)) if stored.is_expired() => {
                debug!(stored_at = %stored.stored_at, "Discarding expired token");
                if let Err(e) = backend.clear() {
                    warn!(error = %e, "Failed to clear expired token");
                }
                None
            }
            Ok(Some(stored)) => Some(stored.token),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to load stored token");
                None
            }
        };
        debug!(has_token = current.is_some(), "Token store opened");

        Self {
            backend,
            current: Mutex::new(current),
        }
    }

    /// Open the backend selected in the config.
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend: Box<dyn TokenBackend> = match config.token_storage {
            TokenStorage::File => Box::new(FileBackend::new(config.cache_dir()?)),
            TokenStorage::Keyring => Box::new(KeyringBackend),
            TokenStorage::Memory => Box::new(MemoryBackend::default()),
        };
        Ok(Self::open(backend))
    }

    /// In-memory store, useful for tests and one-shot clients
    pub fn in_memory() -> Self {
        Self::open(Box::new(MemoryBackend::default()))
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply a token to subsequent requests and persist it.
    ///
    /// The token is applied even if persisting fails; the error is returned
    /// so the caller can report it. The slot is not locked during I/O.
    pub fn set_token(&self, token: &str) -> Result<()> {
        *self.slot() = Some(token.to_string());
        self.backend.store(&StoredToken::new(token))
    }

    /// Forget the token; later requests carry no `Authorization` header.
    pub fn remove_token(&self) -> Result<()> {
        *self.slot() = None;
        self.backend.clear()
    }

    /// Remove the token only if it is still `rejected`.
    ///
    /// Returns true for the one caller that actually cleared it, so several
    /// simultaneous 401s for the same token log out once.
    pub fn remove_if_current(&self, rejected: &str) -> Result<bool> {
        {
            let mut slot = self.slot();
            if slot.as_deref() != Some(rejected) {
                return Ok(false);
            }
            *slot = None;
        }
        self.backend.clear()?;
        Ok(true)
    }

    pub fn get_token(&self) -> Option<String> {
        self.slot().clone()
    }

    /// Token presence, not validity
    pub fn is_authenticated(&self) -> bool {
        self.slot().is_some()
    }
}
