//! Access/refresh token persistence.
//!
//! Tokens live in `<data_dir>/termtask/tokens.json` with restricted
//! permissions (0600). Each token carries its own absolute expiry; an
//! expired entry reads as absent, mirroring cookie TTL semantics. The file
//! is the durable copy; an in-memory cache keeps the hot path off disk.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Default access token lifetime when the server does not specify one.
pub const DEFAULT_ACCESS_TTL_DAYS: u64 = 7;

/// Default refresh token lifetime when the server does not specify one.
pub const DEFAULT_REFRESH_TTL_DAYS: u64 = 30;

const MILLIS_PER_DAY: u64 = 24 * 60 * 60 * 1000;

/// Errors that can occur while reading or writing the token file.
#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    /// Failed to read the token file.
    #[error("failed to read token file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to write the token file.
    #[error("failed to write token file {path}: {source}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The token file exists but is not valid JSON.
    #[error("failed to parse token file {path}: {source}")]
    Parse {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying serde error.
        source: serde_json::Error,
    },
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|d| u64::try_from(d.as_millis()).ok())
        .unwrap_or(u64::MAX)
}

/// A single stored token with its absolute expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredToken {
    /// The token value.
    value: String,
    /// Expiry in milliseconds since epoch.
    expires: u64,
}

impl StoredToken {
    fn with_ttl_days(value: &str, ttl_days: u64) -> Self {
        Self {
            value: value.to_string(),
            expires: now_millis().saturating_add(ttl_days.saturating_mul(MILLIS_PER_DAY)),
        }
    }

    fn is_expired(&self) -> bool {
        now_millis() >= self.expires
    }
}

/// On-disk token file structure.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct TokenFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    access: Option<StoredToken>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh: Option<StoredToken>,
}

/// File-backed store for the access/refresh token pair.
///
/// Reads serve from an in-memory cache; every mutation writes through to
/// disk so tokens survive a restart within their TTL.
pub struct TokenStore {
    path: PathBuf,
    cache: Mutex<TokenFile>,
}

impl TokenStore {
    /// Opens the store at `path`, loading any existing token file.
    ///
    /// A missing file starts an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`TokenStoreError`] if an existing file cannot be read or
    /// parsed.
    pub fn open(path: PathBuf) -> Result<Self, TokenStoreError> {
        let cache = match fs::read_to_string(&path) {
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|source| TokenStoreError::Parse {
                    path: path.clone(),
                    source,
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => TokenFile::default(),
            Err(source) => {
                return Err(TokenStoreError::ReadFile {
                    path,
                    source,
                });
            }
        };

        Ok(Self {
            path,
            cache: Mutex::new(cache),
        })
    }

    /// Returns the access token, or `None` if absent or expired.
    #[must_use]
    pub fn access(&self) -> Option<String> {
        let cache = self.cache.lock();
        cache
            .access
            .as_ref()
            .filter(|t| !t.is_expired())
            .map(|t| t.value.clone())
    }

    /// Returns the refresh token, or `None` if absent or expired.
    #[must_use]
    pub fn refresh(&self) -> Option<String> {
        let cache = self.cache.lock();
        cache
            .refresh
            .as_ref()
            .filter(|t| !t.is_expired())
            .map(|t| t.value.clone())
    }

    /// Stores a new access token with the given TTL in days.
    ///
    /// # Errors
    ///
    /// Returns [`TokenStoreError`] if persisting fails. The in-memory value
    /// is updated regardless, so the session keeps working.
    pub fn set_access(&self, token: &str, ttl_days: u64) -> Result<(), TokenStoreError> {
        let snapshot = {
            let mut cache = self.cache.lock();
            cache.access = Some(StoredToken::with_ttl_days(token, ttl_days));
            cache.clone()
        };
        self.save(&snapshot)
    }

    /// Stores a new refresh token with the given TTL in days.
    ///
    /// # Errors
    ///
    /// Returns [`TokenStoreError`] if persisting fails. The in-memory value
    /// is updated regardless.
    pub fn set_refresh(&self, token: &str, ttl_days: u64) -> Result<(), TokenStoreError> {
        let snapshot = {
            let mut cache = self.cache.lock();
            cache.refresh = Some(StoredToken::with_ttl_days(token, ttl_days));
            cache.clone()
        };
        self.save(&snapshot)
    }

    /// Removes both tokens. Subsequent reads return `None` immediately,
    /// before the file write even completes.
    ///
    /// # Errors
    ///
    /// Returns [`TokenStoreError`] if persisting the cleared file fails.
    pub fn clear(&self) -> Result<(), TokenStoreError> {
        let snapshot = {
            let mut cache = self.cache.lock();
            *cache = TokenFile::default();
            cache.clone()
        };
        self.save(&snapshot)
    }

    /// Persists the token file with restricted permissions.
    fn save(&self, file: &TokenFile) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| TokenStoreError::WriteFile {
                path: self.path.clone(),
                source,
            })?;
        }

        let contents =
            serde_json::to_string_pretty(file).map_err(|source| TokenStoreError::Parse {
                path: self.path.clone(),
                source,
            })?;

        // Write with restricted permissions
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut handle = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .map_err(|source| TokenStoreError::WriteFile {
                    path: self.path.clone(),
                    source,
                })?;
            handle
                .write_all(contents.as_bytes())
                .map_err(|source| TokenStoreError::WriteFile {
                    path: self.path.clone(),
                    source,
                })?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, contents).map_err(|source| TokenStoreError::WriteFile {
                path: self.path.clone(),
                source,
            })?;
        }

        Ok(())
    }
}
