//! Access and refresh token storage.
//!
//! Tokens are held in memory for the process or persisted to a small JSON
//! file so a CLI session survives between runs. Token strings are zeroized
//! when replaced, cleared or dropped.

use crate::error::ApiError;
use async_trait::async_trait;
use riskdash_realtime::TokenProvider;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};
use zeroize::Zeroize;

/// Storage for the session's tokens.
pub trait TokenStore: Send + Sync {
    /// Current access token.
    fn access_token(&self) -> Option<String>;

    /// Current refresh token.
    fn refresh_token(&self) -> Option<String>;

    /// Replaces the access token, and the refresh token when one is given.
    ///
    /// # Errors
    /// Returns an error if the tokens cannot be persisted.
    fn store(&self, access_token: &str, refresh_token: Option<&str>) -> Result<(), ApiError>;

    /// Forgets both tokens.
    ///
    /// # Errors
    /// Returns an error if persisted tokens cannot be removed.
    fn clear(&self) -> Result<(), ApiError>;
}

/// Token pair as kept in memory and on disk.
#[derive(Default, Serialize, Deserialize)]
struct TokenPair {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

impl TokenPair {
    fn update(&mut self, access_token: &str, refresh_token: Option<&str>) {
        self.access_token.zeroize();
        self.access_token = Some(access_token.to_string());
        if let Some(refresh) = refresh_token {
            self.refresh_token.zeroize();
            self.refresh_token = Some(refresh.to_string());
        }
    }

    fn wipe(&mut self) {
        self.access_token.zeroize();
        self.refresh_token.zeroize();
        self.access_token = None;
        self.refresh_token = None;
    }
}

impl Drop for TokenPair {
    fn drop(&mut self) {
        self.wipe();
    }
}

/// Tokens kept for the lifetime of the process.
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<TokenPair>,
}

impl MemoryTokenStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn access_token(&self) -> Option<String> {
        read(&self.tokens).access_token.clone()
    }

    fn refresh_token(&self) -> Option<String> {
        read(&self.tokens).refresh_token.clone()
    }

    fn store(&self, access_token: &str, refresh_token: Option<&str>) -> Result<(), ApiError> {
        write(&self.tokens).update(access_token, refresh_token);
        Ok(())
    }

    fn clear(&self) -> Result<(), ApiError> {
        write(&self.tokens).wipe();
        Ok(())
    }
}

/// Tokens persisted as JSON at a fixed path.
pub struct FileTokenStore {
    path: PathBuf,
    tokens: RwLock<TokenPair>,
}

impl FileTokenStore {
    /// Opens the store at `path`, loading any tokens already saved there.
    ///
    /// A missing file is an empty store. An unreadable one is logged and
    /// treated as empty.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ApiError> {
        let path = path.into();
        let tokens = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Discarding malformed token file");
                TokenPair::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => TokenPair::default(),
            Err(e) => return Err(ApiError::Storage(format!("{}: {e}", path.display()))),
        };
        debug!(path = %path.display(), "Token store opened");
        Ok(Self {
            path,
            tokens: RwLock::new(tokens),
        })
    }

    /// `$RISKDASH_TOKEN_FILE`, else `$HOME/.config/riskdash/tokens.json`.
    #[must_use]
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("RISKDASH_TOKEN_FILE")
            && !path.is_empty()
        {
            return PathBuf::from(path);
        }
        let home = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map_or_else(|| PathBuf::from("."), PathBuf::from);
        home.join(".config").join("riskdash").join("tokens.json")
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, tokens: &TokenPair) -> Result<(), ApiError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| storage_error(&self.path, e))?;
        }
        let mut bytes = serde_json::to_vec(tokens)?;
        let written = open_private(&self.path).and_then(|mut file| file.write_all(&bytes));
        bytes.zeroize();
        written.map_err(|e| storage_error(&self.path, e))
    }
}

impl TokenStore for FileTokenStore {
    fn access_token(&self) -> Option<String> {
        read(&self.tokens).access_token.clone()
    }

    fn refresh_token(&self) -> Option<String> {
        read(&self.tokens).refresh_token.clone()
    }

    fn store(&self, access_token: &str, refresh_token: Option<&str>) -> Result<(), ApiError> {
        let mut tokens = write(&self.tokens);
        tokens.update(access_token, refresh_token);
        self.persist(&tokens)
    }

    fn clear(&self) -> Result<(), ApiError> {
        write(&self.tokens).wipe();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error(&self.path, e)),
        }
    }
}

/// Exposes a [`TokenStore`] to the realtime client.
#[derive(Clone)]
pub struct TokenStoreProvider(Arc<dyn TokenStore>);

impl TokenStoreProvider {
    /// Creates a new provider reading from `store`.
    #[must_use]
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self(store)
    }
}

#[async_trait]
impl TokenProvider for TokenStoreProvider {
    async fn access_token(&self) -> Option<String> {
        self.0.access_token()
    }
}

fn read(lock: &RwLock<TokenPair>) -> std::sync::RwLockReadGuard<'_, TokenPair> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write(lock: &RwLock<TokenPair>) -> std::sync::RwLockWriteGuard<'_, TokenPair> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn storage_error(path: &Path, err: std::io::Error) -> ApiError {
    ApiError::Storage(format!("{}: {err}", path.display()))
}

/// Opens the token file for rewriting, readable by the owner only.
///
/// A new file is created with mode 0600. An existing file is narrowed to 0600
/// before it is truncated, so tokens are never written to a wider mode.
#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
    if path.exists()
        && let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600))
    {
        warn!(path = %path.display(), error = %e, "Could not restrict token file permissions");
    }
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_keeps_refresh_on_access_update() {
        let store = MemoryTokenStore::new();
        store.store("access-1", Some("refresh-1")).unwrap();
        store.store("access-2", None).unwrap();
        assert_eq!(store.access_token().as_deref(), Some("access-2"));
        assert_eq!(store.refresh_token().as_deref(), Some("refresh-1"));

        store.clear().unwrap();
        assert!(store.access_token().is_none());
        assert!(store.refresh_token().is_none());
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("tokens.json");

        let store = FileTokenStore::open(&path).unwrap();
        assert!(store.access_token().is_none());
        store.store("access", Some("refresh")).unwrap();
        drop(store);

        let reopened = FileTokenStore::open(&path).unwrap();
        assert_eq!(reopened.access_token().as_deref(), Some("access"));
        assert_eq!(reopened.refresh_token().as_deref(), Some("refresh"));

        reopened.clear().unwrap();
        assert!(!path.exists());
        reopened.clear().unwrap();
    }

    #[test]
    fn test_malformed_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tokens.json");
        fs::write(&path, b"not json").unwrap();
        let store = FileTokenStore::open(&path).unwrap();
        assert!(store.access_token().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tokens.json");
        FileTokenStore::open(&path)
            .unwrap()
            .store("a", None)
            .unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_existing_wide_file_is_narrowed() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tokens.json");
        fs::write(&path, b"{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileTokenStore::open(&path).unwrap();
        store.store("access", Some("refresh")).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(FileTokenStore::open(&path).unwrap().access_token().as_deref(), Some("access"));
    }

    #[tokio::test]
    async fn test_provider_reads_current_token() {
        let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
        let provider = TokenStoreProvider::new(store.clone());
        assert!(provider.access_token().await.is_none());
        store.store("jwt", None).unwrap();
        assert_eq!(provider.access_token().await.as_deref(), Some("jwt"));
    }
}
