//! Persistence port for the bearer token.
//!
//! The decisions API hands out one opaque token per login. Front ends keep it in
//! a small key-value store under the fixed key [`TOKEN_KEY`], the same way a
//! browser keeps it in local storage.

use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::debug;

use crate::error::TokenStoreError;

pub const TOKEN_KEY: &str = "token";
const STORAGE_FILE_NAME: &str = "storage.json";
const APP_DIR_NAME: &str = "lifeecho";

pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, TokenStoreError>;
    fn save(&self, token: &str) -> Result<(), TokenStoreError>;
    fn clear(&self) -> Result<(), TokenStoreError>;
}

/// Keeps the token in process memory only.
#[derive(Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, TokenStoreError> {
        let guard = self.slot.lock().unwrap_or_else(|p| p.into_inner());
        Ok(guard.clone())
    }

    fn save(&self, token: &str) -> Result<(), TokenStoreError> {
        let mut guard = self.slot.lock().unwrap_or_else(|p| p.into_inner());
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        let mut guard = self.slot.lock().unwrap_or_else(|p| p.into_inner());
        *guard = None;
        Ok(())
    }
}

/// JSON key-value file holding the token under [`TOKEN_KEY`].
///
/// Other keys in the file are preserved. Writes go through a temporary file and
/// a rename so a crash never leaves a half-written store behind.
pub struct FileTokenStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `<data_local_dir>/lifeecho/storage.json`
    pub fn default_path() -> Result<PathBuf, TokenStoreError> {
        let base = dirs::data_local_dir().ok_or(TokenStoreError::NoDataDir)?;
        Ok(base.join(APP_DIR_NAME).join(STORAGE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, TokenStoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(source) => return Err(self.io_error(source)),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|source| TokenStoreError::Corrupt {
            path: self.path.display().to_string(),
            source,
        })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }

        let body = serde_json::to_vec_pretty(entries).map_err(|source| TokenStoreError::Corrupt {
            path: self.path.display().to_string(),
            source,
        })?;

        let tmp_path = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp_path).map_err(|source| self.io_error(source))?;
        file.write_all(&body)
            .and_then(|_| file.sync_all())
            .map_err(|source| self.io_error(source))?;
        drop(file);
        restrict_permissions(&tmp_path);

        fs::rename(&tmp_path, &self.path).map_err(|source| self.io_error(source))?;
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> TokenStoreError {
        TokenStoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, TokenStoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut entries = self.read_entries()?;
        Ok(entries.remove(TOKEN_KEY).filter(|token| !token.is_empty()))
    }

    fn save(&self, token: &str) -> Result<(), TokenStoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut entries = self.read_entries()?;
        entries.insert(TOKEN_KEY.to_string(), token.to_string());
        self.write_entries(&entries)?;
        debug!("token_store: saved token path={}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        if !self.path.exists() {
            return Ok(());
        }
        let entries = match self.read_entries() {
            Ok(mut entries) => {
                if entries.remove(TOKEN_KEY).is_none() {
                    return Ok(());
                }
                entries
            }
            // A corrupt store cannot hold a usable token; start over.
            Err(TokenStoreError::Corrupt { .. }) => BTreeMap::new(),
            Err(err) => return Err(err),
        };
        self.write_entries(&entries)?;
        debug!("token_store: cleared token path={}", self.path.display());
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}

#[cfg(test)]
#[path = "tests/token_store_tests.rs"]
mod tests;
