//! Durable storage for the access/refresh token pair.
//!
//! Every backend holds exactly three string entries keyed `accessToken`,
//! `refreshToken` and `userEmail`. A store missing any one of them has no
//! credential.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use keyring::Entry;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USER_EMAIL_KEY: &str = "userEmail";

const ENTRY_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_EMAIL_KEY];

/// Credential file name in the data directory
const CREDENTIALS_FILE: &str = "credentials.json";

/// Keychain service name
pub const KEYRING_SERVICE: &str = "slotkeeper";

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
    pub user_email: String,
}

impl Credential {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        user_email: impl Into<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            user_email: user_email.into(),
        }
    }

    /// All three entries are non-empty. Only complete credentials are ever
    /// stored or loaded.
    pub fn is_complete(&self) -> bool {
        !self.access_token.is_empty()
            && !self.refresh_token.is_empty()
            && !self.user_email.is_empty()
    }

    /// Build a credential from the three raw entries. Missing or empty
    /// entries mean there is no session.
    fn from_entries(
        access_token: Option<String>,
        refresh_token: Option<String>,
        user_email: Option<String>,
    ) -> Option<Self> {
        let present = |v: Option<String>| v.filter(|s| !s.is_empty());
        Some(Self {
            access_token: present(access_token)?,
            refresh_token: present(refresh_token)?,
            user_email: present(user_email)?,
        })
    }
}

// Tokens never end up in logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("user_email", &self.user_email)
            .finish()
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to write credential file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode credentials: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Key/value storage for the current credential.
///
/// Operations are synchronous and idempotent. No validation of token
/// contents happens here.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Option<Credential>;

    fn save(&self, credential: &Credential) -> Result<(), StoreError>;

    fn clear(&self) -> Result<(), StoreError>;

    fn access_token(&self) -> Option<String> {
        self.load().map(|c| c.access_token)
    }

    fn has_refresh_token(&self) -> bool {
        self.load().is_some_and(|c| !c.refresh_token.is_empty())
    }
}

// ============================================================================
// In-memory backend
// ============================================================================

/// Process-lifetime store, used for ephemeral sessions and tests.
#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            inner: Mutex::new(Some(credential)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<Credential> {
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.clone().filter(Credential::is_complete)
    }

    fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *guard = None;
        Ok(())
    }
}

// ============================================================================
// File backend
// ============================================================================

/// On-disk layout. Every field is optional so a hand-edited or partially
/// written file still parses and simply loads as "no session".
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredEntries {
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(rename = "refreshToken", skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(rename = "userEmail", skip_serializing_if = "Option::is_none")]
    user_email: Option<String>,
}

/// JSON file holding the three entries, written whole on every save.
pub struct FileCredentialStore {
    path: PathBuf,
    // Serializes writers within this process.
    write_lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self::at_path(data_dir.as_ref().join(CREDENTIALS_FILE))
    }

    pub fn at_path(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Option<StoredEntries> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(error = %e, path = ?self.path, "Failed to read credential file");
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(entries) => Some(entries),
            Err(e) => {
                warn!(error = %e, path = ?self.path, "Failed to parse credential file");
                None
            }
        }
    }

    /// Write to a sibling temp file that is owner-only from creation, then
    /// rename it over the credential file.
    fn write_restricted(path: &Path, contents: &str) -> std::io::Result<()> {
        let tmp = path.with_extension("json.tmp");
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
            options.mode(0o600);
            // A leftover temp file keeps its old mode; tighten it before writing.
            if tmp.exists() {
                std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))?;
            }
        }

        let mut file = options.open(&tmp)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        drop(file);
        std::fs::rename(&tmp, path)
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Option<Credential> {
        let entries = self.read_entries()?;
        let credential =
            Credential::from_entries(entries.access_token, entries.refresh_token, entries.user_email);
        if credential.is_none() {
            debug!(path = ?self.path, "Credential file is incomplete, treating as no session");
        }
        credential
    }

    fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let entries = StoredEntries {
            access_token: Some(credential.access_token.clone()),
            refresh_token: Some(credential.refresh_token.clone()),
            user_email: Some(credential.user_email.clone()),
        };
        let contents = serde_json::to_string_pretty(&entries)?;
        Self::write_restricted(&self.path, &contents)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// OS keychain backend
// ============================================================================

/// One keychain entry per key, all under the same service name.
pub struct KeyringCredentialStore {
    service: String,
}

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self::with_service(KEYRING_SERVICE)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, keyring::Error> {
        Entry::new(&self.service, key)
    }

    fn get(&self, key: &str) -> Option<String> {
        match self.entry(key).and_then(|entry| entry.get_password()) {
            Ok(value) => Some(value),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!(error = %e, key, "Failed to read keychain entry");
                None
            }
        }
    }

    fn remove(&self, key: &str) -> Result<(), keyring::Error> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn load(&self) -> Option<Credential> {
        Credential::from_entries(
            self.get(ACCESS_TOKEN_KEY),
            self.get(REFRESH_TOKEN_KEY),
            self.get(USER_EMAIL_KEY),
        )
    }

    fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        write_entries(
            credential,
            |key, value| self.entry(key)?.set_password(value),
            |key| self.remove(key),
        )?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        for key in ENTRY_KEYS {
            self.remove(key)?;
        }
        Ok(())
    }
}

/// Write the three entries one by one. If any write fails, all three are
/// removed, so a failed save leaves no credential instead of a mix of old
/// and new entries.
fn write_entries<E: fmt::Display>(
    credential: &Credential,
    mut set: impl FnMut(&str, &str) -> Result<(), E>,
    mut remove: impl FnMut(&str) -> Result<(), E>,
) -> Result<(), E> {
    let values = [
        credential.access_token.as_str(),
        credential.refresh_token.as_str(),
        credential.user_email.as_str(),
    ];
    for (key, value) in ENTRY_KEYS.into_iter().zip(values) {
        if let Err(e) = set(key, value) {
            warn!(error = %e, key, "Failed to write keychain entry, removing partial credential");
            for key in ENTRY_KEYS {
                if let Err(e) = remove(key) {
                    warn!(error = %e, key, "Failed to remove keychain entry");
                }
            }
            return Err(e);
        }
    }
    Ok(())
}
