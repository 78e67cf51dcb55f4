use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// Fixed relative path of the credential record. Its existence decides
/// whether the application starts on the register or the login view.
pub const CREDENTIAL_FILE: &str = "user.data";

/// The single username/password pair gating the chat view. The on-disk
/// layout is internal to this module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CredentialRecord {
    username: String,
    password: String,
}

#[derive(Debug)]
pub enum IdentityError {
    /// Registration submitted with an empty or whitespace-only username.
    EmptyUsername,

    /// Registration submitted with an empty or whitespace-only password.
    EmptyPassword,

    /// The record file could not be read or written.
    Storage { path: PathBuf, source: io::Error },

    /// The record file exists but does not decode as a credential record.
    Malformed {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// The record could not be encoded for persistence.
    Encode { source: toml::ser::Error },
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityError::EmptyUsername => write!(f, "Username cannot be empty"),
            IdentityError::EmptyPassword => write!(f, "Password cannot be empty"),
            IdentityError::Storage { path, source } => {
                write!(
                    f,
                    "Failed to access credential record at {}: {}",
                    path.display(),
                    source
                )
            }
            IdentityError::Malformed { path, source } => {
                write!(
                    f,
                    "Credential record at {} is not readable: {}",
                    path.display(),
                    source
                )
            }
            IdentityError::Encode { source } => {
                write!(f, "Failed to encode credential record: {}", source)
            }
        }
    }
}

impl StdError for IdentityError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            IdentityError::Storage { source, .. } => Some(source),
            IdentityError::Malformed { source, .. } => Some(source),
            IdentityError::Encode { source } => Some(source),
            _ => None,
        }
    }
}

/// File-backed store for the single credential record. All reads and
/// comparisons of stored credentials happen here, so the encoding can be
/// hardened without touching the view state machine.
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::at_path(PathBuf::from(CREDENTIAL_FILE))
    }

    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Whether a record has been persisted. Existence alone gates the
    /// initial view; an unreadable record still counts as present.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Validate and persist a credential record, replacing any previous
    /// one. Validation failures leave the filesystem untouched.
    pub fn register(&self, username: &str, password: &str) -> Result<(), IdentityError> {
        if username.trim().is_empty() {
            return Err(IdentityError::EmptyUsername);
        }
        if password.trim().is_empty() {
            return Err(IdentityError::EmptyPassword);
        }

        let record = CredentialRecord {
            username: username.to_string(),
            password: password.to_string(),
        };
        let contents =
            toml::to_string_pretty(&record).map_err(|source| IdentityError::Encode { source })?;
        self.write_atomically(&contents)?;

        info!(user = %record.username, "credential record written");
        Ok(())
    }

    /// Compare a login attempt against the persisted record. A missing
    /// record reports `Ok(false)`; callers are expected to present that
    /// identically to a mismatch.
    pub fn verify(&self, username: &str, password: &str) -> Result<bool, IdentityError> {
        match self.load()? {
            Some(record) => Ok(record.username == username && record.password == password),
            None => Ok(false),
        }
    }

    fn load(&self) -> Result<Option<CredentialRecord>, IdentityError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path).map_err(|source| IdentityError::Storage {
            path: self.path.clone(),
            source,
        })?;
        let record = toml::from_str(&contents).map_err(|source| IdentityError::Malformed {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(record))
    }

    fn write_atomically(&self, contents: &str) -> Result<(), IdentityError> {
        let storage_error = |source: io::Error| IdentityError::Storage {
            path: self.path.clone(),
            source,
        };

        let dir = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(storage_error)?;

        let mut temp_file = NamedTempFile::new_in(dir).map_err(storage_error)?;
        temp_file
            .write_all(contents.as_bytes())
            .map_err(storage_error)?;
        temp_file.as_file_mut().sync_all().map_err(storage_error)?;
        temp_file
            .persist(&self.path)
            .map_err(|err| storage_error(err.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store(dir: &TempDir) -> CredentialStore {
        CredentialStore::at_path(dir.path().join("user.data"))
    }

    #[test]
    fn register_then_verify_matches() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = test_store(&temp_dir);

        store.register("alice", "secret").expect("register failed");
        assert!(store.verify("alice", "secret").expect("verify failed"));
    }

    #[test]
    fn wrong_password_does_not_verify() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = test_store(&temp_dir);

        store.register("alice", "secret").expect("register failed");
        assert!(!store.verify("alice", "wrong").expect("verify failed"));
    }

    #[test]
    fn verify_before_any_registration_is_false() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = test_store(&temp_dir);

        assert!(!store.verify("bob", "anything").expect("verify failed"));
    }

    #[test]
    fn re_registering_replaces_the_record() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = test_store(&temp_dir);

        store.register("alice", "secret").expect("register failed");
        store.register("bob", "hunter2").expect("register failed");

        assert!(!store.verify("alice", "secret").expect("verify failed"));
        assert!(store.verify("bob", "hunter2").expect("verify failed"));
    }

    #[test]
    fn empty_username_is_rejected_without_persisting() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = test_store(&temp_dir);

        let err = store.register("", "secret").expect_err("register should fail");
        assert!(matches!(err, IdentityError::EmptyUsername));
        assert!(!store.exists());
    }

    #[test]
    fn blank_password_is_rejected_without_persisting() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = test_store(&temp_dir);

        let err = store.register("alice", "   ").expect_err("register should fail");
        assert!(matches!(err, IdentityError::EmptyPassword));
        assert!(!store.exists());
    }

    #[test]
    fn exists_reflects_record_presence() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = test_store(&temp_dir);

        assert!(!store.exists());
        store.register("alice", "secret").expect("register failed");
        assert!(store.exists());
    }

    #[test]
    fn comparison_is_exact() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = test_store(&temp_dir);

        store.register("Alice", "secret").expect("register failed");
        assert!(!store.verify("alice", "secret").expect("verify failed"));
        assert!(!store.verify("Alice", "Secret").expect("verify failed"));
        assert!(store.verify("Alice", "secret").expect("verify failed"));
    }
}
