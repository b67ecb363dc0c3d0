//! Durable storage for the backend credential.
//!
//! The credential lives in a single named slot. An absent or empty slot means
//! the user has not authenticated yet.

use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{StoreError, io_error};

/// Opaque session token issued by the backend.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let visible: String = self.0.chars().take(6).collect();
        write!(f, "Credential({visible}..)")
    }
}

pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<Credential>, StoreError>;
    fn save(&self, credential: &Credential) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

/// File-backed slot at `<root>/<slot>`.
#[derive(Clone, Debug)]
pub struct FsCredentialStore {
    path: PathBuf,
}

impl FsCredentialStore {
    pub fn open(root: impl AsRef<Path>, slot: &str) -> Result<Self, StoreError> {
        let root = root.as_ref();
        fs::create_dir_all(root).map_err(|e| io_error(root, e))?;
        Ok(Self {
            path: root.join(slot),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FsCredentialStore {
    fn load(&self) -> Result<Option<Credential>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Credential::new(token)))
                }
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(&self.path, err)),
        }
    }

    fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        let tmp = self.path.with_extension("tmp");
        let mut file = fs::File::create(&tmp).map_err(|e| io_error(&tmp, e))?;
        file.write_all(credential.as_str().as_bytes())
            .map_err(|e| io_error(&tmp, e))?;
        file.sync_all().map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| io_error(&self.path, e))
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(&self.path, err)),
        }
    }
}

/// In-memory slot; clones share the same slot.
#[derive(Clone, Default)]
pub struct MemCredentialStore {
    slot: Arc<RwLock<Option<Credential>>>,
}

impl fmt::Debug for MemCredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let present = self
            .slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some();
        f.debug_struct("MemCredentialStore")
            .field("present", &present)
            .finish()
    }
}

impl MemCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(credential))),
        }
    }
}

impl CredentialStore for MemCredentialStore {
    fn load(&self) -> Result<Option<Credential>, StoreError> {
        Ok(self
            .slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn fs_slot_survives_reopen_and_clears() {
        let tmp = TempDir::new().unwrap();
        let store = FsCredentialStore::open(tmp.path().join("state"), "token").unwrap();
        assert_eq!(store.load().unwrap(), None);

        store.save(&Credential::new("abc-123")).unwrap();
        let reopened = FsCredentialStore::open(tmp.path().join("state"), "token").unwrap();
        assert_eq!(reopened.load().unwrap(), Some(Credential::new("abc-123")));

        reopened.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        reopened.clear().unwrap();
    }

    #[test]
    fn blank_slot_reads_as_absent() {
        let tmp = TempDir::new().unwrap();
        let store = FsCredentialStore::open(tmp.path(), "token").unwrap();
        fs::write(store.path(), "\n").unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn mem_clones_share_slot() {
        let store = MemCredentialStore::new();
        let other = store.clone();
        store.save(&Credential::new("x")).unwrap();
        assert_eq!(other.load().unwrap(), Some(Credential::new("x")));
    }

    #[test]
    fn debug_output_hides_most_of_the_token() {
        let shown = format!("{:?}", Credential::new("18f2a9c0-alice-deadbeef"));
        assert_eq!(shown, "Credential(18f2a9..)");
    }
}
