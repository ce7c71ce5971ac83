//! Store handle and file layout.
//!
//! All persistence lives under one base directory:
//!
//! ```text
//! <base>/settings.json        scalar settings document
//! <base>/contacts.json        flat contact list
//! <base>/keys/keys.json       identity key file
//! <base>/chats/<peer>.json    one history file per peer (hex peer id)
//! ```
//!
//! Construction is explicit — nothing touches the filesystem until a
//! [`Store`] is opened, which keeps the whole crate testable against a
//! temporary directory.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use aparte_shared::types::PeerId;

use crate::error::{Result, StoreError};

pub struct Store {
    base: PathBuf,
}

impl Store {
    /// Open (or create) the store in the platform-appropriate data
    /// directory (e.g. `~/.local/share/aparte` on Linux).
    pub fn new() -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("org", "aparte", "aparte").ok_or(StoreError::NoDataDir)?;
        Self::open_at(project_dirs.data_dir())
    }

    /// Open (or create) the store at an explicit base path. Used by tests
    /// and custom directory layouts.
    pub fn open_at(base: &Path) -> Result<Self> {
        fs::create_dir_all(base)?;
        fs::create_dir_all(base.join("chats"))?;
        fs::create_dir_all(base.join("keys"))?;

        tracing::info!(path = %base.display(), "Opened store");
        Ok(Self {
            base: base.to_path_buf(),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base
    }

    pub(crate) fn chats_dir(&self) -> PathBuf {
        self.base.join("chats")
    }

    pub(crate) fn chat_path(&self, peer: &PeerId) -> PathBuf {
        self.chats_dir().join(format!("{}.json", peer.to_hex()))
    }

    pub(crate) fn contacts_path(&self) -> PathBuf {
        self.base.join("contacts.json")
    }

    pub(crate) fn settings_path(&self) -> PathBuf {
        self.base.join("settings.json")
    }

    pub(crate) fn identity_path(&self) -> PathBuf {
        self.base.join("keys").join("keys.json")
    }

    /// Whole-file atomic write: serialize, write a sibling temp file, then
    /// rename over the target. Readers never observe a partial document.
    pub(crate) fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(StoreError::Write)?;
        fs::rename(&tmp, path).map_err(StoreError::Write)
    }

    /// Read a JSON document, degrading to `None` on a missing, unreadable
    /// or corrupt file. Never fails.
    pub(crate) fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Option<T> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable file, ignoring");
                return None;
            }
        };

        match serde_json::from_str(&data) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Corrupt file, ignoring");
                None
            }
        }
    }

    /// As [`Store::read_json`], but with the type's default in place of `None`.
    pub(crate) fn read_json_or_default<T: DeserializeOwned + Default>(&self, path: &Path) -> T {
        self.read_json(path).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_at(dir.path()).unwrap();

        assert!(store.chats_dir().is_dir());
        assert!(dir.path().join("keys").is_dir());
    }

    #[test]
    fn test_read_degrades_on_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_at(dir.path()).unwrap();

        std::fs::write(store.contacts_path(), "{not json").unwrap();
        let list: crate::models::ContactList =
            store.read_json_or_default(&store.contacts_path());
        assert!(list.contacts.is_empty());
    }

    #[test]
    fn test_write_then_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_at(dir.path()).unwrap();

        let settings = crate::models::AppSettings::default();
        store.write_json(&store.settings_path(), &settings).unwrap();

        let back: crate::models::AppSettings =
            store.read_json_or_default(&store.settings_path());
        assert_eq!(back, settings);
    }
}
