//! Identity key file persistence.
//!
//! All four key values are written as one document so a restart can restore
//! the full identity; the private halves are fed back into
//! [`Identity::from_secret_bytes`] on load.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use tracing::{info, warn};

use aparte_shared::identity::Identity;

use crate::error::Result;
use crate::models::{StoredIdentity, StoredKeys};
use crate::store::Store;

impl Store {
    /// Persist an identity (all four key values plus a creation timestamp).
    pub fn save_identity(&self, identity: &Identity) -> Result<()> {
        let public = identity.public_identity();
        let stored = StoredIdentity {
            keys: StoredKeys {
                public_key: BASE64.encode(public.encryption_key),
                verify_key: BASE64.encode(public.verify_key),
                private_key: BASE64.encode(identity.encryption_secret_bytes()),
                signing_key: BASE64.encode(identity.signing_secret_bytes()),
            },
            created_at: Utc::now(),
        };

        self.write_json(&self.identity_path(), &stored)?;
        info!(peer = %identity.peer_id().short(), "Saved identity");
        Ok(())
    }

    /// Restore the persisted identity, or `None` when no usable identity
    /// file exists (missing, corrupt, or carrying malformed key material).
    pub fn load_identity(&self) -> Option<Identity> {
        let stored: StoredIdentity = self.read_json(&self.identity_path())?;

        let private_key = BASE64.decode(&stored.keys.private_key).ok()?;
        let signing_key = BASE64.decode(&stored.keys.signing_key).ok()?;

        match Identity::from_secret_bytes(&private_key, &signing_key) {
            Ok(identity) => {
                info!(peer = %identity.peer_id().short(), "Loaded identity");
                Some(identity)
            }
            Err(e) => {
                warn!(error = %e, "Identity file has invalid key material");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_at(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_save_load_roundtrip() {
        let (_dir, store) = test_store();
        let identity = Identity::generate();

        store.save_identity(&identity).unwrap();
        let restored = store.load_identity().unwrap();

        assert_eq!(restored.public_identity(), identity.public_identity());
    }

    #[test]
    fn test_missing_and_corrupt_files_yield_none() {
        let (_dir, store) = test_store();
        assert!(store.load_identity().is_none());

        std::fs::write(store.identity_path(), "{\"keys\":{}}").unwrap();
        assert!(store.load_identity().is_none());
    }

    #[test]
    fn test_truncated_key_material_rejected() {
        let (_dir, store) = test_store();
        let identity = Identity::generate();
        store.save_identity(&identity).unwrap();

        let mut stored: StoredIdentity = store.read_json(&store.identity_path()).unwrap();
        stored.keys.private_key = BASE64.encode([0u8; 16]);
        store.write_json(&store.identity_path(), &stored).unwrap();

        assert!(store.load_identity().is_none());
    }
}
