//! The flat contact list: known peer public keys in insertion order.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use tracing::info;

use aparte_shared::constants::KEY_SIZE;

use crate::error::{Result, StoreError};
use crate::models::{Contact, ContactList};
use crate::store::Store;

impl Store {
    /// Add a contact by its base64 public key.
    ///
    /// Rejects keys that are not valid base64 or decode to fewer than 32
    /// bytes, and keys that are already present. A failed add leaves the
    /// list untouched.
    pub fn add_contact(&self, public_key: &str) -> Result<Contact> {
        let public_key = public_key.trim();
        let decoded = BASE64
            .decode(public_key)
            .map_err(|_| StoreError::InvalidPublicKey("not valid base64".into()))?;
        if decoded.len() < KEY_SIZE {
            return Err(StoreError::InvalidPublicKey(format!(
                "key must be at least {KEY_SIZE} bytes, got {}",
                decoded.len()
            )));
        }

        let mut list: ContactList = self.read_json_or_default(&self.contacts_path());
        if list.contacts.iter().any(|c| c.public_key == public_key) {
            return Err(StoreError::DuplicateContact);
        }

        let contact = Contact {
            public_key: public_key.to_string(),
            added_at: Utc::now(),
        };
        list.contacts.push(contact.clone());
        self.write_json(&self.contacts_path(), &list)?;

        info!(key = &public_key[..8.min(public_key.len())], "Added contact");
        Ok(contact)
    }

    /// All contacts in insertion order. Degrades to empty on a bad file.
    pub fn list_contacts(&self) -> Vec<Contact> {
        self.read_json_or_default::<ContactList>(&self.contacts_path())
            .contacts
    }

    /// Remove a contact by exact key match. Returns whether one was removed.
    pub fn delete_contact(&self, public_key: &str) -> Result<bool> {
        let mut list: ContactList = self.read_json_or_default(&self.contacts_path());
        let before = list.contacts.len();
        list.contacts.retain(|c| c.public_key != public_key);

        if list.contacts.len() == before {
            return Ok(false);
        }
        self.write_json(&self.contacts_path(), &list)?;
        Ok(true)
    }
}
