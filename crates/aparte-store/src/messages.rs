//! Per-peer chat history with lazy expiry sweeping.
//!
//! Expiry is enforced on read: `load_history` filters out every message
//! whose `timestamp + expiry` has passed and, if anything was filtered,
//! immediately rewrites the file with the survivors. There is no background
//! timer — callers wanting periodic compaction invoke [`Store::sweep_expired`].

use std::fs;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use aparte_shared::constants::MESSAGE_EXPIRY_SECS;
use aparte_shared::protocol::SealedEnvelope;
use aparte_shared::types::{PeerId, Sender};

use crate::error::{Result, StoreError};
use crate::models::{ChatHistory, ChatMessage};
use crate::store::Store;

impl Store {
    /// Append one message to a peer's history and rewrite the file.
    ///
    /// `expiry` of `None` takes the configured default from settings.
    /// Either way the value is capped at [`MESSAGE_EXPIRY_SECS`].
    pub fn append_message(
        &self,
        peer: &PeerId,
        sender: Sender,
        body: SealedEnvelope,
        expiry: Option<u64>,
    ) -> Result<ChatMessage> {
        let expiry = expiry
            .unwrap_or_else(|| self.settings().default_expiry_secs)
            .min(MESSAGE_EXPIRY_SECS);

        let mut messages = self.load_history(peer)?;
        let message = ChatMessage {
            id: Uuid::new_v4(),
            sender,
            body,
            timestamp: Utc::now(),
            expiry: Some(expiry),
        };
        messages.push(message.clone());

        self.write_history(peer, messages)?;
        debug!(peer = %peer.short(), msg_id = %message.id, "Appended message");
        Ok(message)
    }

    /// Load a peer's history, dropping expired messages as a side effect.
    ///
    /// The read path never fails (missing or corrupt files yield an empty
    /// history); only the compaction rewrite can error.
    pub fn load_history(&self, peer: &PeerId) -> Result<Vec<ChatMessage>> {
        let Some(history) = self.read_json::<ChatHistory>(&self.chat_path(peer)) else {
            return Ok(Vec::new());
        };

        let now = Utc::now();
        let total = history.messages.len();
        let surviving: Vec<ChatMessage> = history
            .messages
            .into_iter()
            .filter(|m| !m.is_expired(now))
            .collect();

        if surviving.len() != total {
            debug!(
                peer = %peer.short(),
                expired = total - surviving.len(),
                "Compacting expired messages"
            );
            self.write_history(peer, surviving.clone())?;
        }

        Ok(surviving)
    }

    /// Delete one peer's history file. Not an error if it never existed.
    pub fn delete_chat(&self, peer: &PeerId) -> Result<()> {
        match fs::remove_file(self.chat_path(peer)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Write(e)),
        }
    }

    /// Delete every history file. Idempotent.
    pub fn clear_all_chats(&self) -> Result<()> {
        for peer in self.all_chats() {
            self.delete_chat(&peer)?;
        }
        Ok(())
    }

    /// Every peer id with a history file on disk.
    pub fn all_chats(&self) -> Vec<PeerId> {
        let Ok(entries) = fs::read_dir(self.chats_dir()) else {
            return Vec::new();
        };

        let mut peers: Vec<PeerId> = entries
            .flatten()
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension()? != "json" {
                    return None;
                }
                PeerId::from_hex(path.file_stem()?.to_str()?).ok()
            })
            .collect();
        peers.sort_by_key(|p| p.0);
        peers
    }

    /// Compact every known history file by loading it.
    pub fn sweep_expired(&self) -> Result<()> {
        for peer in self.all_chats() {
            self.load_history(&peer)?;
        }
        Ok(())
    }

    fn write_history(&self, peer: &PeerId, messages: Vec<ChatMessage>) -> Result<()> {
        let history = ChatHistory {
            peer_id: peer.to_hex(),
            messages,
            last_updated: Utc::now(),
        };
        self.write_json(&self.chat_path(peer), &history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn envelope(byte: u8) -> SealedEnvelope {
        SealedEnvelope {
            ciphertext: vec![byte; 8],
            nonce: vec![0; 24],
            signature: vec![0; 64],
        }
    }

    fn test_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_at(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_append_and_load() {
        let (_dir, store) = test_store();
        let peer = PeerId([1u8; 32]);

        store
            .append_message(&peer, Sender::Me, envelope(1), None)
            .unwrap();
        store
            .append_message(&peer, Sender::Peer(peer), envelope(2), Some(60))
            .unwrap();

        let history = store.load_history(&peer).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].sender, Sender::Me);
        assert_eq!(history[1].expiry, Some(60));
    }

    #[test]
    fn test_expiry_capped_at_retention_limit() {
        let (_dir, store) = test_store();
        let peer = PeerId([1u8; 32]);

        let message = store
            .append_message(&peer, Sender::Me, envelope(1), Some(MESSAGE_EXPIRY_SECS * 10))
            .unwrap();
        assert_eq!(message.expiry, Some(MESSAGE_EXPIRY_SECS));
    }

    #[test]
    fn test_missing_history_is_empty() {
        let (_dir, store) = test_store();
        assert!(store.load_history(&PeerId([9u8; 32])).unwrap().is_empty());
    }

    #[test]
    fn test_expired_messages_are_swept_and_compacted() {
        let (_dir, store) = test_store();
        let peer = PeerId([1u8; 32]);

        // Write a history containing one already-expired message directly,
        // avoiding a sleep in the test.
        let now = Utc::now();
        let history = ChatHistory {
            peer_id: peer.to_hex(),
            messages: vec![
                ChatMessage {
                    id: Uuid::new_v4(),
                    sender: Sender::Me,
                    body: envelope(1),
                    timestamp: now - Duration::seconds(120),
                    expiry: Some(60),
                },
                ChatMessage {
                    id: Uuid::new_v4(),
                    sender: Sender::Me,
                    body: envelope(2),
                    timestamp: now,
                    expiry: Some(3600),
                },
                ChatMessage {
                    id: Uuid::new_v4(),
                    sender: Sender::Me,
                    body: envelope(3),
                    timestamp: now - Duration::days(365),
                    expiry: None,
                },
            ],
            last_updated: now,
        };
        store.write_json(&store.chat_path(&peer), &history).unwrap();

        let loaded = store.load_history(&peer).unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.iter().all(|m| !m.is_expired(Utc::now())));

        // Second load returns the identical, already-compacted result.
        let again = store.load_history(&peer).unwrap();
        assert_eq!(again, loaded);

        // The file itself no longer contains the expired record.
        let on_disk: ChatHistory = store.read_json(&store.chat_path(&peer)).unwrap();
        assert_eq!(on_disk.messages.len(), 2);
    }

    #[test]
    fn test_huge_expiry_on_disk_loads_without_crashing() {
        let (_dir, store) = test_store();
        let peer = PeerId([1u8; 32]);

        // A parseable file can carry an expiry far beyond what the
        // append path would ever write; reading it must still degrade
        // gracefully instead of crashing.
        let history = ChatHistory {
            peer_id: peer.to_hex(),
            messages: vec![ChatMessage {
                id: Uuid::new_v4(),
                sender: Sender::Me,
                body: envelope(1),
                timestamp: Utc::now(),
                expiry: Some(10_000_000_000_000_000),
            }],
            last_updated: Utc::now(),
        };
        store.write_json(&store.chat_path(&peer), &history).unwrap();

        let loaded = store.load_history(&peer).unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn test_delete_and_clear_idempotent() {
        let (_dir, store) = test_store();
        let peer = PeerId([1u8; 32]);

        store.delete_chat(&peer).unwrap(); // nothing there yet

        store
            .append_message(&peer, Sender::Me, envelope(1), None)
            .unwrap();
        store
            .append_message(&PeerId([2u8; 32]), Sender::Me, envelope(2), None)
            .unwrap();
        assert_eq!(store.all_chats().len(), 2);

        store.delete_chat(&peer).unwrap();
        assert_eq!(store.all_chats().len(), 1);

        store.clear_all_chats().unwrap();
        store.clear_all_chats().unwrap();
        assert!(store.all_chats().is_empty());
    }

    #[test]
    fn test_sweep_compacts_every_chat() {
        let (_dir, store) = test_store();
        let now = Utc::now();

        for byte in [1u8, 2u8] {
            let peer = PeerId([byte; 32]);
            let history = ChatHistory {
                peer_id: peer.to_hex(),
                messages: vec![ChatMessage {
                    id: Uuid::new_v4(),
                    sender: Sender::Me,
                    body: envelope(byte),
                    timestamp: now - Duration::seconds(10),
                    expiry: Some(1),
                }],
                last_updated: now,
            };
            store.write_json(&store.chat_path(&peer), &history).unwrap();
        }

        store.sweep_expired().unwrap();

        for byte in [1u8, 2u8] {
            let on_disk: ChatHistory = store
                .read_json(&store.chat_path(&PeerId([byte; 32])))
                .unwrap();
            assert!(on_disk.messages.is_empty());
        }
    }

    #[test]
    fn test_corrupt_history_degrades_to_empty() {
        let (_dir, store) = test_store();
        let peer = PeerId([1u8; 32]);

        std::fs::write(store.chat_path(&peer), "no json here").unwrap();
        assert!(store.load_history(&peer).unwrap().is_empty());
    }
}
