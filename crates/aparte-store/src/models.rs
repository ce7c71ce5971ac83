//! Domain model structs persisted as JSON documents.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be written
//! to disk as-is and handed to the UI layer unchanged.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aparte_shared::constants::DEFAULT_MESSAGE_EXPIRY_SECS;
use aparte_shared::protocol::SealedEnvelope;
use aparte_shared::types::Sender;

// ---------------------------------------------------------------------------
// Chat history
// ---------------------------------------------------------------------------

/// A single chat message. The body is always stored sealed — a stolen
/// history file alone is not readable. Immutable once stored; destroyed
/// only by expiry or explicit deletion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// Unique message identifier.
    pub id: Uuid,
    /// `"me"` or the peer's hex id.
    pub sender: Sender,
    /// The sealed envelope as produced by the crypto engine.
    pub body: SealedEnvelope,
    /// When the message was created locally.
    pub timestamp: DateTime<Utc>,
    /// Seconds after `timestamp` at which the message is logically deleted.
    /// Absent means the message never expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
}

impl ChatMessage {
    /// Whether the wall clock has passed `timestamp + expiry`.
    ///
    /// An expiry too large for chrono to represent cannot have elapsed, so
    /// it counts as never expiring rather than failing the read path.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let Some(secs) = self.expiry else {
            return false;
        };
        i64::try_from(secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| self.timestamp.checked_add_signed(ttl))
            .is_some_and(|deadline| deadline <= now)
    }
}

/// One peer's history, persisted as one file and rewritten as one unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatHistory {
    /// Hex peer id; also the file stem.
    pub peer_id: String,
    pub messages: Vec<ChatMessage>,
    pub last_updated: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Contacts
// ---------------------------------------------------------------------------

/// A known peer public key with bookkeeping metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contact {
    /// Base64 public key material as the user pasted it.
    pub public_key: String,
    pub added_at: DateTime<Utc>,
}

/// The flat contact list document. Insertion order is preserved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactList {
    pub contacts: Vec<Contact>,
}

// ---------------------------------------------------------------------------
// Identity file
// ---------------------------------------------------------------------------

/// The four key values of a persisted identity, each base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredKeys {
    /// X25519 public key.
    pub public_key: String,
    /// Ed25519 verify key.
    pub verify_key: String,
    /// X25519 secret key.
    pub private_key: String,
    /// Ed25519 secret key.
    pub signing_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredIdentity {
    pub keys: StoredKeys,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

/// Typed settings document with a closed set of recognized keys.
/// Unrecognized keys round-trip through `extra` untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppSettings {
    pub theme: Theme,
    /// Expiry applied to messages appended without an explicit one.
    pub default_expiry_secs: u64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            default_expiry_secs: DEFAULT_MESSAGE_EXPIRY_SECS,
            extra: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let msg = ChatMessage {
            id: Uuid::new_v4(),
            sender: Sender::Me,
            body: SealedEnvelope {
                ciphertext: vec![1],
                nonce: vec![0; 24],
                signature: vec![0; 64],
            },
            timestamp: now - Duration::seconds(10),
            expiry: Some(10),
        };
        // timestamp + expiry == now counts as expired
        assert!(msg.is_expired(now));

        let fresh = ChatMessage {
            expiry: Some(11),
            ..msg.clone()
        };
        assert!(!fresh.is_expired(now));

        let eternal = ChatMessage { expiry: None, ..msg };
        assert!(!eternal.is_expired(now + Duration::days(10_000)));
    }

    #[test]
    fn test_unrepresentable_expiry_never_expires() {
        let now = Utc::now();
        let msg = ChatMessage {
            id: Uuid::new_v4(),
            sender: Sender::Me,
            body: SealedEnvelope {
                ciphertext: vec![1],
                nonce: vec![0; 24],
                signature: vec![0; 64],
            },
            timestamp: now,
            // Overflows chrono's Duration range; must not panic.
            expiry: Some(10_000_000_000_000_000),
        };
        assert!(!msg.is_expired(now + Duration::days(10_000)));

        let worse = ChatMessage {
            expiry: Some(u64::MAX),
            ..msg
        };
        assert!(!worse.is_expired(now + Duration::days(10_000)));
    }

    #[test]
    fn test_settings_roundtrip_keeps_unknown_keys() {
        let json = r#"{"theme":"dark","default_expiry_secs":60,"beta_banner":true}"#;
        let settings: AppSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.extra.get("beta_banner"), Some(&serde_json::json!(true)));

        let back = serde_json::to_string(&settings).unwrap();
        assert!(back.contains("beta_banner"));
    }
}
