use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use aparte_session::{PeerSession, SessionError, SessionEvent, SignalingTransport};
use aparte_shared::constants::MAX_MESSAGE_SIZE;
use aparte_shared::crypto::CryptoEngine;
use aparte_shared::error::CryptoError;
use aparte_shared::identity::{Identity, PublicIdentity};
use aparte_shared::protocol::{SealedEnvelope, SessionDescriptor};
use aparte_shared::types::{PeerId, Sender};
use aparte_store::{ChatMessage, Contact, Store, StoreError};

use crate::events::ClientEvent;

/// Shown in place of a history entry that can no longer be opened
/// (unknown peer identity, or key material that changed underneath it).
const UNDECRYPTABLE: &str = "[déchiffrement impossible]";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The peer is not in the contact registry, so there is no public
    /// identity to seal for or verify against.
    #[error("Unknown peer: {0}")]
    UnknownPeer(PeerId),

    /// No open session for this peer.
    #[error("No session for peer: {0}")]
    NoSession(PeerId),

    /// Plaintext larger than the wire limit.
    #[error("Message too large: {size} bytes (limit {MAX_MESSAGE_SIZE})")]
    MessageTooLarge { size: usize },
}

/// One decrypted history record, ready for display.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Orchestrates one local identity, any number of peer sessions, and the
/// store underneath them.
///
/// Outbound: plaintext → seal → session send → own (sealed) copy appended
/// to history. Inbound: session bytes → verify-then-open → append →
/// [`ClientEvent::MessageReceived`]. An envelope that fails verification
/// is dropped with only an [`ClientEvent::AuthenticationWarning`].
///
/// Sessions are independent; calls for different peers never contend.
/// Concurrent mutation of the same peer's history is the caller's problem
/// to serialize, per the store's whole-file write discipline.
pub struct ChatClient {
    store: Store,
    crypto: CryptoEngine,
    sessions: HashMap<PeerId, PeerSession>,
    peers: HashMap<PeerId, PublicIdentity>,
}

impl ChatClient {
    /// Wrap a store, priming the in-memory peer registry from the persisted
    /// contact list. No identity is loaded yet.
    pub fn new(store: Store) -> Self {
        let mut peers = HashMap::new();
        for contact in store.list_contacts() {
            if let Some(public) = PublicIdentity::from_base64(&contact.public_key) {
                peers.insert(public.peer_id(), public);
            }
        }

        Self {
            store,
            crypto: CryptoEngine::new(),
            sessions: HashMap::new(),
            peers,
        }
    }

    /// Restore the persisted identity, or generate and persist a fresh one.
    pub fn load_or_generate_identity(&mut self) -> Result<PublicIdentity, ClientError> {
        if let Some(identity) = self.store.load_identity() {
            let public = identity.public_identity();
            self.crypto.load(identity);
            return Ok(public);
        }

        let identity = Identity::generate();
        self.store.save_identity(&identity)?;
        info!(peer = %identity.peer_id().short(), "Generated and persisted new identity");

        let public = identity.public_identity();
        self.crypto.load(identity);
        Ok(public)
    }

    /// Our public identity in pasteable form, for out-of-band exchange.
    pub fn export_public_key(&self) -> Result<String, ClientError> {
        Ok(self.crypto.local_public_identity()?.to_base64())
    }

    // -- contacts ----------------------------------------------------------

    /// Register a peer by its pasted base64 key (encryption ‖ verify).
    pub fn add_contact(&mut self, public_key: &str) -> Result<Contact, ClientError> {
        let public = PublicIdentity::from_base64(public_key).ok_or_else(|| {
            StoreError::InvalidPublicKey("expected 64 base64-encoded key bytes".into())
        })?;

        let contact = self.store.add_contact(public_key)?;
        self.peers.insert(public.peer_id(), public);
        Ok(contact)
    }

    pub fn list_contacts(&self) -> Vec<Contact> {
        self.store.list_contacts()
    }

    pub fn delete_contact(&mut self, public_key: &str) -> Result<bool, ClientError> {
        if let Some(public) = PublicIdentity::from_base64(public_key) {
            self.peers.remove(&public.peer_id());
        }
        Ok(self.store.delete_contact(public_key)?)
    }

    // -- session lifecycle -------------------------------------------------

    /// Start a chat as the offering side. The returned descriptor goes to
    /// the peer out-of-band; feed their answer to [`ChatClient::complete_chat`].
    pub async fn open_chat(
        &mut self,
        peer: PeerId,
        transport: Box<dyn SignalingTransport>,
    ) -> Result<SessionDescriptor, ClientError> {
        let mut session = PeerSession::new(peer, transport)?;
        let offer = session.create_offer().await?;
        self.sessions.insert(peer, session);
        Ok(offer)
    }

    /// Start a chat as the answering side, consuming the peer's offer.
    /// The returned answer goes back to the peer out-of-band.
    pub async fn answer_chat(
        &mut self,
        peer: PeerId,
        transport: Box<dyn SignalingTransport>,
        offer: &SessionDescriptor,
    ) -> Result<SessionDescriptor, ClientError> {
        let mut session = PeerSession::new(peer, transport)?;
        let answer = session.accept_offer(offer).await?;
        self.sessions.insert(peer, session);
        Ok(answer)
    }

    /// Apply the peer's answer on the offering side. Readiness arrives
    /// later as [`ClientEvent::Connected`].
    pub async fn complete_chat(
        &mut self,
        peer: PeerId,
        answer: &SessionDescriptor,
    ) -> Result<(), ClientError> {
        let session = self
            .sessions
            .get_mut(&peer)
            .ok_or(ClientError::NoSession(peer))?;
        session.accept_answer(answer).await?;
        Ok(())
    }

    /// Seal and send one text message, then persist our own sealed copy.
    /// Rejects plaintext over [`MAX_MESSAGE_SIZE`] before any sealing work.
    pub async fn send_text(&mut self, peer: PeerId, text: &str) -> Result<ChatMessage, ClientError> {
        if text.len() > MAX_MESSAGE_SIZE {
            return Err(ClientError::MessageTooLarge { size: text.len() });
        }
        let public = *self.peers.get(&peer).ok_or(ClientError::UnknownPeer(peer))?;
        let envelope = self.crypto.seal(text.as_bytes(), &public)?;
        let wire = envelope.to_json()?;

        let session = self
            .sessions
            .get_mut(&peer)
            .ok_or(ClientError::NoSession(peer))?;
        session.send(wire.as_bytes()).await?;

        Ok(self
            .store
            .append_message(&peer, Sender::Me, envelope, None)?)
    }

    /// Drain one session event for `peer`, translating transport-level
    /// happenings into [`ClientEvent`]s. Returns `None` when the session's
    /// event stream is exhausted.
    pub async fn next_event(&mut self, peer: PeerId) -> Result<Option<ClientEvent>, ClientError> {
        let event = {
            let session = self
                .sessions
                .get_mut(&peer)
                .ok_or(ClientError::NoSession(peer))?;
            session.poll_event().await
        };

        match event {
            None => Ok(None),
            Some(SessionEvent::ChannelOpen) => Ok(Some(ClientEvent::Connected { peer })),
            Some(SessionEvent::Closed { error }) => {
                self.sessions.remove(&peer);
                Ok(Some(ClientEvent::ConnectionClosed { peer, error }))
            }
            Some(SessionEvent::MessageReceived(bytes)) => {
                Ok(Some(self.handle_inbound(peer, &bytes)?))
            }
        }
    }

    /// Close the session to one peer, if any. Idempotent.
    pub async fn close_chat(&mut self, peer: PeerId) {
        if let Some(mut session) = self.sessions.remove(&peer) {
            session.close().await;
        }
    }

    pub fn has_session(&self, peer: &PeerId) -> bool {
        self.sessions.contains_key(peer)
    }

    // -- history -----------------------------------------------------------

    /// Load and decrypt a peer's history for display. Entries that cannot
    /// be opened are substituted, never rendered garbled.
    pub fn history(&self, peer: &PeerId) -> Result<Vec<HistoryEntry>, ClientError> {
        let messages = self.store.load_history(peer)?;
        let peer_public = self.peers.get(peer).copied();
        let local_public = self.crypto.local_public_identity().ok();

        Ok(messages
            .into_iter()
            .map(|m| {
                let text = self.open_for_display(&m, peer_public, local_public);
                HistoryEntry {
                    id: m.id,
                    sender: m.sender,
                    text,
                    timestamp: m.timestamp,
                }
            })
            .collect())
    }

    pub fn delete_chat_history(&self, peer: &PeerId) -> Result<(), ClientError> {
        Ok(self.store.delete_chat(peer)?)
    }

    pub fn sweep_expired(&self) -> Result<(), ClientError> {
        Ok(self.store.sweep_expired()?)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    // Bodies are stored sealed in both directions. The X25519 secret is
    // shared, so our own sent messages reopen with the peer's encryption
    // key — but the signature on those is ours, hence the hybrid identity.
    fn open_for_display(
        &self,
        message: &ChatMessage,
        peer_public: Option<PublicIdentity>,
        local_public: Option<PublicIdentity>,
    ) -> String {
        let (Some(peer_public), Some(local_public)) = (peer_public, local_public) else {
            return UNDECRYPTABLE.to_string();
        };

        let signer = match message.sender {
            Sender::Me => PublicIdentity {
                encryption_key: peer_public.encryption_key,
                verify_key: local_public.verify_key,
            },
            Sender::Peer(_) => peer_public,
        };

        self.crypto
            .open(&message.body, &signer)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .unwrap_or_else(|| UNDECRYPTABLE.to_string())
    }

    fn handle_inbound(&mut self, peer: PeerId, bytes: &[u8]) -> Result<ClientEvent, ClientError> {
        // Generous frame bound: sealed JSON overhead on top of the
        // plaintext limit. Anything bigger is dropped unexamined.
        if bytes.len() > MAX_MESSAGE_SIZE * 2 {
            warn!(peer = %peer.short(), size = bytes.len(), "Dropping oversize inbound frame");
            return Ok(ClientEvent::AuthenticationWarning {
                peer,
                reason: "oversize frame".into(),
            });
        }

        let Ok(wire) = std::str::from_utf8(bytes) else {
            warn!(peer = %peer.short(), "Dropping non-UTF-8 inbound frame");
            return Ok(ClientEvent::AuthenticationWarning {
                peer,
                reason: "malformed envelope".into(),
            });
        };

        let Ok(envelope) = SealedEnvelope::from_json(wire) else {
            warn!(peer = %peer.short(), "Dropping unparseable inbound envelope");
            return Ok(ClientEvent::AuthenticationWarning {
                peer,
                reason: "malformed envelope".into(),
            });
        };

        let Some(public) = self.peers.get(&peer).copied() else {
            warn!(peer = %peer.short(), "Inbound message from peer with no registered identity");
            return Ok(ClientEvent::AuthenticationWarning {
                peer,
                reason: "unknown sender identity".into(),
            });
        };

        match self.crypto.open(&envelope, &public) {
            Ok(plaintext) => match String::from_utf8(plaintext) {
                Ok(text) => {
                    self.store
                        .append_message(&peer, Sender::Peer(peer), envelope, None)?;
                    Ok(ClientEvent::MessageReceived { peer, text })
                }
                Err(_) => Ok(ClientEvent::AuthenticationWarning {
                    peer,
                    reason: "message body is not valid UTF-8".into(),
                }),
            },
            Err(e @ (CryptoError::SignatureInvalid | CryptoError::DecryptionFailed)) => {
                warn!(peer = %peer.short(), error = %e, "Discarding inauthentic envelope");
                Ok(ClientEvent::AuthenticationWarning {
                    peer,
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}
