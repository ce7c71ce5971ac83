use serde::Serialize;

use aparte_shared::types::PeerId;

/// Everything the coordinator reports upward to the UI layer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub enum ClientEvent {
    /// The data channel to `peer` is live.
    Connected { peer: PeerId },

    /// A verified, decrypted inbound message, already persisted.
    MessageReceived { peer: PeerId, text: String },

    /// An inbound envelope failed authentication and was discarded. The
    /// warning is the only observable effect — no garbled output, no
    /// partial message.
    AuthenticationWarning { peer: PeerId, reason: String },

    /// The session ended. `error` distinguishes a transport failure from a
    /// clean shutdown.
    ConnectionClosed { peer: PeerId, error: bool },
}
