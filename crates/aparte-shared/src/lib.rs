//! # aparte-shared
//!
//! Types and cryptography shared by every Aparté crate: peer identifiers,
//! the long-term [`identity::Identity`] key bundle, the
//! [`crypto::CryptoEngine`] that seals and opens messages between two known
//! identities, and the wire shapes exchanged out-of-band
//! ([`protocol::SessionDescriptor`]) or over the data channel
//! ([`protocol::SealedEnvelope`]).

pub mod constants;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod protocol;
pub mod types;

pub use crypto::CryptoEngine;
pub use error::{AparteError, CryptoError};
pub use identity::{Identity, PublicIdentity};
pub use protocol::{SealedEnvelope, SessionDescriptor};
pub use types::{PeerId, Sender};
