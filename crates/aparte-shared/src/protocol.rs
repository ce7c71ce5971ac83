//! Wire shapes: the sealed message envelope carried over the data channel
//! (and at rest in history files) and the offer/answer descriptor exchanged
//! out-of-band by the caller.

use serde::{Deserialize, Serialize};

/// One encrypted message: ciphertext, the nonce it was sealed under, and an
/// Ed25519 signature over the ciphertext.
///
/// The signature must verify before the ciphertext is ever handed to the
/// cipher — see [`crate::crypto::CryptoEngine::open`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SealedEnvelope {
    /// XChaCha20-Poly1305 ciphertext (includes the Poly1305 tag).
    #[serde(rename = "encrypted", with = "base64_bytes")]
    pub ciphertext: Vec<u8>,

    /// 24-byte random nonce, fresh per seal.
    #[serde(with = "base64_bytes")]
    pub nonce: Vec<u8>,

    /// Ed25519 signature over `ciphertext`.
    #[serde(with = "base64_bytes")]
    pub signature: Vec<u8>,
}

impl SealedEnvelope {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorKind {
    Offer,
    Answer,
}

/// Connection-negotiation payload exchanged out-of-band (copy-pasted or
/// QR-coded by the excluded UI layer). Opaque to the core beyond being
/// handed verbatim to the transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionDescriptor {
    pub sdp: String,
    #[serde(rename = "type")]
    pub kind: DescriptorKind,
}

impl SessionDescriptor {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp: sdp.into(),
            kind: DescriptorKind::Offer,
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            sdp: sdp.into(),
            kind: DescriptorKind::Answer,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Serde adapter: raw bytes as standard base64 text in JSON.
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        BASE64.decode(s).map_err(serde::de::Error::custom)
    }
}
