use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::constants::KEY_SIZE;
use crate::error::CryptoError;
use crate::types::PeerId;

/// A party's long-term key bundle: one X25519 keypair for key-exchange-based
/// sealing and one Ed25519 keypair for authenticity.
///
/// The type is either fully present or absent (`Option<Identity>` at the
/// call sites); there is no observable partial state. There is no in-session
/// rotation either — once loaded, an identity lives until the process exits.
#[derive(Clone)]
pub struct Identity {
    encryption_secret: StaticSecret,
    signing_key: SigningKey,
}

/// The public half of an [`Identity`], safe to hand to peers.
/// Both keys are required to seal or open a message with that peer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicIdentity {
    pub encryption_key: [u8; 32],
    pub verify_key: [u8; 32],
}

impl PublicIdentity {
    pub fn peer_id(&self) -> PeerId {
        PeerId(self.encryption_key)
    }

    /// Pasteable form: base64 of `encryption_key || verify_key` (64 bytes).
    pub fn to_base64(&self) -> String {
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&self.encryption_key);
        bytes[32..].copy_from_slice(&self.verify_key);
        BASE64.encode(bytes)
    }

    pub fn from_base64(s: &str) -> Option<Self> {
        let bytes = BASE64.decode(s.trim()).ok()?;
        let bytes: [u8; 64] = bytes.try_into().ok()?;
        let mut encryption_key = [0u8; 32];
        let mut verify_key = [0u8; 32];
        encryption_key.copy_from_slice(&bytes[..32]);
        verify_key.copy_from_slice(&bytes[32..]);
        Some(Self {
            encryption_key,
            verify_key,
        })
    }
}

impl Identity {
    /// Generate a fresh identity from the OS CSPRNG.
    pub fn generate() -> Self {
        let encryption_secret = StaticSecret::random_from_rng(OsRng);
        let signing_key = SigningKey::generate(&mut OsRng);
        Self {
            encryption_secret,
            signing_key,
        }
    }

    /// Restore an identity from previously persisted private key material.
    /// Public keys are derived deterministically from the private halves.
    pub fn from_secret_bytes(
        encryption_secret: &[u8],
        signing_secret: &[u8],
    ) -> Result<Self, CryptoError> {
        let enc: [u8; KEY_SIZE] = encryption_secret.try_into().map_err(|_| {
            CryptoError::InvalidKeyMaterial(format!(
                "encryption key must be {KEY_SIZE} bytes, got {}",
                encryption_secret.len()
            ))
        })?;
        let sig: [u8; KEY_SIZE] = signing_secret.try_into().map_err(|_| {
            CryptoError::InvalidKeyMaterial(format!(
                "signing key must be {KEY_SIZE} bytes, got {}",
                signing_secret.len()
            ))
        })?;

        Ok(Self {
            encryption_secret: StaticSecret::from(enc),
            signing_key: SigningKey::from_bytes(&sig),
        })
    }

    /// The peer id other parties know us by (the X25519 public key).
    pub fn peer_id(&self) -> PeerId {
        PeerId(PublicKey::from(&self.encryption_secret).to_bytes())
    }

    /// Export the public half.
    pub fn public_identity(&self) -> PublicIdentity {
        PublicIdentity {
            encryption_key: PublicKey::from(&self.encryption_secret).to_bytes(),
            verify_key: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Raw X25519 secret bytes, for persistence only.
    pub fn encryption_secret_bytes(&self) -> [u8; 32] {
        self.encryption_secret.to_bytes()
    }

    /// Raw Ed25519 secret bytes, for persistence only.
    pub fn signing_secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    pub(crate) fn encryption_secret(&self) -> &StaticSecret {
        &self.encryption_secret
    }

    /// Sign a message with the long-term signing key.
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }
}

/// Verify a signature against a raw Ed25519 public key.
pub fn verify_signature(
    verify_key: &[u8; 32],
    message: &[u8],
    signature: &[u8],
) -> Result<(), CryptoError> {
    let key = VerifyingKey::from_bytes(verify_key)
        .map_err(|_| CryptoError::InvalidKeyMaterial("bad verify key".into()))?;
    let signature =
        Signature::from_slice(signature).map_err(|_| CryptoError::SignatureInvalid)?;
    key.verify(message, &signature)
        .map_err(|_| CryptoError::SignatureInvalid)
}
