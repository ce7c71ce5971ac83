//! Message sealing between two long-term identities.
//!
//! `seal` derives a shared secret via X25519, encrypts with
//! XChaCha20-Poly1305 under a fresh random nonce, then signs the ciphertext
//! with Ed25519 (encrypt-then-sign-the-ciphertext: forged or corrupted
//! envelopes are rejected before any decryption work). `open` enforces the
//! mirror-image ordering: verify first, decrypt only on success.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;
use x25519_dalek::PublicKey;

use crate::constants::{KDF_CONTEXT_MESSAGE_KEY, NONCE_SIZE};
use crate::error::CryptoError;
use crate::identity::{verify_signature, Identity, PublicIdentity};
use crate::protocol::SealedEnvelope;

/// Seals and opens messages using the local [`Identity`] and a peer's
/// [`PublicIdentity`].
///
/// The shared secret is re-derived on every call rather than cached: a
/// little CPU for no stale-secret state.
#[derive(Default)]
pub struct CryptoEngine {
    identity: Option<Identity>,
}

impl CryptoEngine {
    pub fn new() -> Self {
        Self { identity: None }
    }

    /// Generate a fresh identity, retain the private halves, and return the
    /// public values for out-of-band exchange.
    pub fn generate_identity(&mut self) -> PublicIdentity {
        let identity = Identity::generate();
        let public = identity.public_identity();
        tracing::info!(peer = %identity.peer_id().short(), "Generated new identity");
        self.identity = Some(identity);
        public
    }

    /// Restore private key material persisted earlier.
    pub fn load_identity(
        &mut self,
        encryption_secret: &[u8],
        signing_secret: &[u8],
    ) -> Result<(), CryptoError> {
        let identity = Identity::from_secret_bytes(encryption_secret, signing_secret)?;
        tracing::info!(peer = %identity.peer_id().short(), "Loaded identity");
        self.identity = Some(identity);
        Ok(())
    }

    /// Adopt an already constructed identity.
    pub fn load(&mut self, identity: Identity) {
        self.identity = Some(identity);
    }

    pub fn is_initialized(&self) -> bool {
        self.identity.is_some()
    }

    pub fn local_public_identity(&self) -> Result<PublicIdentity, CryptoError> {
        self.identity()
            .map(|identity| identity.public_identity())
    }

    fn identity(&self) -> Result<&Identity, CryptoError> {
        self.identity
            .as_ref()
            .ok_or(CryptoError::IdentityNotInitialized)
    }

    /// Encrypt and sign `plaintext` for `recipient`.
    ///
    /// Every call draws a fresh 24-byte nonce from the OS CSPRNG; nonce
    /// reuse under a fixed key pair would break the AEAD.
    pub fn seal(
        &self,
        plaintext: &[u8],
        recipient: &PublicIdentity,
    ) -> Result<SealedEnvelope, CryptoError> {
        let identity = self.identity()?;
        let key = self.derive_message_key(identity, &recipient.encryption_key);

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = XNonce::from_slice(&nonce_bytes);

        let cipher = XChaCha20Poly1305::new(&key.into());
        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| CryptoError::EncryptionFailed)?;

        let signature = identity.sign(&ciphertext);

        Ok(SealedEnvelope {
            ciphertext,
            nonce: nonce_bytes.to_vec(),
            signature: signature.to_bytes().to_vec(),
        })
    }

    /// Verify and decrypt an envelope from `sender`.
    ///
    /// Verification happens strictly first: a bad signature returns
    /// [`CryptoError::SignatureInvalid`] without the ciphertext ever
    /// reaching the cipher.
    pub fn open(
        &self,
        envelope: &SealedEnvelope,
        sender: &PublicIdentity,
    ) -> Result<Vec<u8>, CryptoError> {
        let identity = self.identity()?;

        verify_signature(&sender.verify_key, &envelope.ciphertext, &envelope.signature)?;

        if envelope.nonce.len() != NONCE_SIZE {
            return Err(CryptoError::DecryptionFailed);
        }

        let key = self.derive_message_key(identity, &sender.encryption_key);
        let cipher = XChaCha20Poly1305::new(&key.into());

        cipher
            .decrypt(XNonce::from_slice(&envelope.nonce), envelope.ciphertext.as_ref())
            .map_err(|_| CryptoError::DecryptionFailed)
    }

    // X25519 shared secret, then BLAKE3 KDF with domain separation.
    // Symmetric in the two parties, so both directions use the same key.
    fn derive_message_key(&self, identity: &Identity, their_key: &[u8; 32]) -> [u8; 32] {
        let shared = identity
            .encryption_secret()
            .diffie_hellman(&PublicKey::from(*their_key));

        let mut hasher = blake3::Hasher::new_derive_key(KDF_CONTEXT_MESSAGE_KEY);
        hasher.update(shared.as_bytes());
        let hash = hasher.finalize();
        let mut key = [0u8; 32];
        key.copy_from_slice(&hash.as_bytes()[..32]);
        key
    }
}
