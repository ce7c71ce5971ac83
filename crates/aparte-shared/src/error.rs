use thiserror::Error;

#[derive(Error, Debug)]
pub enum AparteError {
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum CryptoError {
    /// An operation requiring the local identity was called before one
    /// was generated or loaded.
    #[error("Identity not initialized")]
    IdentityNotInitialized,

    /// Key bytes of the wrong length, or not a valid curve point.
    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// Signature over the ciphertext did not verify. The envelope was
    /// discarded without attempting decryption.
    #[error("Message signature invalid")]
    SignatureInvalid,

    /// Authenticated-encryption tag check failed: tampered ciphertext,
    /// wrong nonce or wrong key.
    #[error("Decryption failed: invalid ciphertext or wrong key")]
    DecryptionFailed,

    #[error("Encryption failed")]
    EncryptionFailed,
}
