use thiserror::Error;

/// Errors produced by the store layer.
///
/// There is deliberately no "read failed" variant: read paths degrade to
/// empty/default results instead of erroring.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// A mutating operation could not be persisted.
    #[error("Storage write failed: {0}")]
    Write(#[source] std::io::Error),

    /// Serializing a document before writing it failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// `add_contact` with a public key that is already present.
    #[error("Contact already exists")]
    DuplicateContact,

    /// A public key that is not base64 or is too short to be a key.
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Generic I/O error (e.g. creating the data directories).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
