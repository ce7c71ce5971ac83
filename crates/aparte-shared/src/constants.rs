/// X25519 / Ed25519 key size in bytes
pub const KEY_SIZE: usize = 32;

/// XChaCha20-Poly1305 nonce size in bytes
pub const NONCE_SIZE: usize = 24;

/// Ed25519 signature size in bytes
pub const SIGNATURE_SIZE: usize = 64;

/// Maximum message size in bytes (1 MiB)
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Default per-message expiry (24 hours)
pub const DEFAULT_MESSAGE_EXPIRY_SECS: u64 = 24 * 60 * 60;

/// Hard upper bound on message retention (7 days)
pub const MESSAGE_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

/// STUN servers handed to transport implementations
pub const STUN_SERVERS: &[&str] = &[
    "stun:stun.l.google.com:19302",
    "stun:stun1.l.google.com:19302",
];

/// Key derivation context (BLAKE3) for the per-pair message key
pub const KDF_CONTEXT_MESSAGE_KEY: &str = "aparte-message-key-v1";
