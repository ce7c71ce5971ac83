//! # aparte-client
//!
//! The session coordinator: wires [`aparte_session::PeerSession`] output to
//! the crypto engine and the store, and exposes the contract the UI layer
//! consumes — open/answer/complete a chat, send text, drain events, list
//! and manage contacts. The UI itself (windows, dialogs, theming) lives
//! elsewhere; this crate has no rendering concerns.

pub mod client;
pub mod events;

use tracing_subscriber::{fmt, EnvFilter};

pub use client::{ChatClient, ClientError, HistoryEntry};
pub use events::ClientEvent;

/// Initialise logging for an embedding process. Call once at startup.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("aparte_client=debug,aparte_session=debug,aparte_store=info,warn")
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
