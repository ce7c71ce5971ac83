//! # aparte-session
//!
//! The signaling state machine for one direct channel to one peer, from
//! offer/answer exchange through data transfer to teardown.
//!
//! The underlying transport (WebRTC in production) is consumed only through
//! the [`transport::SignalingTransport`] contract; its ICE/SDP internals
//! live outside this crate. [`memory::MemoryTransport`] provides an
//! in-process loopback implementation for tests.

pub mod memory;
pub mod session;
pub mod transport;

pub use memory::MemoryTransport;
pub use session::{PeerSession, SessionError, SessionEvent, SessionState};
pub use transport::{SignalingTransport, TransportError, TransportEvent};
