//! The abstract contract a transport must satisfy: create offer, accept
//! offer, accept answer, send bytes, and a fixed set of event variants
//! delivered over a channel instead of registered closures.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;

use aparte_shared::protocol::SessionDescriptor;

#[derive(Error, Debug)]
#[error("Transport error: {0}")]
pub struct TransportError(pub String);

/// Everything the transport can tell the session. Dispatched on the
/// session's owning worker, so a single consumer per session suffices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The data channel is open; bytes can flow.
    ChannelOpen,
    /// Inbound bytes, in the order the peer sent them.
    Message(Vec<u8>),
    /// The connection failed; no further events follow.
    Failed(String),
    /// Clean shutdown initiated by the peer; no further events follow.
    Closed,
}

/// One logical point-to-point channel. Implemented over WebRTC in
/// production and over in-process channels in tests; the session layer
/// never looks inside the descriptors it shuttles.
///
/// Ordering of [`TransportEvent::Message`] events must match the order the
/// peer sent them — the session re-derives no ordering of its own.
#[async_trait]
pub trait SignalingTransport: Send {
    /// Produce a self-contained description of the local endpoint.
    /// Suspends while the transport gathers connectivity candidates.
    async fn create_offer(&mut self) -> Result<SessionDescriptor, TransportError>;

    /// Consume a remote offer and produce the local answer. The transport
    /// must emit [`TransportEvent::ChannelOpen`] once the channel is live.
    async fn accept_offer(
        &mut self,
        offer: &SessionDescriptor,
    ) -> Result<SessionDescriptor, TransportError>;

    /// Apply the remote answer. Completion of this call only finishes
    /// negotiation; readiness arrives later as `ChannelOpen`.
    async fn accept_answer(&mut self, answer: &SessionDescriptor) -> Result<(), TransportError>;

    /// Fire-and-forget byte send. Flow control is the transport's own.
    async fn send(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Tear down the connection. Must be safe to call more than once.
    async fn close(&mut self);

    /// Hand over the event stream. Yields `Some` exactly once; the session
    /// takes it at construction and is the sole consumer.
    fn take_events(&mut self) -> Option<UnboundedReceiver<TransportEvent>>;
}
