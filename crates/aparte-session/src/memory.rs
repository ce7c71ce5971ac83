//! In-process loopback transport: two endpoints joined by unbounded
//! channels. Used by the session and coordinator tests; the offer/answer
//! strings are placeholders with no SDP semantics.

use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

use aparte_shared::protocol::{DescriptorKind, SessionDescriptor};

use crate::transport::{SignalingTransport, TransportError, TransportEvent};

pub struct MemoryTransport {
    /// Events for our own session (ChannelOpen on handshake completion).
    local: UnboundedSender<TransportEvent>,
    /// Events delivered to the remote endpoint's session.
    remote: UnboundedSender<TransportEvent>,
    events: Option<UnboundedReceiver<TransportEvent>>,
    closed: bool,
}

impl MemoryTransport {
    /// Build two linked endpoints.
    pub fn pair() -> (Self, Self) {
        let (tx_a, rx_a) = mpsc::unbounded_channel();
        let (tx_b, rx_b) = mpsc::unbounded_channel();

        let a = Self {
            local: tx_a.clone(),
            remote: tx_b.clone(),
            events: Some(rx_a),
            closed: false,
        };
        let b = Self {
            local: tx_b,
            remote: tx_a,
            events: Some(rx_b),
            closed: false,
        };
        (a, b)
    }

    /// Simulate a transport-level failure on both ends (tests only).
    pub fn inject_failure(&mut self, reason: &str) {
        let _ = self.local.send(TransportEvent::Failed(reason.to_string()));
        let _ = self.remote.send(TransportEvent::Failed(reason.to_string()));
        self.closed = true;
    }

    fn ensure_open(&self) -> Result<(), TransportError> {
        if self.closed {
            Err(TransportError("transport closed".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SignalingTransport for MemoryTransport {
    async fn create_offer(&mut self) -> Result<SessionDescriptor, TransportError> {
        self.ensure_open()?;
        Ok(SessionDescriptor::offer(format!("memory-offer-{}", Uuid::new_v4())))
    }

    async fn accept_offer(
        &mut self,
        offer: &SessionDescriptor,
    ) -> Result<SessionDescriptor, TransportError> {
        self.ensure_open()?;
        if offer.kind != DescriptorKind::Offer {
            return Err(TransportError("expected an offer descriptor".into()));
        }
        Ok(SessionDescriptor::answer(format!("memory-answer-{}", Uuid::new_v4())))
    }

    async fn accept_answer(&mut self, answer: &SessionDescriptor) -> Result<(), TransportError> {
        self.ensure_open()?;
        if answer.kind != DescriptorKind::Answer {
            return Err(TransportError("expected an answer descriptor".into()));
        }
        // Applying the answer completes the handshake: both channels open.
        let _ = self.local.send(TransportEvent::ChannelOpen);
        let _ = self.remote.send(TransportEvent::ChannelOpen);
        Ok(())
    }

    async fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.ensure_open()?;
        self.remote
            .send(TransportEvent::Message(data.to_vec()))
            .map_err(|_| TransportError("remote endpoint gone".into()))
    }

    async fn close(&mut self) {
        if !self.closed {
            let _ = self.remote.send(TransportEvent::Closed);
            self.closed = true;
        }
    }

    fn take_events(&mut self) -> Option<UnboundedReceiver<TransportEvent>> {
        self.events.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handshake_opens_both_channels() {
        let (mut a, mut b) = MemoryTransport::pair();
        let mut a_events = a.take_events().unwrap();
        let mut b_events = b.take_events().unwrap();

        let offer = a.create_offer().await.unwrap();
        let answer = b.accept_offer(&offer).await.unwrap();
        a.accept_answer(&answer).await.unwrap();

        assert_eq!(a_events.recv().await, Some(TransportEvent::ChannelOpen));
        assert_eq!(b_events.recv().await, Some(TransportEvent::ChannelOpen));
    }

    #[tokio::test]
    async fn test_send_delivers_in_order() {
        let (mut a, mut b) = MemoryTransport::pair();
        let _ = a.take_events().unwrap();
        let mut b_events = b.take_events().unwrap();

        a.send(b"one").await.unwrap();
        a.send(b"two").await.unwrap();

        assert_eq!(b_events.recv().await, Some(TransportEvent::Message(b"one".to_vec())));
        assert_eq!(b_events.recv().await, Some(TransportEvent::Message(b"two".to_vec())));
    }

    #[tokio::test]
    async fn test_close_notifies_remote() {
        let (mut a, mut b) = MemoryTransport::pair();
        let _ = a.take_events().unwrap();
        let mut b_events = b.take_events().unwrap();

        a.close().await;
        a.close().await; // idempotent

        assert_eq!(b_events.recv().await, Some(TransportEvent::Closed));
        assert!(a.send(b"late").await.is_err());
    }

    #[tokio::test]
    async fn test_offer_answer_kind_validation() {
        let (mut a, mut b) = MemoryTransport::pair();
        let offer = a.create_offer().await.unwrap();
        assert!(b.accept_answer(&offer).await.is_err());

        let answer = b.accept_offer(&offer).await.unwrap();
        assert!(a.accept_offer(&answer).await.is_err());
    }
}
