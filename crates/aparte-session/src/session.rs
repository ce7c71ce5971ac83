use thiserror::Error;
use tracing::{debug, info, warn};

use aparte_shared::protocol::SessionDescriptor;
use aparte_shared::types::PeerId;

use crate::transport::{SignalingTransport, TransportEvent};

#[derive(Error, Debug)]
pub enum SessionError {
    /// An operation was called in a state it is not valid in. Caller bug;
    /// fail fast rather than retry.
    #[error("Invalid state transition: {op} called in state {from:?}")]
    InvalidStateTransition { from: SessionState, op: &'static str },

    /// `send` before the data channel reported ready.
    #[error("Data channel not ready")]
    ChannelNotReady,

    /// The session closed or failed while the caller was waiting on it.
    #[error("Session closed")]
    SessionClosed,

    #[error("Transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// Offer produced; the remote answer is awaited.
    OfferCreated,
    /// The remote answer has been applied; the channel has yet to open.
    AnswerApplied,
    AnswerCreated,
    Connected,
    Closed,
    Failed,
}

/// What the session reports upward after digesting a transport event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The channel is live; the session is now `Connected`.
    ChannelOpen,
    /// Bytes from the peer, in send order.
    MessageReceived(Vec<u8>),
    /// The session is over. `error` distinguishes a transport failure from
    /// a clean shutdown.
    Closed { error: bool },
}

/// The lifecycle of one direct channel to one peer.
///
/// Offering side: `Idle → OfferCreated → AnswerApplied → Connected`.
/// Answering side: `Idle → AnswerCreated → Connected`. `Connected` is only
/// ever entered from [`TransportEvent::ChannelOpen`] received in
/// `AnswerApplied` or `AnswerCreated`, never synchronously and never from
/// an unnegotiated state. `Failed` is terminal and reachable from any
/// non-`Closed` state.
///
/// One session per peer; sessions share no state with each other. No
/// automatic reconnection — without a rendezvous point there is nothing to
/// reconnect to until the caller exchanges fresh descriptors.
pub struct PeerSession {
    peer: PeerId,
    state: SessionState,
    transport: Box<dyn SignalingTransport>,
    events: tokio::sync::mpsc::UnboundedReceiver<TransportEvent>,
}

impl PeerSession {
    pub fn new(
        peer: PeerId,
        mut transport: Box<dyn SignalingTransport>,
    ) -> Result<Self, SessionError> {
        let events = transport
            .take_events()
            .ok_or_else(|| SessionError::Transport("event stream already taken".into()))?;
        Ok(Self {
            peer,
            state: SessionState::Idle,
            transport,
            events,
        })
    }

    pub fn peer(&self) -> PeerId {
        self.peer
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    fn expect_state(&self, valid: &[SessionState], op: &'static str) -> Result<(), SessionError> {
        if valid.contains(&self.state) {
            Ok(())
        } else {
            Err(SessionError::InvalidStateTransition {
                from: self.state,
                op,
            })
        }
    }

    /// Establish the local endpoint and produce a serializable offer.
    /// Valid only from `Idle`.
    pub async fn create_offer(&mut self) -> Result<SessionDescriptor, SessionError> {
        self.expect_state(&[SessionState::Idle], "create_offer")?;

        let offer = self
            .transport
            .create_offer()
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        self.state = SessionState::OfferCreated;
        debug!(peer = %self.peer.short(), "Created offer");
        Ok(offer)
    }

    /// Consume a remote offer and produce the local answer. Valid only from
    /// `Idle`; the first `ChannelOpen` event then moves us to `Connected`.
    pub async fn accept_offer(
        &mut self,
        offer: &SessionDescriptor,
    ) -> Result<SessionDescriptor, SessionError> {
        self.expect_state(&[SessionState::Idle], "accept_offer")?;

        let answer = self
            .transport
            .accept_offer(offer)
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        self.state = SessionState::AnswerCreated;
        debug!(peer = %self.peer.short(), "Accepted offer, created answer");
        Ok(answer)
    }

    /// Apply the remote answer. Only completes negotiation; `Connected` is
    /// reached asynchronously via `ChannelOpen`.
    pub async fn accept_answer(&mut self, answer: &SessionDescriptor) -> Result<(), SessionError> {
        self.expect_state(
            &[SessionState::OfferCreated, SessionState::AnswerApplied],
            "accept_answer",
        )?;

        self.transport
            .accept_answer(answer)
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        self.state = SessionState::AnswerApplied;
        debug!(peer = %self.peer.short(), "Applied remote answer");
        Ok(())
    }

    /// Fire-and-forget send. Valid only when `Connected`; delivery
    /// acknowledgment is a higher-layer concern.
    pub async fn send(&mut self, data: &[u8]) -> Result<(), SessionError> {
        if self.state != SessionState::Connected {
            return Err(SessionError::ChannelNotReady);
        }
        self.transport
            .send(data)
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))
    }

    /// Digest the next transport event, applying state transitions.
    /// Returns `None` once the transport's event stream is exhausted.
    pub async fn poll_event(&mut self) -> Option<SessionEvent> {
        loop {
            let event = self.events.recv().await?;
            match event {
                TransportEvent::ChannelOpen => {
                    // Only a negotiated session may connect; a stray
                    // ChannelOpen from a misbehaving transport is dropped.
                    if !matches!(
                        self.state,
                        SessionState::AnswerApplied | SessionState::AnswerCreated
                    ) {
                        continue;
                    }
                    self.state = SessionState::Connected;
                    info!(peer = %self.peer.short(), "Data channel open");
                    return Some(SessionEvent::ChannelOpen);
                }
                TransportEvent::Message(data) => {
                    return Some(SessionEvent::MessageReceived(data));
                }
                TransportEvent::Failed(reason) => {
                    warn!(peer = %self.peer.short(), %reason, "Connection failed");
                    self.state = SessionState::Failed;
                    self.transport.close().await;
                    return Some(SessionEvent::Closed { error: true });
                }
                TransportEvent::Closed => {
                    info!(peer = %self.peer.short(), "Connection closed by peer");
                    self.state = SessionState::Closed;
                    self.transport.close().await;
                    return Some(SessionEvent::Closed { error: false });
                }
            }
        }
    }

    /// Suspend until the channel opens. Unblocks with `SessionClosed` if
    /// the session closes or fails first, rather than pending forever.
    pub async fn wait_connected(&mut self) -> Result<(), SessionError> {
        loop {
            match self.state {
                SessionState::Connected => return Ok(()),
                SessionState::Closed | SessionState::Failed => {
                    return Err(SessionError::SessionClosed)
                }
                _ => {}
            }
            match self.poll_event().await {
                Some(SessionEvent::ChannelOpen) => return Ok(()),
                Some(SessionEvent::Closed { .. }) | None => {
                    return Err(SessionError::SessionClosed)
                }
                Some(SessionEvent::MessageReceived(_)) => continue,
            }
        }
    }

    /// Tear down the transport. Valid from any state; idempotent.
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.transport.close().await;
        self.state = SessionState::Closed;
        info!(peer = %self.peer.short(), "Session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTransport;

    fn peer(byte: u8) -> PeerId {
        PeerId([byte; 32])
    }

    fn session_pair() -> (PeerSession, PeerSession) {
        let (a, b) = MemoryTransport::pair();
        (
            PeerSession::new(peer(1), Box::new(a)).unwrap(),
            PeerSession::new(peer(2), Box::new(b)).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_offer_twice_rejected() {
        let (mut a, _b) = session_pair();
        a.create_offer().await.unwrap();

        let err = a.create_offer().await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidStateTransition {
                from: SessionState::OfferCreated,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_send_requires_connected() {
        let (mut a, _b) = session_pair();
        assert!(matches!(
            a.send(b"early").await.unwrap_err(),
            SessionError::ChannelNotReady
        ));

        a.create_offer().await.unwrap();
        assert!(matches!(
            a.send(b"still early").await.unwrap_err(),
            SessionError::ChannelNotReady
        ));
    }

    #[tokio::test]
    async fn test_full_handshake_and_roundtrip() {
        let (mut a, mut b) = session_pair();

        let offer = a.create_offer().await.unwrap();
        let answer = b.accept_offer(&offer).await.unwrap();
        assert_eq!(b.state(), SessionState::AnswerCreated);

        a.accept_answer(&answer).await.unwrap();
        assert_eq!(a.state(), SessionState::AnswerApplied);

        a.wait_connected().await.unwrap();
        b.wait_connected().await.unwrap();
        assert!(a.is_connected() && b.is_connected());

        a.send(b"bonjour").await.unwrap();
        assert_eq!(
            b.poll_event().await,
            Some(SessionEvent::MessageReceived(b"bonjour".to_vec()))
        );
    }

    #[tokio::test]
    async fn test_stray_channel_open_ignored_before_negotiation() {
        let (a, mut b) = MemoryTransport::pair();
        let mut session = PeerSession::new(peer(1), Box::new(a)).unwrap();

        // The far endpoint fires ChannelOpen (and a payload) without the
        // local side ever having negotiated.
        b.accept_answer(&SessionDescriptor::answer("memory-answer-x"))
            .await
            .unwrap();
        b.send(b"too soon").await.unwrap();

        // The open is dropped; only the payload surfaces, and the session
        // never reaches Connected from Idle.
        assert_eq!(
            session.poll_event().await,
            Some(SessionEvent::MessageReceived(b"too soon".to_vec()))
        );
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_accept_answer_requires_offer() {
        let (mut a, _b) = session_pair();
        let answer = SessionDescriptor::answer("memory-answer-x");

        let err = a.accept_answer(&answer).await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidStateTransition { .. }));
    }

    #[tokio::test]
    async fn test_transport_failure_is_abnormal_closure() {
        let (a, mut b) = MemoryTransport::pair();
        let mut session = PeerSession::new(peer(1), Box::new(a)).unwrap();
        b.inject_failure("ice gave up");

        assert_eq!(
            session.poll_event().await,
            Some(SessionEvent::Closed { error: true })
        );
        assert_eq!(session.state(), SessionState::Failed);
        assert!(matches!(
            session.send(b"x").await.unwrap_err(),
            SessionError::ChannelNotReady
        ));
    }

    #[tokio::test]
    async fn test_remote_close_unblocks_wait() {
        let (mut a, mut b) = session_pair();

        let offer = a.create_offer().await.unwrap();
        let _answer = b.accept_offer(&offer).await.unwrap();
        b.close().await;

        // Never received an answer, so the channel never opened.
        let err = a.wait_connected().await.unwrap_err();
        assert!(matches!(err, SessionError::SessionClosed));
        assert_eq!(a.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (mut a, _b) = session_pair();
        a.close().await;
        a.close().await;
        assert_eq!(a.state(), SessionState::Closed);

        let err = a.create_offer().await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidStateTransition { .. }));
    }
}
