//! Handshake state machine for opening a Frame Streams session.
//!
//! A unidirectional sender emits a single START message and may then
//! send data frames. A bidirectional sender emits READY, waits for the
//! peer's ACCEPT (bounded by a timeout), verifies the negotiated
//! content types, then emits START:
//!
//! ```text
//! Init ──READY──► AwaitAccept ──ACCEPT/START──► ReadyForData
//!   │                  │
//!   └──────────────────┴──────────────────────► Failed
//! ```
//!
//! `ReadyForData` and `Failed` are terminal. [`Handshake::run`]
//! consumes the session, so no state can be visited twice and a failed
//! handshake cannot be retried: the caller must establish a new
//! transport connection for another attempt.
//!
//! # Example
//!
//! ```ignore
//! use framestream::{ContentTypeSet, Handshake, Role};
//!
//! let stream = tokio::net::UnixStream::connect("/run/dnstap.sock").await?;
//! let handshake = Handshake::new(
//!     stream,
//!     Role::Bidirectional,
//!     ContentTypeSet::new(["protobuf:dnstap.Dnstap"]),
//! );
//! let transport = handshake.run().await?;
//! ```

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{HandshakeError, Result};
use crate::protocol::{frame, ContentTypeSet, ControlMessage, ControlType, Frame};
use crate::transport::FrameTransport;

/// Default bound on the wait for the peer's ACCEPT.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Sender role for the session being opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Send START and begin emitting data frames; no reply expected.
    Unidirectional,
    /// Exchange READY/ACCEPT/START before emitting data frames.
    Bidirectional,
}

/// Handshake progress. Terminal states: `ReadyForData`, `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Init,
    AwaitAccept,
    ReadyForData,
    Failed,
}

/// Transient session state driving the control-message sequence.
pub struct Handshake<S> {
    transport: FrameTransport<S>,
    role: Role,
    content_types: ContentTypeSet,
    timeout: Duration,
    state: HandshakeState,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Handshake<S> {
    /// Create a handshake over the given stream with the default timeout.
    pub fn new(stream: S, role: Role, content_types: ContentTypeSet) -> Self {
        Self::with_timeout(stream, role, content_types, DEFAULT_HANDSHAKE_TIMEOUT)
    }

    /// Create a handshake with a caller-supplied ACCEPT timeout.
    pub fn with_timeout(
        stream: S,
        role: Role,
        content_types: ContentTypeSet,
        timeout: Duration,
    ) -> Self {
        Self {
            transport: FrameTransport::new(stream),
            role,
            content_types,
            timeout,
            state: HandshakeState::Init,
        }
    }

    /// Current handshake state.
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Drive the handshake to completion.
    ///
    /// Consumes the session; on success the transport is returned
    /// ready for data frames, on failure the typed error identifies
    /// the violated rule and the session is gone.
    pub async fn run(mut self) -> Result<FrameTransport<S>> {
        match self.drive().await {
            Ok(()) => {
                self.state = HandshakeState::ReadyForData;
                tracing::debug!(role = ?self.role, "handshake complete");
                Ok(self.transport)
            }
            Err(err) => {
                self.state = HandshakeState::Failed;
                tracing::warn!(role = ?self.role, error = %err, "handshake failed");
                Err(err)
            }
        }
    }

    async fn drive(&mut self) -> Result<()> {
        match self.role {
            Role::Unidirectional => self.send_start().await,
            Role::Bidirectional => {
                self.send_ready().await?;
                let accept = self.await_accept().await?;
                self.check_negotiation(&accept)?;
                self.send_start().await
            }
        }
    }

    async fn send_ready(&mut self) -> Result<()> {
        let msg =
            ControlMessage::with_content_types(ControlType::Ready, self.content_types.to_vec());
        self.send_control(&msg).await?;
        self.state = HandshakeState::AwaitAccept;
        Ok(())
    }

    async fn send_start(&mut self) -> Result<()> {
        let msg =
            ControlMessage::with_content_types(ControlType::Start, self.content_types.to_vec());
        self.send_control(&msg).await
    }

    async fn send_control(&mut self, msg: &ControlMessage) -> Result<()> {
        let message = msg.encode()?;
        self.transport.send(&frame::encode_control(&message)).await?;
        tracing::debug!(control_type = %msg.control_type(), "sent control message");
        Ok(())
    }

    /// Wait for one inbound frame and require it to be an ACCEPT.
    async fn await_accept(&mut self) -> Result<ControlMessage> {
        let frame = self.transport.recv(Some(self.timeout)).await?;
        let payload = match frame {
            Frame::Control(payload) => payload,
            Frame::Data(_) => return Err(HandshakeError::UnexpectedDataFrame.into()),
        };

        let msg = ControlMessage::decode(&payload)?;
        tracing::debug!(control_type = %msg.control_type(), "received control message");

        if msg.control_type() != ControlType::Accept {
            return Err(HandshakeError::UnexpectedType {
                expected: ControlType::Accept,
                observed: msg.control_type(),
            }
            .into());
        }
        Ok(msg)
    }

    /// An ACCEPT that carries content types must intersect ours.
    fn check_negotiation(&self, accept: &ControlMessage) -> Result<()> {
        if accept.content_types().is_empty() {
            return Ok(());
        }
        if self.content_types.negotiate(accept.content_types()) {
            Ok(())
        } else {
            Err(HandshakeError::UnsupportedContentType.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_starts_in_init() {
        let (stream, _peer) = tokio::io::duplex(64);
        let hs = Handshake::new(stream, Role::Unidirectional, ContentTypeSet::empty());
        assert_eq!(hs.state(), HandshakeState::Init);
        assert_eq!(hs.timeout, DEFAULT_HANDSHAKE_TIMEOUT);
    }

    #[test]
    fn test_with_timeout_overrides_default() {
        let (stream, _peer) = tokio::io::duplex(64);
        let hs = Handshake::with_timeout(
            stream,
            Role::Bidirectional,
            ContentTypeSet::empty(),
            Duration::from_millis(50),
        );
        assert_eq!(hs.timeout, Duration::from_millis(50));
    }
}
