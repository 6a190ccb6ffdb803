//! Framed transport glue over an abstract byte stream.
//!
//! [`FrameTransport`] wraps any `AsyncRead + AsyncWrite` stream (a
//! socket, a pipe, a `tokio::io::duplex` pair in tests) and exchanges
//! whole frames: writes are flushed before they complete, and reads
//! pull bytes through a [`FrameBuffer`] until a complete frame is
//! available, optionally bounded by a timeout.
//!
//! One transport is exclusively owned by one session at a time; only
//! one inbound read is ever outstanding.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{HandshakeError, Result};
use crate::protocol::{Frame, FrameBuffer};

/// Read chunk size for the inbound loop.
const READ_BUF_SIZE: usize = 8 * 1024;

/// A byte stream with frame-level send/recv.
#[derive(Debug)]
pub struct FrameTransport<S> {
    stream: S,
    buffer: FrameBuffer,
    ready: VecDeque<Frame>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> FrameTransport<S> {
    /// Wrap a byte stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buffer: FrameBuffer::new(),
            ready: VecDeque::new(),
        }
    }

    /// Wrap a byte stream with a custom inbound data-payload cap.
    pub fn with_max_data_payload(stream: S, max_data_payload: u32) -> Self {
        Self {
            stream,
            buffer: FrameBuffer::with_max_data_payload(max_data_payload),
            ready: VecDeque::new(),
        }
    }

    /// Write pre-encoded frame bytes and flush.
    ///
    /// The write is awaited to completion (including flush) before
    /// this returns, so callers never queue unbounded outbound bytes.
    pub async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Receive the next complete frame.
    ///
    /// With a timeout, expiry fails with [`HandshakeError::Timeout`]
    /// and drops the pending read in the same step; a stray later byte
    /// delivery cannot settle an abandoned wait. EOF while waiting
    /// fails with [`HandshakeError::TransportClosed`].
    pub async fn recv(&mut self, timeout: Option<Duration>) -> Result<Frame> {
        match timeout {
            Some(limit) => match tokio::time::timeout(limit, self.recv_inner()).await {
                Ok(result) => result,
                Err(_) => Err(HandshakeError::Timeout.into()),
            },
            None => self.recv_inner().await,
        }
    }

    async fn recv_inner(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = self.ready.pop_front() {
                return Ok(frame);
            }

            let mut buf = [0u8; READ_BUF_SIZE];
            let n = self.stream.read(&mut buf).await?;
            if n == 0 {
                return Err(HandshakeError::TransportClosed.into());
            }

            self.ready.extend(self.buffer.push(&buf[..n])?);
        }
    }

    /// Consume the transport, returning the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::frame;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_send_then_recv_data_frame() {
        let (left, right) = tokio::io::duplex(4096);
        let mut a = FrameTransport::new(left);
        let mut b = FrameTransport::new(right);

        a.send(&frame::encode_data(b"hello")).await.unwrap();

        let frame = b.recv(None).await.unwrap();
        assert_eq!(frame, Frame::Data(Bytes::from_static(b"hello")));
    }

    #[tokio::test]
    async fn test_recv_timeout() {
        let (left, _right) = tokio::io::duplex(64);
        let mut a = FrameTransport::new(left);

        let err = a
            .recv(Some(Duration::from_millis(20)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::FramestreamError::Handshake(HandshakeError::Timeout)
        ));
    }

    #[tokio::test]
    async fn test_recv_transport_closed() {
        let (left, right) = tokio::io::duplex(64);
        drop(right);

        let mut a = FrameTransport::new(left);
        let err = a.recv(None).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::FramestreamError::Handshake(HandshakeError::TransportClosed)
        ));
    }

    #[tokio::test]
    async fn test_multiple_frames_queued_from_one_read() {
        let (left, right) = tokio::io::duplex(4096);
        let mut a = FrameTransport::new(left);
        let mut b = FrameTransport::new(right);

        let mut bytes = frame::encode_data(b"one");
        bytes.extend_from_slice(&frame::encode_data(b"two"));
        a.send(&bytes).await.unwrap();

        assert_eq!(
            b.recv(None).await.unwrap(),
            Frame::Data(Bytes::from_static(b"one"))
        );
        assert_eq!(
            b.recv(None).await.unwrap(),
            Frame::Data(Bytes::from_static(b"two"))
        );
    }
}
