//! Error types for framestream.

use thiserror::Error;

use crate::protocol::wire_format::ControlType;

/// Malformed byte boundaries in the framing layer.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FramingError {
    /// Fewer bytes available than the smallest valid encoding requires.
    #[error("buffer too short: need {needed} bytes, have {have}")]
    TooShort { needed: usize, have: usize },

    /// A declared length reaches past the end of the received bytes.
    #[error("truncated field: {declared} bytes declared, {remaining} remaining")]
    Truncated { declared: usize, remaining: usize },
}

/// Malformed or policy-violating control message.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ControlFrameError {
    /// The 4-byte control type is not one of the five defined values.
    #[error("invalid control type: {0}")]
    InvalidType(u32),

    /// A field type other than CONTENT_TYPE was encountered.
    #[error("invalid control field type: {0}")]
    InvalidField(u32),

    /// Control-message payload after the type exceeds the 512-byte limit.
    #[error("control frame payload of {0} bytes exceeds the 512 byte limit")]
    LengthExceeded(usize),

    /// A single content-type value exceeds the 512-byte limit.
    #[error("content type field of {0} bytes exceeds the 512 byte limit")]
    FieldTooLong(usize),

    /// STOP and FINISH messages must not carry content-type fields.
    #[error("control type {0} does not allow content type fields")]
    FieldNotAllowed(ControlType),
}

/// Protocol-sequence violations during session setup.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeError {
    /// No inbound message arrived within the handshake timeout.
    #[error("timed out waiting for the peer")]
    Timeout,

    /// The peer sent a control message of the wrong type.
    #[error("unexpected control type {observed}, expected {expected}")]
    UnexpectedType {
        expected: ControlType,
        observed: ControlType,
    },

    /// The peer sent a data frame before the handshake completed.
    #[error("unexpected data frame during handshake")]
    UnexpectedDataFrame,

    /// The peer accepted none of the configured content types.
    #[error("peer accepted none of the configured content types")]
    UnsupportedContentType,

    /// The transport closed before the handshake completed.
    #[error("transport closed during handshake")]
    TransportClosed,
}

/// Main error type for all framestream operations.
#[derive(Debug, Error)]
pub enum FramestreamError {
    /// I/O error on the underlying byte stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed byte boundaries.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// Malformed or policy-violating control message.
    #[error("control frame error: {0}")]
    ControlFrame(#[from] ControlFrameError),

    /// Handshake sequence violation; terminal for the session.
    #[error("handshake error: {0}")]
    Handshake(#[from] HandshakeError),

    /// A declared data-frame length exceeds the configured receive cap.
    #[error("data frame of {declared} bytes exceeds the {max} byte cap")]
    DataFrameTooLarge { declared: u32, max: u32 },

    /// A zero-length data payload would be indistinguishable from the
    /// escape sequence on the wire.
    #[error("zero-length data frames are ambiguous with the escape sequence")]
    EmptyDataFrame,

    /// Backpressure timeout - write queue full.
    #[error("backpressure timeout")]
    BackpressureTimeout,

    /// Connection closed unexpectedly.
    #[error("connection closed")]
    ConnectionClosed,
}

/// Result type alias using FramestreamError.
pub type Result<T> = std::result::Result<T, FramestreamError>;
