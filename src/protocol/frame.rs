//! Outer framing layer: length-prefixed data frames and the escape
//! sequence that introduces control frames.
//!
//! # Example
//!
//! ```
//! use framestream::protocol::frame::{classify, decode_data, encode_data, FrameKind};
//!
//! let bytes = encode_data(b"hello");
//! assert_eq!(classify(&bytes).unwrap(), FrameKind::Data);
//!
//! let (size, payload) = decode_data(&bytes).unwrap();
//! assert_eq!(size, 5);
//! assert_eq!(payload, b"hello");
//! ```

use crate::error::FramingError;
use crate::protocol::wire_format::{ESCAPE_SEQUENCE, ESCAPE_SEQUENCE_SIZE, LENGTH_PREFIX_SIZE};

/// Classification of the first four bytes of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Escape sequence seen; a control-message length and payload follow.
    Control,
    /// Nonzero length prefix; an opaque data payload follows.
    Data,
}

/// Encode a data frame: 4-byte big-endian length followed by the payload.
///
/// No upper bound is enforced at this layer. A zero-length payload
/// produces bytes identical to the escape sequence; the wire format
/// leaves that case undefined, so callers should not send empty
/// payloads (see [`crate::writer::DataFrame::new`]).
pub fn encode_data(payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Encode a control frame: escape sequence, 4-byte big-endian
/// control-message length, then the control-message bytes.
pub fn encode_control(message: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(ESCAPE_SEQUENCE_SIZE + LENGTH_PREFIX_SIZE + message.len());
    buf.extend_from_slice(&ESCAPE_SEQUENCE);
    buf.extend_from_slice(&(message.len() as u32).to_be_bytes());
    buf.extend_from_slice(message);
    buf
}

/// Decode a data frame into its declared size and payload.
///
/// Returns the declared size and the remainder of the buffer. Does not
/// verify that the payload length matches the declared size; callers
/// needing strict validation must compare the two themselves.
pub fn decode_data(buf: &[u8]) -> Result<(u32, &[u8]), FramingError> {
    if buf.len() < LENGTH_PREFIX_SIZE {
        return Err(FramingError::TooShort {
            needed: LENGTH_PREFIX_SIZE,
            have: buf.len(),
        });
    }
    let size = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
    Ok((size, &buf[LENGTH_PREFIX_SIZE..]))
}

/// Classify a frame by its first four bytes.
///
/// Returns [`FrameKind::Control`] iff the first four bytes equal the
/// all-zero escape sequence, else [`FrameKind::Data`].
pub fn classify(buf: &[u8]) -> Result<FrameKind, FramingError> {
    if buf.len() < ESCAPE_SEQUENCE_SIZE {
        return Err(FramingError::TooShort {
            needed: ESCAPE_SEQUENCE_SIZE,
            have: buf.len(),
        });
    }
    if buf[..ESCAPE_SEQUENCE_SIZE] == ESCAPE_SEQUENCE {
        Ok(FrameKind::Control)
    } else {
        Ok(FrameKind::Data)
    }
}
