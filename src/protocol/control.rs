//! Control-message codec.
//!
//! A control message is a 4-byte big-endian type followed by zero or
//! more CONTENT_TYPE fields, each encoded as `[4B field type = 1]
//! [4B value length][value bytes]`. Field order is preserved and
//! duplicates are kept; the decoder does not deduplicate.
//!
//! Decoding is all-or-nothing: a malformed or truncated message never
//! produces a partially-populated result.
//!
//! # Example
//!
//! ```
//! use framestream::protocol::{ControlMessage, ControlType};
//!
//! let msg = ControlMessage::with_content_types(
//!     ControlType::Start,
//!     vec!["application/dns-tap".to_string()],
//! );
//! let bytes = msg.encode().unwrap();
//! assert_eq!(ControlMessage::decode(&bytes).unwrap(), msg);
//! ```

use crate::error::{ControlFrameError, FramingError, Result};
use crate::protocol::wire_format::{
    ControlType, CONTENT_TYPE_LENGTH_MAX, CONTROL_FIELD_HEADER_SIZE, CONTROL_FRAME_LENGTH_MAX,
    CONTROL_TYPE_SIZE, FIELD_CONTENT_TYPE,
};

#[inline]
fn be_u32(buf: &[u8]) -> u32 {
    u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]])
}

/// A decoded control message: type plus ordered content-type fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlMessage {
    control_type: ControlType,
    content_types: Vec<String>,
}

impl ControlMessage {
    /// Create a control message with no content-type fields.
    pub fn new(control_type: ControlType) -> Self {
        Self {
            control_type,
            content_types: Vec::new(),
        }
    }

    /// Create a control message carrying the given content types.
    ///
    /// Field order matches the input order. The STOP/FINISH field
    /// policy is enforced at [`encode`](Self::encode) time.
    pub fn with_content_types(control_type: ControlType, content_types: Vec<String>) -> Self {
        Self {
            control_type,
            content_types,
        }
    }

    /// The control-message type.
    #[inline]
    pub fn control_type(&self) -> ControlType {
        self.control_type
    }

    /// The content-type fields, in wire order.
    #[inline]
    pub fn content_types(&self) -> &[String] {
        &self.content_types
    }

    /// Encode to the wire representation.
    ///
    /// Produces a deterministic byte sequence: the 4-byte type, then
    /// one field per content type in input order. Fails with
    /// [`ControlFrameError::FieldNotAllowed`] when the type is STOP or
    /// FINISH and content types are present.
    pub fn encode(&self) -> std::result::Result<Vec<u8>, ControlFrameError> {
        if !self.control_type.allows_content_types() && !self.content_types.is_empty() {
            return Err(ControlFrameError::FieldNotAllowed(self.control_type));
        }

        let fields_len: usize = self
            .content_types
            .iter()
            .map(|ct| CONTROL_FIELD_HEADER_SIZE + ct.len())
            .sum();

        let mut buf = Vec::with_capacity(CONTROL_TYPE_SIZE + fields_len);
        buf.extend_from_slice(&self.control_type.as_u32().to_be_bytes());
        for content_type in &self.content_types {
            buf.extend_from_slice(&FIELD_CONTENT_TYPE.to_be_bytes());
            buf.extend_from_slice(&(content_type.len() as u32).to_be_bytes());
            buf.extend_from_slice(content_type.as_bytes());
        }
        Ok(buf)
    }

    /// Decode a control message from its wire representation.
    ///
    /// Validation order: minimum length, payload size limit, type
    /// membership, then per-field checks. The field cursor must land
    /// exactly on the end of the payload; a declared length that would
    /// overshoot is [`FramingError::Truncated`], never a partial read.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < CONTROL_TYPE_SIZE {
            return Err(FramingError::TooShort {
                needed: CONTROL_TYPE_SIZE,
                have: buf.len(),
            }
            .into());
        }

        let payload = &buf[CONTROL_TYPE_SIZE..];
        if payload.len() > CONTROL_FRAME_LENGTH_MAX {
            return Err(ControlFrameError::LengthExceeded(payload.len()).into());
        }

        let control_type = ControlType::try_from(be_u32(buf))?;

        let mut content_types = Vec::new();
        let mut cursor = 0usize;
        while cursor < payload.len() {
            let remaining = payload.len() - cursor;
            if remaining < CONTROL_FIELD_HEADER_SIZE {
                return Err(FramingError::Truncated {
                    declared: CONTROL_FIELD_HEADER_SIZE,
                    remaining,
                }
                .into());
            }

            let field_type = be_u32(&payload[cursor..]);
            if field_type != FIELD_CONTENT_TYPE {
                return Err(ControlFrameError::InvalidField(field_type).into());
            }

            let value_len = be_u32(&payload[cursor + 4..]) as usize;
            if value_len > CONTENT_TYPE_LENGTH_MAX {
                return Err(ControlFrameError::FieldTooLong(value_len).into());
            }

            let value_start = cursor + CONTROL_FIELD_HEADER_SIZE;
            let value_remaining = payload.len() - value_start;
            if value_len > value_remaining {
                return Err(FramingError::Truncated {
                    declared: value_len,
                    remaining: value_remaining,
                }
                .into());
            }

            // Field values are text; the wire gives no failure path for
            // bad UTF-8, so undecodable bytes are replaced.
            let value = &payload[value_start..value_start + value_len];
            content_types.push(String::from_utf8_lossy(value).into_owned());
            cursor = value_start + value_len;
        }

        Ok(Self {
            control_type,
            content_types,
        })
    }
}
