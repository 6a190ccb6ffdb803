//! Frame buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` for zero-copy buffer management and a state
//! machine for handling fragmented frames:
//! - `WaitingForPrefix`: need the first 4 bytes (escape or data length)
//! - `WaitingForControlLength`: escape seen, need the 4-byte message length
//! - `WaitingForControlPayload`: need N control-message bytes
//! - `WaitingForDataPayload`: need N opaque payload bytes
//!
//! # Example
//!
//! ```
//! use framestream::protocol::{frame, Frame, FrameBuffer};
//!
//! let mut buffer = FrameBuffer::new();
//! let frames = buffer.push(&frame::encode_data(b"hello")).unwrap();
//!
//! assert!(matches!(&frames[0], Frame::Data(payload) if &payload[..] == b"hello"));
//! ```

use bytes::{Bytes, BytesMut};

use crate::error::{FramestreamError, Result};
use crate::protocol::wire_format::{
    CONTROL_FRAME_LENGTH_MAX, CONTROL_TYPE_SIZE, LENGTH_PREFIX_SIZE,
};

/// Default maximum data-frame payload accepted from the wire (1 GB).
pub const DEFAULT_MAX_DATA_PAYLOAD: u32 = 1_073_741_824;

/// Largest control frame the buffer will accept: type plus payload.
const MAX_CONTROL_FRAME: usize = CONTROL_TYPE_SIZE + CONTROL_FRAME_LENGTH_MAX;

/// A complete frame extracted from the byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Raw control-message bytes (type plus fields), still undecoded.
    Control(Bytes),
    /// Opaque data payload.
    Data(Bytes),
}

/// State machine for frame extraction.
#[derive(Debug, Clone)]
enum State {
    WaitingForPrefix,
    WaitingForControlLength,
    WaitingForControlPayload { remaining: usize },
    WaitingForDataPayload { remaining: usize },
}

/// Buffer for accumulating incoming bytes and extracting complete frames.
///
/// All data is stored in a single `BytesMut` buffer; payloads are
/// handed out as zero-copy `Bytes` slices.
#[derive(Debug)]
pub struct FrameBuffer {
    buffer: BytesMut,
    state: State,
    max_data_payload: u32,
}

impl FrameBuffer {
    /// Create a frame buffer with the default 1 GB data-payload cap.
    pub fn new() -> Self {
        Self::with_max_data_payload(DEFAULT_MAX_DATA_PAYLOAD)
    }

    /// Create a frame buffer with a custom data-payload cap.
    pub fn with_max_data_payload(max_data_payload: u32) -> Self {
        Self {
            buffer: BytesMut::with_capacity(8 * 1024),
            state: State::WaitingForPrefix,
            max_data_payload,
        }
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// Fragmented input is buffered internally for the next push.
    /// Returns an error if a declared length violates the control-frame
    /// limit or the data-payload cap; the buffer must be discarded
    /// after an error since the stream position is no longer trusted.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Frame>> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.try_extract_one()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    fn try_extract_one(&mut self) -> Result<Option<Frame>> {
        match self.state {
            State::WaitingForPrefix => {
                if self.buffer.len() < LENGTH_PREFIX_SIZE {
                    return Ok(None);
                }

                let prefix = u32::from_be_bytes([
                    self.buffer[0],
                    self.buffer[1],
                    self.buffer[2],
                    self.buffer[3],
                ]);
                let _ = self.buffer.split_to(LENGTH_PREFIX_SIZE);

                if prefix == 0 {
                    // Escape sequence: a control frame follows.
                    self.state = State::WaitingForControlLength;
                } else {
                    if prefix > self.max_data_payload {
                        return Err(FramestreamError::DataFrameTooLarge {
                            declared: prefix,
                            max: self.max_data_payload,
                        });
                    }
                    self.state = State::WaitingForDataPayload {
                        remaining: prefix as usize,
                    };
                }
                self.try_extract_one()
            }

            State::WaitingForControlLength => {
                if self.buffer.len() < LENGTH_PREFIX_SIZE {
                    return Ok(None);
                }

                let length = u32::from_be_bytes([
                    self.buffer[0],
                    self.buffer[1],
                    self.buffer[2],
                    self.buffer[3],
                ]) as usize;
                let _ = self.buffer.split_to(LENGTH_PREFIX_SIZE);

                if length > MAX_CONTROL_FRAME {
                    return Err(crate::error::ControlFrameError::LengthExceeded(
                        length - CONTROL_TYPE_SIZE,
                    )
                    .into());
                }

                if length == 0 {
                    // Degenerate frame; the control codec rejects it.
                    self.state = State::WaitingForPrefix;
                    return Ok(Some(Frame::Control(Bytes::new())));
                }

                self.state = State::WaitingForControlPayload { remaining: length };
                self.try_extract_one()
            }

            State::WaitingForControlPayload { remaining } => {
                if self.buffer.len() < remaining {
                    return Ok(None);
                }
                let payload = self.buffer.split_to(remaining).freeze();
                self.state = State::WaitingForPrefix;
                Ok(Some(Frame::Control(payload)))
            }

            State::WaitingForDataPayload { remaining } => {
                if self.buffer.len() < remaining {
                    return Ok(None);
                }
                let payload = self.buffer.split_to(remaining).freeze();
                self.state = State::WaitingForPrefix;
                Ok(Some(Frame::Data(payload)))
            }
        }
    }

    /// Number of buffered bytes not yet assembled into a frame.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer holds no pending bytes.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer and reset the state machine.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.state = State::WaitingForPrefix;
    }

    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match self.state {
            State::WaitingForPrefix => "WaitingForPrefix",
            State::WaitingForControlLength => "WaitingForControlLength",
            State::WaitingForControlPayload { .. } => "WaitingForControlPayload",
            State::WaitingForDataPayload { .. } => "WaitingForDataPayload",
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::control::ControlMessage;
    use crate::protocol::frame;
    use crate::protocol::wire_format::ControlType;

    fn control_frame_bytes(msg: &ControlMessage) -> Vec<u8> {
        frame::encode_control(&msg.encode().unwrap())
    }

    #[test]
    fn test_single_data_frame() {
        let mut buffer = FrameBuffer::new();
        let frames = buffer.push(&frame::encode_data(b"hello")).unwrap();

        assert_eq!(frames, vec![Frame::Data(Bytes::from_static(b"hello"))]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_single_control_frame() {
        let mut buffer = FrameBuffer::new();
        let msg = ControlMessage::new(ControlType::Ready);
        let frames = buffer.push(&control_frame_bytes(&msg)).unwrap();

        assert_eq!(frames.len(), 1);
        match &frames[0] {
            Frame::Control(payload) => {
                assert_eq!(ControlMessage::decode(payload).unwrap(), msg);
            }
            other => panic!("expected control frame, got {:?}", other),
        }
    }

    #[test]
    fn test_interleaved_control_and_data() {
        let mut buffer = FrameBuffer::new();
        let start = ControlMessage::with_content_types(
            ControlType::Start,
            vec!["application/dns-tap".to_string()],
        );

        let mut bytes = control_frame_bytes(&start);
        bytes.extend_from_slice(&frame::encode_data(b"record-1"));
        bytes.extend_from_slice(&frame::encode_data(b"record-2"));

        let frames = buffer.push(&bytes).unwrap();
        assert_eq!(frames.len(), 3);
        assert!(matches!(frames[0], Frame::Control(_)));
        assert_eq!(frames[1], Frame::Data(Bytes::from_static(b"record-1")));
        assert_eq!(frames[2], Frame::Data(Bytes::from_static(b"record-2")));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_fragmented_prefix() {
        let mut buffer = FrameBuffer::new();
        let bytes = frame::encode_data(b"test");

        assert!(buffer.push(&bytes[..2]).unwrap().is_empty());
        assert_eq!(buffer.state_name(), "WaitingForPrefix");

        let frames = buffer.push(&bytes[2..]).unwrap();
        assert_eq!(frames, vec![Frame::Data(Bytes::from_static(b"test"))]);
    }

    #[test]
    fn test_fragmented_control_length() {
        let mut buffer = FrameBuffer::new();
        let bytes = control_frame_bytes(&ControlMessage::new(ControlType::Accept));

        // Escape delivered, length split across pushes.
        assert!(buffer.push(&bytes[..6]).unwrap().is_empty());
        assert_eq!(buffer.state_name(), "WaitingForControlLength");

        let frames = buffer.push(&bytes[6..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert!(matches!(frames[0], Frame::Control(_)));
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut buffer = FrameBuffer::new();
        let mut bytes = control_frame_bytes(&ControlMessage::new(ControlType::Ready));
        bytes.extend_from_slice(&frame::encode_data(b"hi"));

        let mut all_frames = Vec::new();
        for byte in &bytes {
            all_frames.extend(buffer.push(&[*byte]).unwrap());
        }

        assert_eq!(all_frames.len(), 2);
        assert!(matches!(all_frames[0], Frame::Control(_)));
        assert_eq!(all_frames[1], Frame::Data(Bytes::from_static(b"hi")));
    }

    #[test]
    fn test_oversized_control_frame_rejected() {
        let mut buffer = FrameBuffer::new();

        let mut bytes = vec![0, 0, 0, 0]; // escape
        bytes.extend_from_slice(&600u32.to_be_bytes());

        let result = buffer.push(&bytes);
        assert!(matches!(
            result,
            Err(FramestreamError::ControlFrame(
                crate::error::ControlFrameError::LengthExceeded(_)
            ))
        ));
    }

    #[test]
    fn test_data_payload_cap() {
        let mut buffer = FrameBuffer::with_max_data_payload(100);
        let bytes = 1000u32.to_be_bytes();

        let result = buffer.push(&bytes);
        assert!(matches!(
            result,
            Err(FramestreamError::DataFrameTooLarge {
                declared: 1000,
                max: 100
            })
        ));
    }

    #[test]
    fn test_clear_resets_state() {
        let mut buffer = FrameBuffer::new();
        let bytes = frame::encode_data(b"partial");

        buffer.push(&bytes[..5]).unwrap();
        assert_eq!(buffer.state_name(), "WaitingForDataPayload");

        buffer.clear();
        assert_eq!(buffer.state_name(), "WaitingForPrefix");
        assert!(buffer.is_empty());
    }
}
