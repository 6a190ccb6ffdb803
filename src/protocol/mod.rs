//! Frame Streams wire protocol: framing, control messages, and
//! content-type negotiation.
//!
//! The framing layer ([`frame`]) distinguishes control frames from
//! data frames via the all-zero escape sequence. Control messages
//! ([`ControlMessage`]) carry a type and ordered CONTENT_TYPE fields.
//! [`FrameBuffer`] reassembles complete frames from fragmented reads,
//! and [`ContentTypeSet`] answers negotiation queries during the
//! handshake.

pub mod content_type;
pub mod control;
pub mod frame;
pub mod frame_buffer;
pub mod wire_format;

pub use content_type::ContentTypeSet;
pub use control::ControlMessage;
pub use frame::FrameKind;
pub use frame_buffer::{Frame, FrameBuffer, DEFAULT_MAX_DATA_PAYLOAD};
pub use wire_format::{
    ControlType, CONTENT_TYPE_LENGTH_MAX, CONTROL_FRAME_LENGTH_MAX, ESCAPE_SEQUENCE,
    FIELD_CONTENT_TYPE,
};
