//! Wire format constants and control-message types.
//!
//! All multi-byte integers are Big Endian. Frame layouts:
//!
//! ```text
//! Data frame      │ [4B length][length bytes of opaque payload]
//! Control frame   │ [4B = 0x00000000 escape][4B message length][message]
//! Control message │ [4B type][field]*
//! Field           │ [4B field type = 0x00000001][4B value length][value]
//! ```
//!
//! A data frame is distinguished from a control frame by its first four
//! bytes: the all-zero escape sequence marks a control frame.

use crate::error::ControlFrameError;

/// The four zero bytes that introduce a control frame.
pub const ESCAPE_SEQUENCE: [u8; 4] = [0, 0, 0, 0];

/// Size of the escape sequence in bytes.
pub const ESCAPE_SEQUENCE_SIZE: usize = 4;

/// Size of a big-endian u32 length prefix.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Size of the control-message type field.
pub const CONTROL_TYPE_SIZE: usize = 4;

/// Size of a control-field header (field type + value length).
pub const CONTROL_FIELD_HEADER_SIZE: usize = 8;

/// Maximum control-message payload after the 4-byte type.
pub const CONTROL_FRAME_LENGTH_MAX: usize = 512;

/// Maximum byte length of a single content-type field value.
pub const CONTENT_TYPE_LENGTH_MAX: usize = 512;

/// The only defined control-field type: CONTENT_TYPE.
pub const FIELD_CONTENT_TYPE: u32 = 1;

/// Control-message type. No other values are valid on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ControlType {
    Accept = 1,
    Start = 2,
    Stop = 3,
    Ready = 4,
    Finish = 5,
}

impl ControlType {
    /// Wire representation of this type.
    #[inline]
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Whether this type may carry CONTENT_TYPE fields.
    ///
    /// STOP and FINISH carry zero fields; encoding them with content
    /// types fails with [`ControlFrameError::FieldNotAllowed`].
    #[inline]
    pub fn allows_content_types(self) -> bool {
        !matches!(self, ControlType::Stop | ControlType::Finish)
    }
}

impl TryFrom<u32> for ControlType {
    type Error = ControlFrameError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ControlType::Accept),
            2 => Ok(ControlType::Start),
            3 => Ok(ControlType::Stop),
            4 => Ok(ControlType::Ready),
            5 => Ok(ControlType::Finish),
            other => Err(ControlFrameError::InvalidType(other)),
        }
    }
}

impl std::fmt::Display for ControlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ControlType::Accept => "ACCEPT",
            ControlType::Start => "START",
            ControlType::Stop => "STOP",
            ControlType::Ready => "READY",
            ControlType::Finish => "FINISH",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_type_roundtrip() {
        for ct in [
            ControlType::Accept,
            ControlType::Start,
            ControlType::Stop,
            ControlType::Ready,
            ControlType::Finish,
        ] {
            assert_eq!(ControlType::try_from(ct.as_u32()).unwrap(), ct);
        }
    }

    #[test]
    fn test_control_type_values() {
        assert_eq!(ControlType::Accept.as_u32(), 1);
        assert_eq!(ControlType::Start.as_u32(), 2);
        assert_eq!(ControlType::Stop.as_u32(), 3);
        assert_eq!(ControlType::Ready.as_u32(), 4);
        assert_eq!(ControlType::Finish.as_u32(), 5);
    }

    #[test]
    fn test_invalid_control_type_rejected() {
        for value in [0u32, 6, 999, u32::MAX] {
            assert_eq!(
                ControlType::try_from(value),
                Err(ControlFrameError::InvalidType(value))
            );
        }
    }

    #[test]
    fn test_content_type_policy() {
        assert!(ControlType::Accept.allows_content_types());
        assert!(ControlType::Start.allows_content_types());
        assert!(ControlType::Ready.allows_content_types());
        assert!(!ControlType::Stop.allows_content_types());
        assert!(!ControlType::Finish.allows_content_types());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(ControlType::Ready.to_string(), "READY");
        assert_eq!(ControlType::Finish.to_string(), "FINISH");
    }
}
