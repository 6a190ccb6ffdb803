//! # framestream
//!
//! Implementation of the Frame Streams wire protocol: a byte-stream
//! framing convention distinguishing control messages from opaque data
//! payloads, plus the control-message handshake that negotiates content
//! types before data exchange (used by protocols such as Dnstap).
//!
//! ## Architecture
//!
//! - **Framing** ([`protocol::frame`]): length-prefixed data frames and
//!   the all-zero escape sequence introducing control frames.
//! - **Control messages** ([`ControlMessage`]): ACCEPT/START/STOP/
//!   READY/FINISH with ordered CONTENT_TYPE fields and size limits.
//! - **Handshake** ([`Handshake`]): the READY/ACCEPT/START exchange
//!   (or START alone for unidirectional senders) over any
//!   `AsyncRead + AsyncWrite` byte stream.
//! - **Data plane** ([`writer`]): a dedicated writer task that batches
//!   data frames with backpressure accounting.
//!
//! ## Example
//!
//! ```ignore
//! use bytes::Bytes;
//! use framestream::{ContentTypeSet, Handshake, Role};
//! use framestream::writer::spawn_writer_task_default;
//!
//! #[tokio::main]
//! async fn main() -> framestream::Result<()> {
//!     let stream = tokio::net::UnixStream::connect("/run/dnstap.sock").await?;
//!
//!     let handshake = Handshake::new(
//!         stream,
//!         Role::Bidirectional,
//!         ContentTypeSet::new(["protobuf:dnstap.Dnstap"]),
//!     );
//!     let transport = handshake.run().await?;
//!
//!     let (writer, _task) = spawn_writer_task_default(transport.into_inner());
//!     writer.send(Bytes::from_static(b"...")).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod handshake;
pub mod protocol;
pub mod transport;
pub mod writer;

pub use error::{
    ControlFrameError, FramestreamError, FramingError, HandshakeError, Result,
};
pub use handshake::{Handshake, HandshakeState, Role, DEFAULT_HANDSHAKE_TIMEOUT};
pub use protocol::{ContentTypeSet, ControlMessage, ControlType, Frame, FrameBuffer, FrameKind};
pub use transport::FrameTransport;
pub use writer::{DataFrame, WriterConfig, WriterHandle};
