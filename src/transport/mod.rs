//! Framed transport between the runner and the orchestration host.
//!
//! This module provides:
//! - [`frame`]: wire format: `[length:varint][payload:length bytes]`
//! - [`FrameReader`] / [`FrameWriter`]: async buffered frame I/O over any stream
//! - [`FrameCodec`]: both halves of one connection, owned by the dispatcher
//!
//! The codec never interleaves frames: there is no concurrent-write API, so a
//! single owner serializes every write.

pub mod codec;
pub mod frame;

pub use codec::{FrameCodec, FrameReader, FrameWriter, TcpFrameCodec};
pub use frame::MAX_FRAME_SIZE;

/// Error type for frame I/O.
///
/// Every variant leaves the byte stream in an unknown position, so callers
/// must treat these as fatal for the connection.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Malformed frame: {0}")]
    Malformed(String),
    #[error("Frame too large: {size} bytes (max {max})")]
    TooLarge { size: u64, max: u64 },
    #[error("Connection closed with incomplete frame ({buffered} bytes buffered)")]
    Truncated { buffered: usize },
    #[error("Receive failed: {0}")]
    RecvFailed(String),
    #[error("Send failed: {0}")]
    SendFailed(String),
}
