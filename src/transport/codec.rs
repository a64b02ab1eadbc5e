//! Async frame reader/writer for any `AsyncRead`/`AsyncWrite` stream.
//!
//! Wraps the [`frame`](super::frame) wire format with buffered async I/O.

use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use super::frame;
use super::TransportError;

const INITIAL_BUF_CAPACITY: usize = 8 * 1024;

/// Async frame reader over any `AsyncRead` stream.
///
/// Buffers incoming bytes and yields complete frame payloads.
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
    buf: BytesMut,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Wrap a reader.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUF_CAPACITY),
        }
    }

    /// Read the next frame payload. Returns `None` on clean EOF.
    ///
    /// EOF in the middle of a frame is an error: the host went away while
    /// a message was in flight.
    pub async fn read_frame(&mut self) -> Result<Option<Bytes>, TransportError> {
        loop {
            if let Some((len, header)) = frame::decode_length(&self.buf)? {
                let total = frame::checked_total(len, header)?;
                if self.buf.len() >= total {
                    self.buf.advance(header);
                    return Ok(Some(self.buf.split_to(total - header).freeze()));
                }
                self.buf.reserve(total - self.buf.len());
            }

            let n = self
                .inner
                .read_buf(&mut self.buf)
                .await
                .map_err(|e| TransportError::RecvFailed(e.to_string()))?;

            if n == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Err(TransportError::Truncated {
                    buffered: self.buf.len(),
                });
            }
        }
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Async frame writer over any `AsyncWrite` stream.
#[derive(Debug)]
pub struct FrameWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Write one frame and flush it.
    ///
    /// The length prefix and payload go out in a single buffer, and the
    /// flush completes before this returns, so the peer sees the whole frame.
    pub async fn write_frame(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let encoded = frame::encode(payload);
        self.inner
            .write_all(&encoded)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        self.inner
            .flush()
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        Ok(())
    }

    /// Shut down the write side of the stream.
    pub async fn shutdown(&mut self) -> Result<(), TransportError> {
        self.inner
            .shutdown()
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Combined async frame reader + writer over a split stream.
#[derive(Debug)]
pub struct FrameCodec<R, W> {
    pub reader: FrameReader<R>,
    pub writer: FrameWriter<W>,
}

/// Frame codec over the two halves of a host TCP connection.
pub type TcpFrameCodec = FrameCodec<OwnedReadHalf, OwnedWriteHalf>;

impl<R: AsyncRead + Unpin, W: AsyncWrite + Unpin> FrameCodec<R, W> {
    /// Create from separate read and write halves.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: FrameReader::new(reader),
            writer: FrameWriter::new(writer),
        }
    }

    /// Read the next frame payload.
    pub async fn read_frame(&mut self) -> Result<Option<Bytes>, TransportError> {
        self.reader.read_frame().await
    }

    /// Write a frame.
    pub async fn write_frame(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        self.writer.write_frame(payload).await
    }

    /// Shut down the write side; the peer observes EOF.
    pub async fn shutdown(&mut self) -> Result<(), TransportError> {
        self.writer.shutdown().await
    }
}

impl TcpFrameCodec {
    /// Split a connected TCP stream into a frame codec.
    pub fn from_stream(stream: TcpStream) -> Self {
        let (r, w) = stream.into_split();
        Self::new(r, w)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
