//! Wire frame format: `[length:varint][payload:length bytes]`
//!
//! The length prefix is an unsigned LEB128 varint of up to 64 bits, the same
//! encoding protobuf uses for length-delimited messages.

use bytes::{BufMut, BytesMut};

use super::TransportError;

/// Maximum payload size accepted from the host: 64 MiB
pub const MAX_FRAME_SIZE: u64 = 64 * 1024 * 1024;

/// A 64-bit varint never needs more than ten bytes.
pub(crate) const MAX_VARINT_LEN: usize = 10;

/// Encode a payload into a frame ready for the wire.
///
/// Any payload length fits the 64-bit prefix; the size cap applies only to
/// frames read from the host.
pub fn encode(payload: &[u8]) -> BytesMut {
    let len = payload.len() as u64;
    let mut buf =
        BytesMut::with_capacity(prost::encoding::encoded_len_varint(len) + payload.len());
    prost::encoding::encode_varint(len, &mut buf);
    buf.put_slice(payload);
    buf
}

/// Decode the length prefix at the start of `buf`.
///
/// Returns the payload length and the number of prefix bytes, or `None` if
/// the varint is not complete yet.
pub fn decode_length(buf: &[u8]) -> Result<Option<(u64, usize)>, TransportError> {
    let mut value: u64 = 0;
    for (i, &byte) in buf.iter().take(MAX_VARINT_LEN).enumerate() {
        // Only the lowest bit of the tenth byte fits in a u64.
        if i == MAX_VARINT_LEN - 1 && byte > 0x01 {
            return Err(TransportError::Malformed(
                "length varint exceeds 64 bits".to_string(),
            ));
        }
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(Some((value, i + 1)));
        }
    }
    Ok(None)
}

/// Decode one frame from the start of `buf`.
///
/// Returns the payload and the total number of bytes consumed, or `None` if
/// the frame is incomplete.
pub fn decode(buf: &[u8]) -> Result<Option<(Vec<u8>, usize)>, TransportError> {
    let Some((len, header)) = decode_length(buf)? else {
        return Ok(None);
    };
    let total = frame_total(len, header)?;
    if buf.len() < total {
        return Ok(None);
    }
    Ok(Some((buf[header..total].to_vec(), total)))
}

/// Full frame size for a decoded length prefix.
fn frame_total(len: u64, header: usize) -> Result<usize, TransportError> {
    usize::try_from(len)
        .ok()
        .and_then(|len| len.checked_add(header))
        .ok_or_else(|| TransportError::Malformed(format!("frame length {len} is not addressable")))
}

/// Full frame size, rejecting payloads over [`MAX_FRAME_SIZE`].
///
/// Used by the stream reader so a bad prefix cannot make it buffer without
/// bound.
pub(crate) fn checked_total(len: u64, header: usize) -> Result<usize, TransportError> {
    if len > MAX_FRAME_SIZE {
        return Err(TransportError::TooLarge {
            size: len,
            max: MAX_FRAME_SIZE,
        });
    }
    frame_total(len, header)
}
