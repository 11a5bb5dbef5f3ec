//! Connect streaming envelopes.
//!
//! Every message on a streaming call is framed as one flags byte, a
//! big-endian `u32` payload length and the payload itself.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::Serialize;

/// Set when the payload is compressed.
pub const FLAG_COMPRESSED: u8 = 0b0000_0001;

/// Set on the final message of a response stream.
pub const FLAG_END_STREAM: u8 = 0b0000_0010;

/// Size of the flags byte plus the length prefix.
pub const HEADER_LEN: usize = 5;

/// Errors raised while decoding envelopes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    /// The buffer ends before the announced payload does.
    #[error("truncated envelope: expected {expected} bytes, {available} available")]
    Truncated {
        /// Bytes the envelope claims to hold, header included.
        expected: usize,
        /// Bytes actually left in the buffer.
        available: usize,
    },

    /// The peer sent a compressed payload; only identity is negotiated.
    #[error("compressed envelopes are not supported")]
    Compressed,
}

/// A single framed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    flags: u8,
    payload: Bytes,
}

impl Envelope {
    /// Creates a regular message envelope.
    pub fn message(payload: impl Into<Bytes>) -> Self {
        Self {
            flags: 0,
            payload: payload.into(),
        }
    }

    /// Creates the end-of-stream envelope.
    pub fn end_stream(payload: impl Into<Bytes>) -> Self {
        Self {
            flags: FLAG_END_STREAM,
            payload: payload.into(),
        }
    }

    /// Serializes `message` as JSON into a regular envelope.
    pub fn json<T: Serialize>(message: &T) -> serde_json::Result<Self> {
        serde_json::to_vec(message).map(Self::message)
    }

    /// Returns the flags byte.
    #[inline]
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Returns the payload.
    #[inline]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Returns `true` for the end-of-stream envelope.
    #[inline]
    pub fn is_end_stream(&self) -> bool {
        self.flags & FLAG_END_STREAM != 0
    }

    /// Encodes the envelope into a contiguous buffer.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_LEN + self.payload.len());
        buf.put_u8(self.flags);
        // Payloads are bounded well below 4 GiB by the chunk size.
        buf.put_u32(self.payload.len() as u32);
        buf.put_slice(&self.payload);
        buf.freeze()
    }

    /// Decodes the next envelope from the front of `buf`.
    ///
    /// Returns `Ok(None)` once the buffer is empty.
    pub fn decode(buf: &mut Bytes) -> Result<Option<Self>, EnvelopeError> {
        if buf.is_empty() {
            return Ok(None);
        }

        if buf.len() < HEADER_LEN {
            return Err(EnvelopeError::Truncated {
                expected: HEADER_LEN,
                available: buf.len(),
            });
        }

        let length = u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]) as usize;
        let expected = HEADER_LEN + length;
        if buf.len() < expected {
            return Err(EnvelopeError::Truncated {
                expected,
                available: buf.len(),
            });
        }

        let flags = buf.get_u8();
        buf.advance(4);
        let payload = buf.split_to(length);

        if flags & FLAG_COMPRESSED != 0 {
            return Err(EnvelopeError::Compressed);
        }

        Ok(Some(Self { flags, payload }))
    }

    /// Decodes every envelope in `buf`.
    pub fn decode_all(mut buf: Bytes) -> Result<Vec<Self>, EnvelopeError> {
        let mut envelopes = Vec::new();
        while let Some(envelope) = Self::decode(&mut buf)? {
            envelopes.push(envelope);
        }

        Ok(envelopes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_header_and_payload() {
        let encoded = Envelope::message(&b"{}"[..]).encode();
        assert_eq!(&encoded[..], &[0, 0, 0, 0, 2, b'{', b'}']);

        let encoded = Envelope::end_stream(&b"{}"[..]).encode();
        assert_eq!(encoded[0], FLAG_END_STREAM);
    }

    #[test]
    fn decodes_consecutive_envelopes() {
        let mut buf = BytesMut::new();
        buf.put(Envelope::message(&b"one"[..]).encode());
        buf.put(Envelope::end_stream(&b"{}"[..]).encode());

        let envelopes = Envelope::decode_all(buf.freeze()).unwrap();
        assert_eq!(envelopes.len(), 2);
        assert_eq!(&envelopes[0].payload()[..], b"one");
        assert!(!envelopes[0].is_end_stream());
        assert!(envelopes[1].is_end_stream());
    }

    #[test]
    fn rejects_truncated_input() {
        let mut buf = Bytes::from_static(&[0, 0, 0]);
        assert!(matches!(
            Envelope::decode(&mut buf),
            Err(EnvelopeError::Truncated { expected: 5, .. })
        ));

        let mut buf = Bytes::from_static(&[0, 0, 0, 0, 10, b'x']);
        assert!(matches!(
            Envelope::decode(&mut buf),
            Err(EnvelopeError::Truncated { expected: 15, available: 6 })
        ));
    }

    #[test]
    fn rejects_compressed_payloads() {
        let mut buf = Bytes::from_static(&[FLAG_COMPRESSED, 0, 0, 0, 0]);
        assert_eq!(Envelope::decode(&mut buf), Err(EnvelopeError::Compressed));
    }

    #[test]
    fn empty_buffer_has_no_envelopes() {
        assert!(Envelope::decode_all(Bytes::new()).unwrap().is_empty());
    }
}
