//! Object metadata, byte ranges and read streams.

use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use futures::stream::{BoxStream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET;
use crate::error::{StorageError, StorageResult};

/// Metadata of a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    /// Object size in bytes.
    pub size: u64,
    /// Content type reported by the backend, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl ObjectMetadata {
    /// Creates metadata for an object of the given size.
    pub fn new(size: u64) -> Self {
        Self {
            size,
            content_type: None,
        }
    }

    /// Returns `true` if the object holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// An inclusive `[start, end]` interval of an object's bytes.
///
/// Always satisfies `start <= end < size` for the object it was built for.
/// Deserialized ranges have no object to check against, so only their
/// ordering is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawByteRange")]
pub struct ByteRange {
    start: u64,
    end: u64,
}

#[derive(Deserialize)]
struct RawByteRange {
    start: u64,
    end: u64,
}

impl TryFrom<RawByteRange> for ByteRange {
    type Error = String;

    fn try_from(raw: RawByteRange) -> Result<Self, Self::Error> {
        // `end == u64::MAX` would overflow `len()`.
        if raw.start > raw.end || raw.end == u64::MAX {
            return Err(format!("invalid byte range {}-{}", raw.start, raw.end));
        }

        Ok(Self {
            start: raw.start,
            end: raw.end,
        })
    }
}

impl ByteRange {
    /// Creates a range, checking it against the object size.
    pub fn new(start: u64, end: u64, size: u64) -> StorageResult<Self> {
        if start > end || end >= size {
            return Err(StorageError::InvalidRange { start, end, size });
        }

        Ok(Self { start, end })
    }

    /// Returns the range covering the whole object, or `None` for empty objects.
    pub fn full(size: u64) -> Option<Self> {
        size.checked_sub(1).map(|end| Self { start: 0, end })
    }

    /// First byte of the range.
    #[inline]
    pub const fn start(&self) -> u64 {
        self.start
    }

    /// Last byte of the range (inclusive).
    #[inline]
    pub const fn end(&self) -> u64 {
        self.end
    }

    /// Number of bytes in the range.
    #[inline]
    pub const fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Always `false`; a range holds at least one byte.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Formats the range as a `Content-Range` header value.
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// A scoped read of a byte range.
///
/// The underlying backend reader is released when the stream is dropped,
/// whether it was read to completion, failed, or abandoned mid-way.
pub struct ObjectStream {
    name: String,
    range: ByteRange,
    inner: BoxStream<'static, io::Result<Bytes>>,
    bytes_read: u64,
}

impl ObjectStream {
    /// Wraps a backend byte stream.
    pub fn new(
        name: impl Into<String>,
        range: ByteRange,
        inner: impl Stream<Item = io::Result<Bytes>> + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            range,
            inner: inner.boxed(),
            bytes_read: 0,
        }
    }

    /// Name of the object being read.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Range being read.
    pub fn range(&self) -> ByteRange {
        self.range
    }
}

impl Stream for ObjectStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let poll = self.inner.poll_next_unpin(cx);
        if let Poll::Ready(Some(Ok(chunk))) = &poll {
            self.bytes_read += chunk.len() as u64;
        }
        poll
    }
}

impl fmt::Debug for ObjectStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStream")
            .field("name", &self.name)
            .field("range", &self.range)
            .field("bytes_read", &self.bytes_read)
            .finish_non_exhaustive()
    }
}

impl Drop for ObjectStream {
    fn drop(&mut self) {
        tracing::debug!(
            target: TRACING_TARGET,
            name = %self.name,
            range = %self.range,
            bytes_read = self.bytes_read,
            complete = self.bytes_read == self.range.len(),
            "Read handle released"
        );
    }
}
