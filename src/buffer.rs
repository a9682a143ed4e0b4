//! Byte span buffer: the addressable byte store every encoded value lives in.
//!
//! A [`SpanBuffer`] is an append-friendly byte store with random-access reads
//! at absolute offsets plus an in-place [`splice`](SpanBuffer::splice) for
//! re-encoding. A [`Span`] is an `(offset, length)` reference into such a
//! buffer; it never copies bytes and never outlives the buffer it indexes.
//! A [`ByteReader`] is a positional, bounds-checked reader over a byte slice.

use crate::{Error, Result};

/// An `(offset, length)` reference into a [`SpanBuffer`].
///
/// Invariant: `offset + length <= buffer.len()` for the buffer the span was
/// created against. Splicing the buffer invalidates every span at or after
/// the spliced region; such spans must be recomputed, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Absolute byte offset of the first byte.
    pub offset: u64,
    /// Number of bytes covered.
    pub length: u64,
}

impl Span {
    /// Creates a span covering `length` bytes starting at `offset`.
    pub fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    /// One past the last byte covered.
    #[inline]
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }

    /// True if `pos` lies inside the span.
    #[inline]
    pub fn contains(&self, pos: u64) -> bool {
        pos >= self.offset && pos < self.end()
    }
}

/// Growable byte store with absolute-offset reads and in-place splicing.
#[derive(Debug, Clone, Default)]
pub struct SpanBuffer {
    bytes: Vec<u8>,
}

impl SpanBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Creates an empty buffer with reserved capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    /// Takes ownership of an existing byte vector.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Current buffer size in bytes.
    #[inline]
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// True if the buffer holds no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The whole buffer as a slice.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the buffer, returning the underlying bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }

    /// Appends a single byte, returning its absolute offset.
    #[inline]
    pub fn push(&mut self, byte: u8) -> u64 {
        let offset = self.len();
        self.bytes.push(byte);
        offset
    }

    /// Appends a byte slice, returning the span it now occupies.
    pub fn write_all(&mut self, data: &[u8]) -> Span {
        let offset = self.len();
        self.bytes.extend_from_slice(data);
        Span::new(offset, data.len() as u64)
    }

    /// Reads the single byte at `offset`.
    #[inline]
    pub fn byte_at(&self, offset: u64) -> Result<u8> {
        self.bytes
            .get(offset as usize)
            .copied()
            .ok_or_else(|| Error::eof(1, self.len().saturating_sub(offset)))
    }

    /// Random-access read of `length` bytes at `offset`.
    pub fn read_at(&self, offset: u64, length: u64) -> Result<&[u8]> {
        let end = offset
            .checked_add(length)
            .ok_or_else(|| Error::malformed("span length overflows the address space"))?;
        if end > self.len() {
            return Err(Error::eof(length, self.len().saturating_sub(offset)));
        }
        Ok(&self.bytes[offset as usize..end as usize])
    }

    /// The bytes covered by `span`.
    #[inline]
    pub fn span_bytes(&self, span: Span) -> Result<&[u8]> {
        self.read_at(span.offset, span.length)
    }

    /// A positional reader over the bytes covered by `span`.
    pub fn reader(&self, span: Span) -> Result<ByteReader<'_>> {
        Ok(ByteReader::new(self.span_bytes(span)?))
    }

    /// Replaces `old_len` bytes at `offset` with `replacement`, shifting the
    /// tail of the buffer as needed (in-place growth or shrink).
    ///
    /// Every span whose offset is `>= offset` is invalidated by this call;
    /// callers own the recomputation of those spans.
    pub fn splice(&mut self, offset: u64, old_len: u64, replacement: &[u8]) -> Result<()> {
        let end = offset
            .checked_add(old_len)
            .ok_or_else(|| Error::malformed("splice range overflows the address space"))?;
        if end > self.len() {
            return Err(Error::eof(old_len, self.len().saturating_sub(offset)));
        }
        self.bytes
            .splice(offset as usize..end as usize, replacement.iter().copied());
        Ok(())
    }
}

/// Positional, bounds-checked reader over a byte slice.
///
/// Alle Lesefehler sind [`Error::UnexpectedEof`]; es wird nie gepanickt.
/// Der Reader kennt keine Ion-Semantik, nur Positionen und Längen.
#[derive(Debug, Clone, Copy)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current position relative to the start of the underlying slice.
    #[inline]
    pub fn position(&self) -> u64 {
        self.pos as u64
    }

    /// Bytes left to read.
    #[inline]
    pub fn remaining(&self) -> u64 {
        (self.data.len() - self.pos) as u64
    }

    /// True once every byte has been consumed.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Reads the next byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or_else(|| Error::eof(1, 0))?;
        self.pos += 1;
        Ok(byte)
    }

    /// Reads exactly `len` bytes as a sub-slice.
    pub fn read_slice(&mut self, len: u64) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::eof(len, self.remaining()));
        }
        let start = self.pos;
        self.pos += len as usize;
        Ok(&self.data[start..self.pos])
    }

    /// Advances past `len` bytes without looking at them.
    pub fn skip(&mut self, len: u64) -> Result<()> {
        if len > self.remaining() {
            return Err(Error::eof(len, self.remaining()));
        }
        self.pos += len as usize;
        Ok(())
    }
}
