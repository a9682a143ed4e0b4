//! Variable-length unsigned integer encoding (Ion 1.0 binary, VarUInt field).
//!
//! Each octet carries 7 magnitude bits; groups are ordered most significant
//! first. The high bit of every octet is clear except on the terminal octet,
//! where it is set. Writers must emit the minimal number of octets; a
//! non-terminal leading zero octet is rejected on read as padding.

use crate::buffer::{ByteReader, SpanBuffer};
use crate::{Error, Result};

/// Terminal marker: high bit of the last octet.
pub(crate) const END_MASK: u8 = 0x80;
/// Magnitude bits per octet.
pub(crate) const PAYLOAD_MASK: u8 = 0x7F;

/// Number of bytes the minimal VarUInt encoding of `value` occupies.
#[inline]
pub fn encoded_len(value: u64) -> u64 {
    // ceil(bits/7), mindestens 1 Byte (auch für 0)
    let bits = 64 - value.leading_zeros() as u64;
    core::cmp::max(1, bits.div_ceil(7))
}

/// Appends the minimal VarUInt encoding of `value`, returning the byte count.
pub fn write(buf: &mut SpanBuffer, value: u64) -> u64 {
    let len = encoded_len(value);
    if len == 1 {
        // Fast-Path: Single-Byte (häufigster Fall: kleine Längen und SIDs)
        buf.push(END_MASK | value as u8);
        return 1;
    }
    let mut shift = (len - 1) * 7;
    while shift > 0 {
        buf.push((value >> shift) as u8 & PAYLOAD_MASK);
        shift -= 7;
    }
    buf.push(END_MASK | (value as u8 & PAYLOAD_MASK));
    len
}

/// Reads a VarUInt from the stream.
///
/// Fails with [`Error::UnexpectedEof`] if the stream ends before a terminal
/// octet and with [`Error::MalformedData`] on a non-minimal encoding or when
/// the magnitude exceeds the supported `u64` width.
pub fn read(reader: &mut ByteReader<'_>) -> Result<u64> {
    let first = reader.read_u8()?;
    if first & END_MASK != 0 {
        // Fast-Path: Single-Byte
        return Ok(u64::from(first & PAYLOAD_MASK));
    }
    if first == 0 {
        return Err(Error::malformed(
            "non-minimal VarUInt: leading zero padding octet",
        ));
    }
    let mut value = u64::from(first);
    loop {
        let byte = reader.read_u8()?;
        // Overflow-Prüfung vor dem Shift: die obersten 7 Bits müssen frei sein.
        if value > u64::MAX >> 7 {
            return Err(Error::malformed("VarUInt magnitude exceeds 64 bits"));
        }
        value = (value << 7) | u64::from(byte & PAYLOAD_MASK);
        if byte & END_MASK != 0 {
            return Ok(value);
        }
    }
}
