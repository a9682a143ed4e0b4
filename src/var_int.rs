//! Variable-length signed integer encoding (Ion 1.0 binary, VarInt field).
//!
//! Same octet layout as VarUInt except that the first octet reserves bit 6
//! as the sign (1 = negative) and therefore carries only 6 magnitude bits.
//! A zero first octet can be load-bearing here (it holds the sign), so the
//! VarUInt padding rule does not apply. Negative zero is a distinct
//! encoding reserved for the timestamp unknown-offset marker; [`read`]
//! rejects it and [`read_raw`] exposes it.

use crate::buffer::{ByteReader, SpanBuffer};
use crate::var_uint::{END_MASK, PAYLOAD_MASK};
use crate::{Error, Result};

/// Sign bit in the first octet.
const SIGN_MASK: u8 = 0x40;
/// Magnitude bits in the first octet.
const FIRST_PAYLOAD_MASK: u8 = 0x3F;

/// Number of bytes the minimal VarInt encoding of a magnitude occupies.
#[inline]
fn magnitude_len(magnitude: u64) -> u64 {
    // Erstes Byte trägt 6 Magnitude-Bits, alle weiteren 7.
    let bits = 64 - magnitude.leading_zeros() as u64;
    if bits <= 6 {
        1
    } else {
        1 + (bits - 6).div_ceil(7)
    }
}

/// Number of bytes the minimal VarInt encoding of `value` occupies.
#[inline]
pub fn encoded_len(value: i64) -> u64 {
    magnitude_len(value.unsigned_abs())
}

/// Appends the minimal VarInt encoding of `(negative, magnitude)`.
pub fn write_raw(buf: &mut SpanBuffer, negative: bool, magnitude: u64) -> u64 {
    let sign = if negative { SIGN_MASK } else { 0 };
    let len = magnitude_len(magnitude);
    if len == 1 {
        buf.push(END_MASK | sign | magnitude as u8);
        return 1;
    }
    // Erstes Byte: die Bits oberhalb der 7*(len-1) Bits der Folge-Bytes.
    let mut shift = (len - 1) * 7;
    buf.push(sign | ((magnitude >> shift) as u8 & FIRST_PAYLOAD_MASK));
    while shift > 0 {
        shift -= 7;
        let group = (magnitude >> shift) as u8 & PAYLOAD_MASK;
        if shift == 0 {
            buf.push(END_MASK | group);
        } else {
            buf.push(group);
        }
    }
    len
}

/// Appends the minimal VarInt encoding of `value`, returning the byte count.
///
/// `i64::MIN` is rejected up front: its magnitude exceeds the 63 bits
/// [`read`] enforces, so the value could never be reparsed.
pub fn write(buf: &mut SpanBuffer, value: i64) -> Result<u64> {
    let magnitude = value.unsigned_abs();
    if magnitude > i64::MAX as u64 {
        return Err(Error::malformed("VarInt magnitude exceeds 63 bits"));
    }
    Ok(write_raw(buf, value < 0, magnitude))
}

/// Reads a VarInt as `(negative, magnitude)`, preserving negative zero.
pub fn read_raw(reader: &mut ByteReader<'_>) -> Result<(bool, u64)> {
    let first = reader.read_u8()?;
    let negative = first & SIGN_MASK != 0;
    let mut magnitude = u64::from(first & FIRST_PAYLOAD_MASK);
    if first & END_MASK != 0 {
        return Ok((negative, magnitude));
    }
    loop {
        let byte = reader.read_u8()?;
        if magnitude > u64::MAX >> 7 {
            return Err(Error::malformed("VarInt magnitude exceeds 64 bits"));
        }
        magnitude = (magnitude << 7) | u64::from(byte & PAYLOAD_MASK);
        if byte & END_MASK != 0 {
            return Ok((negative, magnitude));
        }
    }
}

/// Reads a VarInt from the stream.
///
/// Magnitudes above `i64::MAX` and negative zero are rejected as malformed;
/// negative zero only appears legitimately as the timestamp unknown-offset
/// marker, which goes through [`read_raw`].
pub fn read(reader: &mut ByteReader<'_>) -> Result<i64> {
    let (negative, magnitude) = read_raw(reader)?;
    if magnitude > i64::MAX as u64 {
        return Err(Error::malformed("VarInt magnitude exceeds 63 bits"));
    }
    if negative {
        if magnitude == 0 {
            return Err(Error::malformed(
                "negative-zero VarInt outside a timestamp offset",
            ));
        }
        Ok(-(magnitude as i64))
    } else {
        Ok(magnitude as i64)
    }
}
