//! Decimal payloads (Ion 1.0 binary, type id 5).
//!
//! A decimal payload is a VarInt exponent followed by a sign-magnitude Int
//! coefficient that occupies the remainder of the payload; the value is
//! `coefficient * 10^exponent`. An empty payload is `0d0`. A negative-zero
//! coefficient is accepted on read and normalized to zero (the coefficient
//! model is `i64`).

use crate::buffer::{ByteReader, SpanBuffer};
use crate::{fixed_int, var_int, Error, Result};

/// A decoded decimal value: `coefficient * 10^exponent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decimal {
    /// The signed coefficient.
    pub coefficient: i64,
    /// The base-10 exponent.
    pub exponent: i64,
}

impl Decimal {
    /// Creates a decimal from coefficient and exponent.
    pub fn new(coefficient: i64, exponent: i64) -> Self {
        Self {
            coefficient,
            exponent,
        }
    }

    /// True for `0d0`, the empty-payload encoding.
    #[inline]
    pub fn is_canonical_zero(&self) -> bool {
        self.coefficient == 0 && self.exponent == 0
    }
}

/// Number of payload bytes [`write`] will emit for `value`.
pub fn payload_len(value: Decimal) -> u64 {
    if value.is_canonical_zero() {
        return 0;
    }
    var_int::encoded_len(value.exponent) + fixed_int::int_len(value.coefficient)
}

/// Appends the decimal payload for `value` (nothing for `0d0`).
///
/// An `i64::MIN` coefficient or exponent is rejected: both readers cap
/// magnitudes at `i64::MAX`, so the payload could never be reparsed.
pub fn write(buf: &mut SpanBuffer, value: Decimal) -> Result<u64> {
    if value.is_canonical_zero() {
        return Ok(0);
    }
    let mut written = var_int::write(buf, value.exponent)?;
    written += fixed_int::write_int(buf, value.coefficient)?;
    Ok(written)
}

/// Reads a decimal payload of exactly `len` bytes.
pub fn read(reader: &mut ByteReader<'_>, len: u64) -> Result<Decimal> {
    if len == 0 {
        return Ok(Decimal::new(0, 0));
    }
    let start = reader.position();
    let exponent = var_int::read(reader)?;
    let consumed = reader.position() - start;
    let coefficient_len = len.checked_sub(consumed).ok_or_else(|| {
        Error::malformed("decimal exponent overruns the declared payload length")
    })?;
    let coefficient = fixed_int::read_int(reader, coefficient_len)?;
    Ok(Decimal::new(coefficient, exponent))
}
