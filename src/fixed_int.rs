//! Fixed-width integer payloads (Ion 1.0 binary, UInt and Int fields).
//!
//! A UInt field is a big-endian magnitude occupying exactly the declared
//! payload length; an empty payload is zero. The sign of an int *value* is
//! carried by its type id, not here. An Int field (used inside decimal
//! payloads) additionally reserves the high bit of the first octet as the
//! sign. Writers emit minimal octets; readers accept leading zero octets.

use crate::buffer::{ByteReader, SpanBuffer};
use crate::{Error, Result};

/// Number of bytes the minimal UInt encoding of `magnitude` occupies.
/// Zero needs no payload octets at all.
#[inline]
pub fn uint_len(magnitude: u64) -> u64 {
    ((64 - magnitude.leading_zeros() as u64) + 7) / 8
}

/// Appends the minimal big-endian UInt encoding of `magnitude`.
pub fn write_uint(buf: &mut SpanBuffer, magnitude: u64) -> u64 {
    let len = uint_len(magnitude);
    let be = magnitude.to_be_bytes();
    buf.write_all(&be[(8 - len as usize)..]);
    len
}

/// Reads a big-endian UInt magnitude of exactly `len` bytes.
///
/// Magnitudes that do not fit the supported `u64` width are malformed.
pub fn read_uint(reader: &mut ByteReader<'_>, len: u64) -> Result<u64> {
    let bytes = reader.read_slice(len)?;
    let mut magnitude: u64 = 0;
    for &b in bytes {
        if magnitude > u64::MAX >> 8 {
            return Err(Error::malformed("UInt magnitude exceeds 64 bits"));
        }
        magnitude = (magnitude << 8) | u64::from(b);
    }
    Ok(magnitude)
}

/// Number of bytes the minimal Int encoding of `value` occupies.
#[inline]
pub fn int_len(value: i64) -> u64 {
    let magnitude = value.unsigned_abs();
    if magnitude == 0 {
        return 0;
    }
    let bits = 64 - magnitude.leading_zeros() as u64;
    // Ein Bit für das Vorzeichen im ersten Oktett
    (bits + 1 + 7) / 8
}

/// Appends the minimal sign-magnitude Int encoding of `value`.
///
/// `i64::MIN` is rejected up front: its magnitude does not fit the 63 bits
/// [`read_int`] enforces, so the value could never be reparsed.
pub fn write_int(buf: &mut SpanBuffer, value: i64) -> Result<u64> {
    if value == i64::MIN {
        return Err(Error::malformed("Int magnitude exceeds 63 bits"));
    }
    let magnitude = value.unsigned_abs();
    let len = int_len(value);
    if len == 0 {
        return Ok(0);
    }
    let be = magnitude.to_be_bytes();
    let start = 8 - len as usize;
    if value < 0 {
        buf.push(be[start] | 0x80);
    } else {
        buf.push(be[start]);
    }
    buf.write_all(&be[start + 1..]);
    Ok(len)
}

/// Reads a sign-magnitude Int of exactly `len` bytes.
pub fn read_int(reader: &mut ByteReader<'_>, len: u64) -> Result<i64> {
    if len == 0 {
        return Ok(0);
    }
    let bytes = reader.read_slice(len)?;
    let negative = bytes[0] & 0x80 != 0;
    let mut magnitude = u64::from(bytes[0] & 0x7F);
    for &b in &bytes[1..] {
        if magnitude > u64::MAX >> 8 {
            return Err(Error::malformed("Int magnitude exceeds 64 bits"));
        }
        magnitude = (magnitude << 8) | u64::from(b);
    }
    if magnitude > i64::MAX as u64 {
        return Err(Error::malformed("Int magnitude exceeds 63 bits"));
    }
    if negative {
        // Minus null wird zu null normalisiert (Koeffizienten-Modell ist i64)
        Ok(-(magnitude as i64))
    } else {
        Ok(magnitude as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uint_round_trip(magnitude: u64) -> u64 {
        let mut buf = SpanBuffer::new();
        let len = write_uint(&mut buf, magnitude);
        let data = buf.into_vec();
        assert_eq!(data.len() as u64, len);
        assert_eq!(len, uint_len(magnitude));
        let mut r = ByteReader::new(&data);
        read_uint(&mut r, len).unwrap()
    }

    fn int_round_trip(value: i64) -> i64 {
        let mut buf = SpanBuffer::new();
        let len = write_int(&mut buf, value).unwrap();
        let data = buf.into_vec();
        assert_eq!(data.len() as u64, len);
        assert_eq!(len, int_len(value));
        let mut r = ByteReader::new(&data);
        read_int(&mut r, len).unwrap()
    }

    // Null hat die minimale Länge 0: leeres Payload decodiert zu 0.
    #[test]
    fn uint_zero_is_empty() {
        assert_eq!(uint_len(0), 0);
        assert_eq!(uint_round_trip(0), 0);
    }

    #[test]
    fn uint_round_trips() {
        for &v in &[1, 255, 256, 65535, 65536, u64::MAX] {
            assert_eq!(uint_round_trip(v), v, "round-trip failed for {v}");
        }
    }

    #[test]
    fn uint_is_big_endian() {
        let mut buf = SpanBuffer::new();
        write_uint(&mut buf, 0x0102);
        assert_eq!(buf.as_bytes(), &[0x01, 0x02]);
    }

    // Reader akzeptiert führende Null-Oktette (nicht-minimal, aber legal).
    #[test]
    fn uint_accepts_leading_zero_octets() {
        let mut r = ByteReader::new(&[0x00, 0x00, 0x2A]);
        assert_eq!(read_uint(&mut r, 3).unwrap(), 42);
    }

    #[test]
    fn uint_nine_significant_bytes_is_malformed() {
        let data = [0x01u8, 0, 0, 0, 0, 0, 0, 0, 0];
        let mut r = ByteReader::new(&data);
        assert!(matches!(read_uint(&mut r, 9), Err(Error::MalformedData(_))));
    }

    #[test]
    fn uint_truncated_is_eof() {
        let mut r = ByteReader::new(&[0x01]);
        assert!(matches!(read_uint(&mut r, 4), Err(Error::UnexpectedEof { .. })));
    }

    #[test]
    fn int_sign_bit_in_first_octet() {
        let mut buf = SpanBuffer::new();
        write_int(&mut buf, -5).unwrap();
        assert_eq!(buf.as_bytes(), &[0x85]);
        let mut buf = SpanBuffer::new();
        write_int(&mut buf, 5).unwrap();
        assert_eq!(buf.as_bytes(), &[0x05]);
    }

    // 200 passt nicht mehr in 7 Magnitude-Bits plus Sign: zwei Oktette.
    #[test]
    fn int_grows_when_sign_bit_collides() {
        assert_eq!(int_len(127), 1);
        assert_eq!(int_len(128), 2);
        let mut buf = SpanBuffer::new();
        write_int(&mut buf, -200).unwrap();
        assert_eq!(buf.as_bytes(), &[0x80, 0xC8]);
    }

    #[test]
    fn int_round_trips() {
        for &v in &[0, 1, -1, 127, -127, 128, -128, i64::MAX, -i64::MAX] {
            assert_eq!(int_round_trip(v), v, "round-trip failed for {v}");
        }
    }

    // Betrag 2^63 passt nicht in das 63-Bit-Modell des Readers; der Writer
    // lehnt ab, statt ein unparsebares Payload zu erzeugen.
    #[test]
    fn int_i64_min_is_rejected_on_write() {
        let mut buf = SpanBuffer::new();
        let err = write_int(&mut buf, i64::MIN).unwrap_err();
        assert!(matches!(err, Error::MalformedData(_)), "{err}");
        assert!(buf.is_empty());
    }

    #[test]
    fn int_negative_zero_normalizes_to_zero() {
        let mut r = ByteReader::new(&[0x80]);
        assert_eq!(read_int(&mut r, 1).unwrap(), 0);
    }
}
