//! Float payloads (Ion 1.0 binary, type id 4).
//!
//! Payloads are IEEE-754 big-endian, either binary32 (4 octets) or binary64
//! (8 octets); no other payload length is legal. Positive zero is the one
//! value the format elides entirely (low nibble 0, zero-length payload).
//! Negative zero, infinities and NaN all need a real payload.

use crate::buffer::{ByteReader, SpanBuffer};
use crate::{Error, Result};

/// Payload length of the binary32 representation.
pub const LEN_BINARY32: u64 = 4;
/// Payload length of the binary64 representation.
pub const LEN_BINARY64: u64 = 8;

/// True if `value` is IEEE-754 positive zero, the only elidable float.
#[inline]
pub fn is_elidable_zero(value: f64) -> bool {
    value.to_bits() == 0
}

/// Number of payload bytes [`write`] will emit for `value`.
#[inline]
pub fn payload_len(value: f64) -> u64 {
    if is_elidable_zero(value) {
        0
    } else {
        LEN_BINARY64
    }
}

/// Appends the float payload for `value` (nothing for positive zero).
pub fn write(buf: &mut SpanBuffer, value: f64) -> u64 {
    if is_elidable_zero(value) {
        return 0;
    }
    buf.write_all(&value.to_bits().to_be_bytes());
    LEN_BINARY64
}

/// Reads a float payload of the declared length.
///
/// Length 0 is positive zero; 4 and 8 are the two IEEE-754 widths; anything
/// else is [`Error::MalformedData`].
pub fn read(reader: &mut ByteReader<'_>, len: u64) -> Result<f64> {
    match len {
        0 => Ok(0.0),
        LEN_BINARY32 => {
            let bytes = reader.read_slice(LEN_BINARY32)?;
            let mut raw = [0u8; 4];
            raw.copy_from_slice(bytes);
            Ok(f64::from(f32::from_be_bytes(raw)))
        }
        LEN_BINARY64 => {
            let bytes = reader.read_slice(LEN_BINARY64)?;
            let mut raw = [0u8; 8];
            raw.copy_from_slice(bytes);
            Ok(f64::from_be_bytes(raw))
        }
        other => Err(Error::malformed(format!(
            "float payload must be 0, 4 or 8 bytes, found {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(value: f64) -> f64 {
        let mut buf = SpanBuffer::new();
        let len = write(&mut buf, value);
        let data = buf.into_vec();
        assert_eq!(data.len() as u64, len);
        assert_eq!(len, payload_len(value));
        let mut r = ByteReader::new(&data);
        read(&mut r, len).unwrap()
    }

    // Positive Null wird komplett elidiert; das Payload ist leer.
    #[test]
    fn positive_zero_is_elided() {
        assert_eq!(payload_len(0.0), 0);
        let got = round_trip(0.0);
        assert_eq!(got.to_bits(), 0.0f64.to_bits());
    }

    // Negative Null ist NICHT elidierbar (Bitmuster wäre verloren).
    #[test]
    fn negative_zero_keeps_its_payload() {
        assert_eq!(payload_len(-0.0), LEN_BINARY64);
        let got = round_trip(-0.0);
        assert_eq!(got.to_bits(), (-0.0f64).to_bits());
    }

    #[test]
    fn round_trips_binary64() {
        for &v in &[1.0, -1.5, 3.141592653589793, f64::MIN, f64::MAX, f64::INFINITY] {
            assert_eq!(round_trip(v).to_bits(), v.to_bits());
        }
        assert!(round_trip(f64::NAN).is_nan());
    }

    #[test]
    fn reads_binary32_payload() {
        let bytes = 2.5f32.to_be_bytes();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(read(&mut r, 4).unwrap(), 2.5);
    }

    #[test]
    fn illegal_payload_length_is_malformed() {
        for len in [1u64, 2, 3, 5, 6, 7, 9] {
            let data = vec![0u8; len as usize];
            let mut r = ByteReader::new(&data);
            assert!(
                matches!(read(&mut r, len), Err(Error::MalformedData(_))),
                "length {len} must be rejected"
            );
        }
    }

    #[test]
    fn truncated_payload_is_eof() {
        let mut r = ByteReader::new(&[0x3F, 0xF0]);
        assert!(matches!(read(&mut r, 8), Err(Error::UnexpectedEof { .. })));
    }
}
