//! Type descriptor codec (Ion 1.0 binary, typed value header).
//!
//! Every encoded value begins with one header byte: the high nibble is the
//! type id, the low nibble encodes the length class or a type-specific
//! special case. Low nibbles 0..=13 are direct payload lengths, 14 means a
//! VarUInt with the true length follows the header, 15 marks the typed null.
//! Booleans reserve 0/1 for false/true, floats reserve 0 for positive zero,
//! and type id 0 with a non-null nibble is NOP padding.

use crate::buffer::ByteReader;
use crate::{var_uint, Error, Result};

/// Low nibble marking "a VarUInt with the real length follows".
pub const LN_IS_VAR_LEN: u8 = 14;
/// Low nibble marking the typed null.
pub const LN_IS_NULL: u8 = 15;
/// Largest payload length expressible directly in the low nibble.
pub const MAX_DIRECT_LENGTH: u64 = 13;

/// Type id of the annotation wrapper pseudo-type.
pub const TID_ANNOTATION: u8 = 14;
/// Reserved type id; always malformed.
pub const TID_RESERVED: u8 = 15;

/// The 4-byte magic/version cookie that precedes the first value of a stream.
pub const BINARY_VERSION_MARKER: [u8; 4] = [0xE0, 0x01, 0x00, 0xEA];

/// The user-visible Ion types (the annotation wrapper and NOP padding are
/// stream-level artifacts, not types).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IonType {
    Null,
    Bool,
    Int,
    Float,
    Decimal,
    Timestamp,
    Symbol,
    String,
    Clob,
    Blob,
    List,
    Sexp,
    Struct,
}

impl IonType {
    /// True for list, sexp and struct.
    #[inline]
    pub fn is_container(self) -> bool {
        matches!(self, Self::List | Self::Sexp | Self::Struct)
    }

    /// The type id this type encodes with (positive int for [`IonType::Int`]).
    pub fn type_id(self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool => 1,
            Self::Int => 2,
            Self::Float => 4,
            Self::Decimal => 5,
            Self::Timestamp => 6,
            Self::Symbol => 7,
            Self::String => 8,
            Self::Clob => 9,
            Self::Blob => 10,
            Self::List => 11,
            Self::Sexp => 12,
            Self::Struct => 13,
        }
    }
}

impl core::fmt::Display for IonType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::Timestamp => "timestamp",
            Self::Symbol => "symbol",
            Self::String => "string",
            Self::Clob => "clob",
            Self::Blob => "blob",
            Self::List => "list",
            Self::Sexp => "sexp",
            Self::Struct => "struct",
        };
        f.write_str(name)
    }
}

/// Maps a header type id to its [`IonType`].
///
/// The annotation wrapper (14) is a pseudo-type the callers handle before
/// asking for an `IonType`; requesting it here is a caller bug surfaced as
/// [`Error::CorruptState`]. Type id 15 is reserved and always malformed.
pub fn ion_type(type_id: u8) -> Result<IonType> {
    Ok(match type_id {
        0 => IonType::Null,
        1 => IonType::Bool,
        2 | 3 => IonType::Int,
        4 => IonType::Float,
        5 => IonType::Decimal,
        6 => IonType::Timestamp,
        7 => IonType::Symbol,
        8 => IonType::String,
        9 => IonType::Clob,
        10 => IonType::Blob,
        11 => IonType::List,
        12 => IonType::Sexp,
        13 => IonType::Struct,
        TID_ANNOTATION => {
            return Err(Error::corrupt(
                "annotation wrapper must be unwrapped before type resolution",
            ))
        }
        TID_RESERVED => return Err(Error::malformed("reserved type id 15")),
        _ => unreachable!("type id is a nibble"),
    })
}

/// A split header byte: `{type_id, low_nibble}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub type_id: u8,
    pub low_nibble: u8,
}

impl TypeDescriptor {
    /// Packs a header byte.
    #[inline]
    pub fn new(type_id: u8, low_nibble: u8) -> Self {
        debug_assert!(type_id < 16 && low_nibble < 16);
        Self {
            type_id,
            low_nibble,
        }
    }

    /// The packed header byte.
    #[inline]
    pub fn byte(self) -> u8 {
        (self.type_id << 4) | self.low_nibble
    }

    /// True if the low nibble marks the typed null.
    #[inline]
    pub fn is_null(self) -> bool {
        self.low_nibble == LN_IS_NULL
    }

    /// True for type id 0 with a non-null nibble (NOP padding).
    #[inline]
    pub fn is_nop_pad(self) -> bool {
        self.type_id == 0 && self.low_nibble != LN_IS_NULL
    }

    /// True for the annotation wrapper pseudo-type.
    #[inline]
    pub fn is_annotation_wrapper(self) -> bool {
        self.type_id == TID_ANNOTATION
    }
}

/// Splits a header byte into type id (high nibble) and low nibble.
#[inline]
pub fn decode_header(byte: u8) -> TypeDescriptor {
    TypeDescriptor {
        type_id: byte >> 4,
        low_nibble: byte & 0x0F,
    }
}

/// Selects the low nibble for a non-null, non-elided payload of `len` bytes:
/// the direct length when it fits, otherwise the VarUInt length marker.
#[inline]
pub fn length_low_nibble(len: u64) -> u8 {
    if len <= MAX_DIRECT_LENGTH {
        len as u8
    } else {
        LN_IS_VAR_LEN
    }
}

/// Decodes the payload length that follows `td`'s header byte, applying the
/// type-dependent low-nibble decision table. The reader must be positioned
/// immediately after the header byte; for the var-len marker the VarUInt is
/// consumed.
///
/// Typed nulls, booleans and the float zero all have zero-length payloads;
/// illegal combinations (reserved type id, bool nibble > 1, float nibble
/// outside {0, 4, 8, 14}) are [`Error::MalformedData`].
pub fn decode_length(td: TypeDescriptor, reader: &mut ByteReader<'_>) -> Result<u64> {
    if td.type_id == TID_RESERVED {
        return Err(Error::malformed("reserved type id 15"));
    }
    if td.is_null() {
        return Ok(0);
    }
    match td.type_id {
        // bool: 0 = false, 1 = true, nie ein Payload
        1 => match td.low_nibble {
            0 | 1 => Ok(0),
            ln => Err(Error::malformed(format!(
                "bool low nibble must be 0, 1 or 15, found {ln}"
            ))),
        },
        // float: 0 = positive Null (elidiert), sonst feste IEEE-Breiten
        4 => match td.low_nibble {
            0 => Ok(0),
            4 | 8 => Ok(u64::from(td.low_nibble)),
            LN_IS_VAR_LEN => {
                let len = var_uint::read(reader)?;
                if len != 4 && len != 8 {
                    return Err(Error::malformed(format!(
                        "float payload must be 4 or 8 bytes, found {len}"
                    )));
                }
                Ok(len)
            }
            ln => Err(Error::malformed(format!(
                "float low nibble must be 0, 4, 8, 14 or 15, found {ln}"
            ))),
        },
        _ => match td.low_nibble {
            LN_IS_VAR_LEN => var_uint::read(reader),
            ln => Ok(u64::from(ln)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::SpanBuffer;

    #[test]
    fn header_splits_into_nibbles() {
        let td = decode_header(0xB3);
        assert_eq!(td.type_id, 11);
        assert_eq!(td.low_nibble, 3);
        assert_eq!(td.byte(), 0xB3);
    }

    #[test]
    fn null_nibble_is_detectable_without_payload() {
        // Header allein genügt: 0x0F ist null.null, 0x4F null.float
        assert!(decode_header(0x0F).is_null());
        assert!(decode_header(0x4F).is_null());
        assert!(!decode_header(0x40).is_null());
    }

    #[test]
    fn nop_padding_detection() {
        assert!(decode_header(0x00).is_nop_pad());
        assert!(decode_header(0x0E).is_nop_pad());
        assert!(!decode_header(0x0F).is_nop_pad());
        assert!(!decode_header(0x10).is_nop_pad());
    }

    #[test]
    fn ion_type_mapping() {
        assert_eq!(ion_type(2).unwrap(), IonType::Int);
        assert_eq!(ion_type(3).unwrap(), IonType::Int);
        assert_eq!(ion_type(13).unwrap(), IonType::Struct);
        assert!(matches!(ion_type(15), Err(Error::MalformedData(_))));
        assert!(matches!(ion_type(14), Err(Error::CorruptState(_))));
    }

    // Längenklassen-Grenze: 13 bleibt direkt, 14 erzwingt den VarUInt-Marker.
    #[test]
    fn length_nibble_boundary_at_13() {
        assert_eq!(length_low_nibble(0), 0);
        assert_eq!(length_low_nibble(13), 13);
        assert_eq!(length_low_nibble(14), LN_IS_VAR_LEN);
        assert_eq!(length_low_nibble(1 << 40), LN_IS_VAR_LEN);
    }

    #[test]
    fn direct_length_consumes_no_extra_bytes() {
        let mut r = ByteReader::new(&[]);
        let len = decode_length(decode_header(0x85), &mut r).unwrap();
        assert_eq!(len, 5);
    }

    #[test]
    fn var_len_reads_following_var_uint() {
        let mut buf = SpanBuffer::new();
        crate::var_uint::write(&mut buf, 300);
        let data = buf.into_vec();
        let mut r = ByteReader::new(&data);
        let len = decode_length(decode_header(0x8E), &mut r).unwrap();
        assert_eq!(len, 300);
        assert!(r.is_exhausted());
    }

    #[test]
    fn bool_nibbles() {
        let mut r = ByteReader::new(&[]);
        assert_eq!(decode_length(decode_header(0x10), &mut r).unwrap(), 0);
        assert_eq!(decode_length(decode_header(0x11), &mut r).unwrap(), 0);
        assert_eq!(decode_length(decode_header(0x1F), &mut r).unwrap(), 0);
        assert!(matches!(
            decode_length(decode_header(0x12), &mut r),
            Err(Error::MalformedData(_))
        ));
    }

    #[test]
    fn float_nibbles() {
        let mut r = ByteReader::new(&[]);
        assert_eq!(decode_length(decode_header(0x40), &mut r).unwrap(), 0);
        assert_eq!(decode_length(decode_header(0x44), &mut r).unwrap(), 4);
        assert_eq!(decode_length(decode_header(0x48), &mut r).unwrap(), 8);
        for byte in [0x41u8, 0x42, 0x43, 0x45, 0x46, 0x47, 0x49, 0x4D] {
            assert!(
                matches!(
                    decode_length(decode_header(byte), &mut r),
                    Err(Error::MalformedData(_))
                ),
                "header {byte:#04x} must be rejected"
            );
        }
    }

    #[test]
    fn float_var_len_must_still_be_ieee_width() {
        // 0x4E mit VarUInt(5): var-len Marker, aber keine IEEE-Breite
        let data = [0x85];
        let mut r = ByteReader::new(&data);
        assert!(matches!(
            decode_length(decode_header(0x4E), &mut r),
            Err(Error::MalformedData(_))
        ));
    }

    #[test]
    fn truncated_var_len_is_eof() {
        let mut r = ByteReader::new(&[0x01]); // VarUInt ohne Terminal-Byte
        assert!(matches!(
            decode_length(decode_header(0x8E), &mut r),
            Err(Error::UnexpectedEof { .. })
        ));
    }
}
