//! The lazy value node: span-backed or materialized, never ambiguously both.
//!
//! A [`Node`] is the atomic unit of the value tree. Its [`Backing`] is a
//! tagged union: either an unread `(span, type descriptor)` pair into the
//! document buffer, or a materialized native [`Value`] with a dirty flag.
//! Containers store child node ids; ownership lives in the
//! [`Document`](crate::document::Document) arena, and a node's parent link is
//! a plain index back into it, never an owning edge.

use crate::buffer::{ByteReader, Span, SpanBuffer};
use crate::decimal::{self, Decimal};
use crate::symbol_table::SymbolId;
use crate::timestamp::{self, Timestamp};
use crate::type_descriptor::{length_low_nibble, IonType, TypeDescriptor, LN_IS_NULL};
use crate::{fixed_int, float, var_uint, Error, Result};

/// Handle to a node inside a [`Document`](crate::document::Document) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A materialized native value (closed variant set, one per Ion type).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A typed null; `Null(IonType::Null)` is `null.null`.
    Null(IonType),
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Timestamp(Timestamp),
    /// A symbol by id; sid 0 is "known symbol, unknown text".
    Symbol(SymbolId),
    String(String),
    Clob(Vec<u8>),
    Blob(Vec<u8>),
    List(Vec<NodeId>),
    Sexp(Vec<NodeId>),
    Struct(Vec<NodeId>),
}

impl Value {
    /// The Ion type of this value.
    pub fn ion_type(&self) -> IonType {
        match self {
            Self::Null(t) => *t,
            Self::Bool(_) => IonType::Bool,
            Self::Int(_) => IonType::Int,
            Self::Float(_) => IonType::Float,
            Self::Decimal(_) => IonType::Decimal,
            Self::Timestamp(_) => IonType::Timestamp,
            Self::Symbol(_) => IonType::Symbol,
            Self::String(_) => IonType::String,
            Self::Clob(_) => IonType::Clob,
            Self::Blob(_) => IonType::Blob,
            Self::List(_) => IonType::List,
            Self::Sexp(_) => IonType::Sexp,
            Self::Struct(_) => IonType::Struct,
        }
    }

    /// True for every typed null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null(_))
    }

    /// Child ids for containers, `None` for scalars and nulls.
    pub(crate) fn children(&self) -> Option<&[NodeId]> {
        match self {
            Self::List(ids) | Self::Sexp(ids) | Self::Struct(ids) => Some(ids),
            _ => None,
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            Self::List(ids) | Self::Sexp(ids) | Self::Struct(ids) => Some(ids),
            _ => None,
        }
    }

    /// The header type id this value encodes with (3 for negative ints).
    pub(crate) fn type_id(&self) -> u8 {
        match self {
            Self::Int(v) if *v < 0 => 3,
            other => other.ion_type().type_id(),
        }
    }
}

/// Backing state of a node: exactly one of the two holds at any time.
#[derive(Debug, Clone)]
pub(crate) enum Backing {
    /// Bound to an encoded span (payload unread). `td` is the inner value's
    /// descriptor recorded at scan time; `span` covers the full extent
    /// including an annotation wrapper, excluding a struct field-name sid.
    Unmaterialized { span: Span, td: TypeDescriptor },
    /// Holds a native value. `dirty` means the value was set or mutated
    /// since it was last encoded, so any cached length is stale.
    Materialized { value: Value, dirty: bool },
}

/// One value in the arena: backing plus annotations and membership links.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) backing: Backing,
    pub(crate) annotations: Vec<SymbolId>,
    /// Set only while the node is a struct member.
    pub(crate) field_name: Option<SymbolId>,
    /// Back-reference to the owning container, never an ownership edge.
    pub(crate) parent: Option<NodeId>,
}

impl Node {
    pub(crate) fn from_value(value: Value) -> Self {
        Self {
            // Direkt aus einem nativen Wert gebaut: nie encodiert, also dirty
            backing: Backing::Materialized { value, dirty: true },
            annotations: Vec::new(),
            field_name: None,
            parent: None,
        }
    }

    pub(crate) fn from_span(span: Span, td: TypeDescriptor) -> Self {
        Self {
            backing: Backing::Unmaterialized { span, td },
            annotations: Vec::new(),
            field_name: None,
            parent: None,
        }
    }

    /// Answerable without reading any payload byte (header nibble only).
    pub(crate) fn is_null_shallow(&self) -> bool {
        match &self.backing {
            Backing::Unmaterialized { td, .. } => td.is_null(),
            Backing::Materialized { value, .. } => value.is_null(),
        }
    }

    pub(crate) fn is_dirty(&self) -> bool {
        matches!(self.backing, Backing::Materialized { dirty: true, .. })
    }
}

// ============================================================================
// Scalar payload codec
// ============================================================================

/// Decodes a non-null scalar payload for `td` from exactly `payload`.
pub(crate) fn decode_scalar(td: TypeDescriptor, payload: &[u8]) -> Result<Value> {
    debug_assert!(!td.is_null(), "typed nulls carry no payload");
    let len = payload.len() as u64;
    let mut r = ByteReader::new(payload);
    let value = match td.type_id {
        1 => Value::Bool(td.low_nibble == 1),
        2 => {
            let magnitude = fixed_int::read_uint(&mut r, len)?;
            if magnitude > i64::MAX as u64 {
                return Err(Error::malformed("int magnitude exceeds the supported width"));
            }
            Value::Int(magnitude as i64)
        }
        3 => {
            let magnitude = fixed_int::read_uint(&mut r, len)?;
            if magnitude == 0 {
                return Err(Error::malformed("negative int with magnitude zero"));
            }
            if magnitude > (i64::MAX as u64) + 1 {
                return Err(Error::malformed("int magnitude exceeds the supported width"));
            }
            // 2^63 ist als i64::MIN noch darstellbar
            Value::Int((magnitude as i64).wrapping_neg())
        }
        4 => Value::Float(float::read(&mut r, len)?),
        5 => Value::Decimal(decimal::read(&mut r, len)?),
        6 => Value::Timestamp(timestamp::read(&mut r, len)?),
        7 => {
            if len == 0 {
                // Sid 0 wird als leeres Payload encodiert
                Value::Symbol(0)
            } else {
                let sid = var_uint::read(&mut r)?;
                if !r.is_exhausted() {
                    return Err(Error::malformed(
                        "symbol payload longer than its VarUInt id",
                    ));
                }
                Value::Symbol(sid)
            }
        }
        8 => {
            let bytes = r.read_slice(len)?;
            let text = core::str::from_utf8(bytes)
                .map_err(|_| Error::malformed("string payload is not valid UTF-8"))?;
            Value::String(text.to_owned())
        }
        9 => Value::Clob(r.read_slice(len)?.to_vec()),
        10 => Value::Blob(r.read_slice(len)?.to_vec()),
        other => {
            return Err(Error::corrupt(format!(
                "decode_scalar called for non-scalar type id {other}"
            )))
        }
    };
    Ok(value)
}

/// Number of payload bytes the scalar encoding of `value` occupies.
pub(crate) fn scalar_payload_len(value: &Value) -> u64 {
    match value {
        Value::Null(_) | Value::Bool(_) => 0,
        Value::Int(v) => fixed_int::uint_len(v.unsigned_abs()),
        Value::Float(f) => float::payload_len(*f),
        Value::Decimal(d) => decimal::payload_len(*d),
        Value::Timestamp(ts) => timestamp::payload_len(ts),
        Value::Symbol(0) => 0,
        Value::Symbol(sid) => var_uint::encoded_len(*sid),
        Value::String(s) => s.len() as u64,
        Value::Clob(b) | Value::Blob(b) => b.len() as u64,
        Value::List(_) | Value::Sexp(_) | Value::Struct(_) => {
            unreachable!("container payload lengths are computed by the document")
        }
    }
}

/// The low nibble the scalar encoding of `value` carries: null marker, the
/// bool/float elisions, the direct length, or the var-len marker.
pub(crate) fn scalar_low_nibble(value: &Value) -> u8 {
    match value {
        Value::Null(_) => LN_IS_NULL,
        Value::Bool(b) => u8::from(*b),
        Value::Float(f) if float::is_elidable_zero(*f) => 0,
        other => length_low_nibble(scalar_payload_len(other)),
    }
}

/// Appends the scalar payload of `value`, returning the bytes written.
pub(crate) fn write_scalar_payload(buf: &mut SpanBuffer, value: &Value) -> Result<u64> {
    match value {
        Value::Null(_) | Value::Bool(_) => Ok(0),
        Value::Int(v) => Ok(fixed_int::write_uint(buf, v.unsigned_abs())),
        Value::Float(f) => Ok(float::write(buf, *f)),
        Value::Decimal(d) => decimal::write(buf, *d),
        Value::Timestamp(ts) => timestamp::write(buf, ts),
        Value::Symbol(0) => Ok(0),
        Value::Symbol(sid) => Ok(var_uint::write(buf, *sid)),
        Value::String(s) => Ok(buf.write_all(s.as_bytes()).length),
        Value::Clob(b) | Value::Blob(b) => Ok(buf.write_all(b).length),
        Value::List(_) | Value::Sexp(_) | Value::Struct(_) => Err(Error::corrupt(
            "write_scalar_payload called for a container",
        )),
    }
}
