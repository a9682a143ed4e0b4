//! Central error types for the Ion 1.0 binary codec.
//!
//! Each variant corresponds to one failure class of the binary format:
//! truncation, malformed encodings, container-ownership violations, typed
//! access on incompatible values, symbol resolution, cursor misuse and
//! internal invariant violations. None of these are retried internally.

use core::fmt;
use std::borrow::Cow;

use crate::symbol_table::SymbolId;
use crate::type_descriptor::IonType;

/// All error conditions surfaced by the binary value engine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The stream or span ends before a declared length is satisfied
    /// (truncated payload, truncated container, truncated VarUInt).
    UnexpectedEof {
        /// Bytes the decoder still needed.
        needed: u64,
        /// Bytes actually remaining.
        remaining: u64,
    },
    /// The encoded data violates the Ion 1.0 binary grammar: reserved type id,
    /// invalid low-nibble/length combination, non-minimal VarUInt, wrong
    /// fixed-width float payload length, invalid UTF-8 in a string, etc.
    MalformedData(Cow<'static, str>),
    /// Attempt to insert a value that already belongs to a container.
    /// The insert is all-or-nothing; no partial mutation occurred.
    ContainedValue,
    /// A typed accessor was invoked on a null value or on a value of the
    /// wrong kind. Node state is unchanged.
    NullOrTypeMismatch {
        /// The type the accessor expected.
        expected: IonType,
        /// The actual type, or `None` when the value is a typed null.
        found: Option<IonType>,
    },
    /// An annotation, field name or symbol value references a symbol id with
    /// no binding in the active symbol table. The id itself stays retrievable.
    UnresolvedSymbol(SymbolId),
    /// `step_in`/`step_out`/value access was called outside its valid state
    /// window. Cursor state is left unchanged so the caller can inspect it.
    IllegalCursorState(Cow<'static, str>),
    /// An internal invariant was violated (e.g. a freshly re-read header byte
    /// disagrees with the cached type descriptor). Fatal for the document.
    CorruptState(Cow<'static, str>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof { needed, remaining } => write!(
                f,
                "unexpected end of data: needed {needed} more byte(s), {remaining} remaining"
            ),
            Self::MalformedData(msg) => write!(f, "malformed Ion binary data: {msg}"),
            Self::ContainedValue => {
                write!(f, "value already belongs to a container; remove it first")
            }
            Self::NullOrTypeMismatch { expected, found } => match found {
                Some(found) => write!(
                    f,
                    "typed accessor mismatch: expected {expected}, value is {found}"
                ),
                None => write!(f, "typed accessor invoked on null.{expected}"),
            },
            Self::UnresolvedSymbol(sid) => {
                write!(f, "symbol id ${sid} has no binding in the active symbol table")
            }
            Self::IllegalCursorState(msg) => write!(f, "illegal cursor state: {msg}"),
            Self::CorruptState(msg) => write!(f, "corrupt internal state: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Shorthand for [`Error::MalformedData`].
    pub fn malformed(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::MalformedData(msg.into())
    }

    /// Shorthand for [`Error::IllegalCursorState`].
    pub fn illegal_state(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::IllegalCursorState(msg.into())
    }

    /// Shorthand for [`Error::CorruptState`].
    pub fn corrupt(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::CorruptState(msg.into())
    }

    /// Shorthand for [`Error::UnexpectedEof`].
    pub fn eof(needed: u64, remaining: u64) -> Self {
        Self::UnexpectedEof { needed, remaining }
    }
}

/// A convenience `Result` type alias using [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
