//! rion – Amazon Ion 1.0 binary value engine
//!
//! # Beispiel
//!
//! ```
//! use rion::{Document, IonType, StreamCursor};
//!
//! // {$10: 7, $11: "hi"} als Binärstrom
//! let data = [
//!     0xE0, 0x01, 0x00, 0xEA, // Versionsmarker
//!     0xD7, 0x8A, 0x21, 0x07, 0x8B, 0x82, 0x68, 0x69,
//! ];
//!
//! // Streaming: nur Header lesen, Payloads bei Bedarf
//! let mut cursor = StreamCursor::from_stream(&data).unwrap();
//! assert_eq!(cursor.next().unwrap(), Some(IonType::Struct));
//!
//! // Dokument: lazy laden, mutieren, kanonisch re-encodieren
//! let mut doc = Document::parse(&data).unwrap();
//! let root = doc.roots()[0];
//! let child = doc.children(root).unwrap()[0];
//! assert_eq!(doc.int_value(child).unwrap(), 7);
//! doc.set_int(child, 300).unwrap();
//! let bytes = doc.serialize().unwrap();
//! assert_ne!(bytes, data);
//! ```

pub mod buffer;
pub mod cursor;
pub mod decimal;
pub mod document;
pub mod error;
pub mod fixed_int;
pub mod float;
pub mod symbol_table;
pub mod timestamp;
pub mod type_descriptor;
pub mod value;
pub mod var_int;
pub mod var_uint;

pub use error::{Error, Result};

/// HashMap mit ahash (schneller, nicht DoS-resistent — für interne Datenstrukturen).
pub(crate) type FastHashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;

// Public API: Buffer
pub use buffer::{ByteReader, Span, SpanBuffer};

// Public API: Typsystem
pub use type_descriptor::{IonType, TypeDescriptor, BINARY_VERSION_MARKER};

// Public API: Skalare
pub use decimal::Decimal;
pub use timestamp::{Precision, Timestamp};

// Public API: Symbole
pub use symbol_table::{LocalSymbolTable, SymbolId, SymbolTable, SYSTEM_SYMBOLS};

// Public API: Dokument und Cursor
pub use cursor::StreamCursor;
pub use document::Document;
pub use value::{NodeId, Value};
