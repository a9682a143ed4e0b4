//! Streaming cursor: depth-stack traversal over an encoded byte stream.
//!
//! The cursor walks headers and length prefixes only; payload bytes of values
//! the caller does not ask about are never touched, which makes skipping a
//! container O(1) header reads instead of O(payload size). State is explicit:
//! a stack of `(declared container end, parent is struct)` frames plus an
//! optional current-value descriptor that is valid between a `next()` call
//! and the following `next()`/`step_in()`/`step_out()`.
//!
//! Ende eines Containers und Ende des Streams melden sich beide als
//! `next() -> None`; der Aufrufer unterscheidet sie über [`depth`].
//!
//! [`depth`]: StreamCursor::depth

use crate::buffer::{ByteReader, Span};
use crate::symbol_table::{SymbolId, SymbolTable};
use crate::type_descriptor::{
    decode_header, decode_length, ion_type, IonType, TypeDescriptor, BINARY_VERSION_MARKER,
    LN_IS_NULL, LN_IS_VAR_LEN,
};
use crate::{var_uint, Error, Result};

/// One open container: where it ends and whether its children carry
/// field-name sids.
#[derive(Debug, Clone, Copy)]
struct Frame {
    /// Declared end of the container payload (absolute offset).
    end: usize,
    /// The *enclosing* context this frame restores on `step_out`.
    outer_in_struct: bool,
}

/// The value the cursor currently stands on.
#[derive(Debug, Clone)]
struct Current {
    ion_type: IonType,
    td: TypeDescriptor,
    annotations: Vec<SymbolId>,
    field_name: Option<SymbolId>,
    /// Start of the value's extent (annotation wrapper included,
    /// field-name sid excluded).
    start: usize,
    /// Payload offset and declared length.
    payload: Span,
    /// One past the value's full extent.
    end: usize,
}

/// A depth-stack walker over an encoded Ion binary stream.
pub struct StreamCursor<'a> {
    data: &'a [u8],
    pos: usize,
    /// Declared end of the innermost open container (data length at depth 0).
    limit: usize,
    in_struct: bool,
    stack: Vec<Frame>,
    current: Option<Current>,
}

impl<'a> StreamCursor<'a> {
    /// Creates a cursor over `data`, which must already be positioned past
    /// the stream's version marker.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            limit: data.len(),
            in_struct: false,
            stack: Vec::new(),
            current: None,
        }
    }

    /// Creates a cursor over a whole stream, checking and skipping the
    /// 4-byte magic/version cookie.
    pub fn from_stream(data: &'a [u8]) -> Result<Self> {
        if data.len() < BINARY_VERSION_MARKER.len() {
            return Err(Error::eof(
                BINARY_VERSION_MARKER.len() as u64,
                data.len() as u64,
            ));
        }
        if data[..4] != BINARY_VERSION_MARKER {
            return Err(Error::malformed("missing or unsupported Ion version marker"));
        }
        Ok(Self::new(&data[4..]))
    }

    /// Cursor over a container payload (crate-internal: used by the document
    /// to enumerate children without materializing them).
    pub(crate) fn in_container(data: &'a [u8], in_struct: bool) -> Self {
        let mut cursor = Self::new(data);
        cursor.in_struct = in_struct;
        cursor
    }

    /// Current nesting depth; 0 at top level.
    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Byte offsets the cursor has consumed so far (diagnostic).
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Upper bound of readable bytes inside the current frame: the declared
    /// container end may lie beyond the actually available data.
    #[inline]
    fn available_limit(&self) -> usize {
        self.limit.min(self.data.len())
    }

    fn current(&self) -> Result<&Current> {
        self.current
            .as_ref()
            .ok_or_else(|| Error::illegal_state("no current value; call next() first"))
    }

    /// Advances past the current value (headers only) and decodes the next
    /// header. Returns `None` at the end of the current container's children
    /// or, at depth 0, the end of the stream.
    pub fn next(&mut self) -> Result<Option<IonType>> {
        let mut pos = match self.current.take() {
            Some(current) => current.end,
            None => self.pos,
        };
        loop {
            if pos >= self.limit {
                if pos > self.limit {
                    // Das Ende des übersprungenen Werts liegt hinter der
                    // Grenze des Rahmens: am Top-Level fehlen reale Bytes.
                    return Err(Error::eof((pos - self.limit) as u64, 0));
                }
                // Normales Ende: Container-Kinder bzw. Top-Level erschöpft
                self.pos = self.limit;
                return Ok(None);
            }
            let available = self.available_limit();
            if pos > available {
                // Das deklarierte Containerende liegt hinter den realen Daten
                return Err(Error::eof((pos - available) as u64, 0));
            }
            let mut r = ByteReader::new(&self.data[pos..available]);

            let field_name = if self.in_struct {
                Some(var_uint::read(&mut r)?)
            } else {
                None
            };
            let start = pos + r.position() as usize;

            let header = r.read_u8()?;
            let td = decode_header(header);

            if td.is_nop_pad() {
                // NOP-Padding in einem Struct verlangt Feldname Sid 0
                if matches!(field_name, Some(sid) if sid != 0) {
                    return Err(Error::malformed(
                        "NOP padding in a struct requires field name sid 0",
                    ));
                }
                let len = decode_length(td, &mut r)?;
                r.skip(len)?;
                pos += r.position() as usize;
                continue;
            }

            let (inner_td, annotations, wrapper_end) = if td.is_annotation_wrapper() {
                self.read_annotation_wrapper(td, &mut r, pos)?
            } else {
                (td, Vec::new(), None)
            };

            let payload_len = decode_length(inner_td, &mut r)?;
            let payload_start = pos + r.position() as usize;
            let end = payload_start + payload_len as usize;

            if let Some(wrapper_end) = wrapper_end {
                if end != wrapper_end {
                    return Err(Error::malformed(
                        "annotation wrapper extent disagrees with its wrapped value",
                    ));
                }
            }
            // Ein Kind darf das deklarierte Ende seines Containers nicht
            // überschreiten; am Top-Level gibt es keine deklarierte Grenze.
            if !self.stack.is_empty() && end > self.limit {
                return Err(Error::malformed(
                    "value extent overruns its container's declared end",
                ));
            }

            let ion = ion_type(inner_td.type_id)?;
            // Skalare brauchen ihr Payload sofort; Container-Payloads werden
            // erst beim Betreten angefasst (Lazy-Pfad).
            if !ion.is_container() && end > available {
                return Err(Error::eof(
                    (end - available) as u64,
                    (available - payload_start.min(available)) as u64,
                ));
            }

            self.pos = pos;
            self.current = Some(Current {
                ion_type: ion,
                td: inner_td,
                annotations,
                field_name,
                start,
                payload: Span::new(payload_start as u64, payload_len),
                end,
            });
            return Ok(Some(ion));
        }
    }

    /// Parses an annotation wrapper header: returns the inner value's
    /// descriptor, the annotation sids in encounter order, and the wrapper's
    /// declared extent end for the later consistency check.
    fn read_annotation_wrapper(
        &self,
        td: TypeDescriptor,
        r: &mut ByteReader<'a>,
        pos: usize,
    ) -> Result<(TypeDescriptor, Vec<SymbolId>, Option<usize>)> {
        let wrapper_len = match td.low_nibble {
            LN_IS_NULL => {
                return Err(Error::malformed("annotation wrapper cannot be null"))
            }
            LN_IS_VAR_LEN => var_uint::read(r)?,
            ln if ln >= 3 => u64::from(ln),
            ln => {
                return Err(Error::malformed(format!(
                    "annotation wrapper length must be at least 3, found {ln}"
                )))
            }
        };
        let wrapper_end = pos + r.position() as usize + wrapper_len as usize;

        let annot_total = var_uint::read(r)?;
        if annot_total == 0 {
            return Err(Error::malformed("annotation wrapper without annotations"));
        }
        let annots_end = r.position() + annot_total;
        let mut annotations = Vec::new();
        while r.position() < annots_end {
            annotations.push(var_uint::read(r)?);
        }
        if r.position() != annots_end {
            return Err(Error::malformed(
                "annotation sids overrun their declared length",
            ));
        }

        let inner = decode_header(r.read_u8()?);
        if inner.is_annotation_wrapper() {
            return Err(Error::malformed("nested annotation wrapper"));
        }
        if inner.is_nop_pad() {
            return Err(Error::malformed("annotated NOP padding"));
        }
        Ok((inner, annotations, Some(wrapper_end)))
    }

    /// Steps into the current container value.
    ///
    /// Fails with [`Error::IllegalCursorState`] (state unchanged) when there
    /// is no current value, it is a scalar, or it is a null container.
    pub fn step_in(&mut self) -> Result<()> {
        let current = self.current()?;
        if !current.ion_type.is_container() {
            return Err(Error::illegal_state("current value is not a container"));
        }
        if current.td.is_null() {
            return Err(Error::illegal_state("cannot step into a null container"));
        }
        let payload = current.payload;
        let entering_struct = current.ion_type == IonType::Struct;
        self.stack.push(Frame {
            end: self.limit,
            outer_in_struct: self.in_struct,
        });
        self.limit = payload.end() as usize;
        self.pos = payload.offset as usize;
        self.in_struct = entering_struct;
        self.current = None;
        Ok(())
    }

    /// Steps out of the innermost container, skipping all unread children by
    /// their length prefixes alone; their payloads are never decoded.
    pub fn step_out(&mut self) -> Result<()> {
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| Error::illegal_state("step_out at depth 0"))?;
        self.pos = self.limit;
        self.limit = frame.end;
        self.in_struct = frame.outer_in_struct;
        self.current = None;
        Ok(())
    }

    /// Type of the current value.
    pub fn ion_type(&self) -> Result<IonType> {
        Ok(self.current()?.ion_type)
    }

    /// True if the current value is a typed null, answered from the header
    /// nibble alone.
    pub fn is_null(&self) -> Result<bool> {
        Ok(self.current()?.td.is_null())
    }

    /// Annotation sids of the current value, in encounter order.
    pub fn annotations(&self) -> Result<&[SymbolId]> {
        Ok(&self.current()?.annotations)
    }

    /// Resolves the current value's annotations through `table`; an id with
    /// no binding fails with [`Error::UnresolvedSymbol`].
    pub fn annotation_text<'t>(&self, table: &'t dyn SymbolTable) -> Result<Vec<&'t str>> {
        self.current()?
            .annotations
            .iter()
            .map(|&sid| table.resolve(sid).ok_or(Error::UnresolvedSymbol(sid)))
            .collect()
    }

    /// Field-name sid of the current value; `None` outside a struct.
    pub fn field_name(&self) -> Result<Option<SymbolId>> {
        Ok(self.current()?.field_name)
    }

    /// Resolves the current value's field name through `table`.
    pub fn field_name_text<'t>(&self, table: &'t dyn SymbolTable) -> Result<Option<&'t str>> {
        match self.current()?.field_name {
            None => Ok(None),
            Some(sid) => table
                .resolve(sid)
                .map(Some)
                .ok_or(Error::UnresolvedSymbol(sid)),
        }
    }

    /// Payload span of the current value (for collaborators that read
    /// payload bytes themselves).
    pub fn value_span(&self) -> Result<Span> {
        Ok(self.current()?.payload)
    }

    // Crate-internal accessors for the document's span scanning.

    pub(crate) fn current_td(&self) -> Result<TypeDescriptor> {
        Ok(self.current()?.td)
    }

    pub(crate) fn current_extent(&self) -> Result<(usize, usize)> {
        let current = self.current()?;
        Ok((current.start, current.end))
    }

    pub(crate) fn take_annotations(&mut self) -> Vec<SymbolId> {
        match &mut self.current {
            Some(current) => core::mem::take(&mut current.annotations),
            None => Vec::new(),
        }
    }
}
