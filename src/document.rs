//! Arena document: owns the byte buffer, every node, and the root list.
//!
//! All nodes of one stream live in a flat `Vec<Node>`; a [`NodeId`] is an
//! index into it. Containers reference their children by id and children
//! carry a plain parent back-reference, so the tree has no owning cycles and
//! no `Rc` at all. Materialization is shallow: reading a container discovers
//! its direct children as span-backed nodes and leaves their payloads
//! untouched.
//!
//! Encoding has two paths. A node that was never materialized is copied
//! verbatim from the source buffer, annotation wrapper and all. Everything
//! else is re-encoded canonically (minimal lengths, held field order).

use crate::buffer::{Span, SpanBuffer};
use crate::decimal::Decimal;
use crate::symbol_table::{LocalSymbolTable, SymbolId, SymbolTable};
use crate::timestamp::Timestamp;
use crate::type_descriptor::{
    ion_type, length_low_nibble, IonType, TypeDescriptor, BINARY_VERSION_MARKER,
    MAX_DIRECT_LENGTH, TID_ANNOTATION,
};
use crate::value::{
    decode_scalar, scalar_low_nibble, scalar_payload_len, write_scalar_payload, Backing, Node,
    NodeId, Value,
};
use crate::{var_uint, Error, Result, StreamCursor};

/// Child descriptor collected while scanning a container payload.
type ChildDesc = (Span, TypeDescriptor, Vec<SymbolId>, Option<SymbolId>);

enum Scanned {
    Scalar(Value),
    Container(IonType, Vec<ChildDesc>),
}

/// An Ion binary document: buffer, node arena, roots and symbol table.
#[derive(Debug)]
pub struct Document {
    buffer: SpanBuffer,
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    symbols: LocalSymbolTable,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates an empty document (no buffer bytes, no roots).
    pub fn new() -> Self {
        Self {
            buffer: SpanBuffer::new(),
            nodes: Vec::new(),
            roots: Vec::new(),
            symbols: LocalSymbolTable::new(),
        }
    }

    /// Parses a binary stream: checks the version marker, then records each
    /// top-level value as a span-backed node. No payload byte of any value is
    /// read here; scalars and containers alike stay unmaterialized.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = StreamCursor::from_stream(data)?;
        let mut scanned = Vec::new();
        while cursor.next()?.is_some() {
            let td = cursor.current_td()?;
            let (start, end) = cursor.current_extent()?;
            let annotations = cursor.take_annotations();
            scanned.push((
                Span::new(start as u64, (end - start) as u64),
                td,
                annotations,
            ));
        }

        let mut doc = Self::new();
        doc.buffer = SpanBuffer::from_vec(data[BINARY_VERSION_MARKER.len()..].to_vec());
        for (span, td, annotations) in scanned {
            let mut node = Node::from_span(span, td);
            node.annotations = annotations;
            let id = doc.push_node(node);
            doc.roots.push(id);
        }
        Ok(doc)
    }

    /// Top-level values in stream order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// The document's symbol table.
    pub fn symbols(&self) -> &LocalSymbolTable {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut LocalSymbolTable {
        &mut self.symbols
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id.index())
            .ok_or_else(|| Error::corrupt("node id out of range for this document"))
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    // ========================================================================
    // Shallow inspection (no payload reads)
    // ========================================================================

    /// The node's Ion type, answered from the recorded header byte alone.
    pub fn ion_type(&self, id: NodeId) -> Result<IonType> {
        match &self.node(id)?.backing {
            Backing::Unmaterialized { td, .. } => ion_type(td.type_id),
            Backing::Materialized { value, .. } => Ok(value.ion_type()),
        }
    }

    /// True for typed nulls; answered from the header nibble alone.
    pub fn is_null(&self, id: NodeId) -> Result<bool> {
        Ok(self.node(id)?.is_null_shallow())
    }

    /// True once the node (or one of its descendants) was mutated since it
    /// was last bound to encoded bytes.
    pub fn is_dirty(&self, id: NodeId) -> Result<bool> {
        Ok(self.node(id)?.is_dirty())
    }

    /// Annotation sids in encounter order.
    pub fn annotations(&self, id: NodeId) -> Result<&[SymbolId]> {
        Ok(&self.node(id)?.annotations)
    }

    /// Replaces the node's annotations. Forces materialization, because a
    /// span-backed node's extent still contains its old wrapper bytes.
    pub fn set_annotations(&mut self, id: NodeId, annotations: Vec<SymbolId>) -> Result<()> {
        self.materialize(id)?;
        self.nodes[id.index()].annotations = annotations;
        self.mark_dirty_upward(id);
        Ok(())
    }

    /// Field-name sid; `Some` exactly while the node is a struct member.
    pub fn field_name(&self, id: NodeId) -> Result<Option<SymbolId>> {
        Ok(self.node(id)?.field_name)
    }

    // ========================================================================
    // Materialization
    // ========================================================================

    /// Decodes a span-backed node into its native value. Idempotent; a
    /// materialized node is left alone. Containers are materialized shallowly:
    /// each child becomes a new span-backed node, child payloads stay unread.
    ///
    /// The header byte is re-read from the buffer and checked against the
    /// descriptor recorded at scan time; a mismatch means the buffer was
    /// moved underneath the node and is [`Error::CorruptState`].
    pub fn materialize(&mut self, id: NodeId) -> Result<()> {
        let (span, recorded_td) = match &self.node(id)?.backing {
            Backing::Materialized { .. } => return Ok(()),
            Backing::Unmaterialized { span, td } => (*span, *td),
        };

        let scanned = {
            let bytes = self.buffer.span_bytes(span)?;
            let mut cursor = StreamCursor::in_container(bytes, false);
            let ion = cursor
                .next()?
                .ok_or_else(|| Error::corrupt("recorded span holds no value"))?;
            let td = cursor.current_td()?;
            if td != recorded_td {
                return Err(Error::corrupt(format!(
                    "header byte {:#04x} disagrees with the recorded descriptor {:#04x}",
                    td.byte(),
                    recorded_td.byte()
                )));
            }
            let (start, end) = cursor.current_extent()?;
            if start != 0 || end as u64 != span.length {
                return Err(Error::corrupt(
                    "rescanned extent disagrees with the recorded span",
                ));
            }

            if td.is_null() {
                Scanned::Scalar(Value::Null(ion))
            } else if ion.is_container() {
                cursor.step_in()?;
                let mut children = Vec::new();
                while cursor.next()?.is_some() {
                    let child_td = cursor.current_td()?;
                    let (cs, ce) = cursor.current_extent()?;
                    let field_name = cursor.field_name()?;
                    let annotations = cursor.take_annotations();
                    children.push((
                        Span::new(span.offset + cs as u64, (ce - cs) as u64),
                        child_td,
                        annotations,
                        field_name,
                    ));
                }
                Scanned::Container(ion, children)
            } else {
                let payload = cursor.value_span()?;
                let payload_bytes =
                    &bytes[payload.offset as usize..payload.end() as usize];
                Scanned::Scalar(decode_scalar(td, payload_bytes)?)
            }
        };

        let value = match scanned {
            Scanned::Scalar(value) => value,
            Scanned::Container(ion, children) => {
                let mut ids = Vec::with_capacity(children.len());
                for (child_span, child_td, annotations, field_name) in children {
                    let mut node = Node::from_span(child_span, child_td);
                    node.annotations = annotations;
                    node.field_name = field_name;
                    node.parent = Some(id);
                    ids.push(self.push_node(node));
                }
                match ion {
                    IonType::List => Value::List(ids),
                    IonType::Sexp => Value::Sexp(ids),
                    IonType::Struct => Value::Struct(ids),
                    _ => unreachable!("is_container covers exactly three types"),
                }
            }
        };
        // Frisch aus dem Buffer gelesen, also nicht dirty
        self.nodes[id.index()].backing = Backing::Materialized {
            value,
            dirty: false,
        };
        Ok(())
    }

    /// Materializes and type-checks in one step; nulls and foreign types fail
    /// with [`Error::NullOrTypeMismatch`], leaving the node readable.
    fn materialized_value(&mut self, id: NodeId, expected: IonType) -> Result<&Value> {
        self.materialize(id)?;
        let Backing::Materialized { value, .. } = &self.nodes[id.index()].backing else {
            unreachable!("materialize leaves the node materialized");
        };
        if value.is_null() {
            return Err(Error::NullOrTypeMismatch {
                expected,
                found: None,
            });
        }
        if value.ion_type() != expected {
            return Err(Error::NullOrTypeMismatch {
                expected,
                found: Some(value.ion_type()),
            });
        }
        Ok(value)
    }

    // ========================================================================
    // Typed getters
    // ========================================================================

    pub fn bool_value(&mut self, id: NodeId) -> Result<bool> {
        match self.materialized_value(id, IonType::Bool)? {
            Value::Bool(v) => Ok(*v),
            _ => unreachable!(),
        }
    }

    pub fn int_value(&mut self, id: NodeId) -> Result<i64> {
        match self.materialized_value(id, IonType::Int)? {
            Value::Int(v) => Ok(*v),
            _ => unreachable!(),
        }
    }

    pub fn float_value(&mut self, id: NodeId) -> Result<f64> {
        match self.materialized_value(id, IonType::Float)? {
            Value::Float(v) => Ok(*v),
            _ => unreachable!(),
        }
    }

    pub fn decimal_value(&mut self, id: NodeId) -> Result<Decimal> {
        match self.materialized_value(id, IonType::Decimal)? {
            Value::Decimal(v) => Ok(*v),
            _ => unreachable!(),
        }
    }

    pub fn timestamp_value(&mut self, id: NodeId) -> Result<&Timestamp> {
        match self.materialized_value(id, IonType::Timestamp)? {
            Value::Timestamp(v) => Ok(v),
            _ => unreachable!(),
        }
    }

    pub fn symbol_value(&mut self, id: NodeId) -> Result<SymbolId> {
        match self.materialized_value(id, IonType::Symbol)? {
            Value::Symbol(v) => Ok(*v),
            _ => unreachable!(),
        }
    }

    pub fn string_value(&mut self, id: NodeId) -> Result<&str> {
        match self.materialized_value(id, IonType::String)? {
            Value::String(v) => Ok(v),
            _ => unreachable!(),
        }
    }

    /// Raw bytes of a clob or blob (both carry opaque payloads).
    pub fn bytes_value(&mut self, id: NodeId) -> Result<&[u8]> {
        self.materialize(id)?;
        let Backing::Materialized { value, .. } = &self.nodes[id.index()].backing else {
            unreachable!("materialize leaves the node materialized");
        };
        match value {
            Value::Clob(b) | Value::Blob(b) => Ok(b),
            other => Err(Error::NullOrTypeMismatch {
                expected: IonType::Blob,
                found: if other.is_null() {
                    None
                } else {
                    Some(other.ion_type())
                },
            }),
        }
    }

    // ========================================================================
    // Constructors and typed setters
    // ========================================================================

    fn push_value(&mut self, value: Value) -> NodeId {
        self.push_node(Node::from_value(value))
    }

    pub fn new_null(&mut self, t: IonType) -> NodeId {
        self.push_value(Value::Null(t))
    }

    pub fn new_bool(&mut self, v: bool) -> NodeId {
        self.push_value(Value::Bool(v))
    }

    pub fn new_int(&mut self, v: i64) -> NodeId {
        self.push_value(Value::Int(v))
    }

    pub fn new_float(&mut self, v: f64) -> NodeId {
        self.push_value(Value::Float(v))
    }

    pub fn new_decimal(&mut self, v: Decimal) -> NodeId {
        self.push_value(Value::Decimal(v))
    }

    pub fn new_timestamp(&mut self, v: Timestamp) -> NodeId {
        self.push_value(Value::Timestamp(v))
    }

    pub fn new_symbol(&mut self, sid: SymbolId) -> NodeId {
        self.push_value(Value::Symbol(sid))
    }

    /// Interns `text` in the document's symbol table and creates a symbol
    /// value holding the resulting sid.
    pub fn new_symbol_text(&mut self, text: &str) -> NodeId {
        let sid = self.symbols.intern(text);
        self.new_symbol(sid)
    }

    pub fn new_string(&mut self, v: impl Into<String>) -> NodeId {
        self.push_value(Value::String(v.into()))
    }

    pub fn new_clob(&mut self, v: Vec<u8>) -> NodeId {
        self.push_value(Value::Clob(v))
    }

    pub fn new_blob(&mut self, v: Vec<u8>) -> NodeId {
        self.push_value(Value::Blob(v))
    }

    pub fn new_list(&mut self) -> NodeId {
        self.push_value(Value::List(Vec::new()))
    }

    pub fn new_sexp(&mut self) -> NodeId {
        self.push_value(Value::Sexp(Vec::new()))
    }

    pub fn new_struct(&mut self) -> NodeId {
        self.push_value(Value::Struct(Vec::new()))
    }

    /// Replaces a node's value in place, detaching any children the old value
    /// owned. Marks the node and all its ancestors dirty.
    fn replace_value(&mut self, id: NodeId, value: Value) -> Result<()> {
        self.node(id)?;
        self.detach_children(id);
        self.nodes[id.index()].backing = Backing::Materialized { value, dirty: true };
        self.mark_dirty_upward(id);
        Ok(())
    }

    /// Clears the parent links of the node's children, if it currently is a
    /// materialized container. Detached children stay in the arena and can be
    /// re-attached elsewhere.
    fn detach_children(&mut self, id: NodeId) {
        let children = match &self.nodes[id.index()].backing {
            Backing::Materialized { value, .. } => match value.children() {
                Some(ids) => ids.to_vec(),
                None => return,
            },
            Backing::Unmaterialized { .. } => return,
        };
        for child in children {
            let node = &mut self.nodes[child.index()];
            node.parent = None;
            node.field_name = None;
        }
    }

    fn mark_dirty_upward(&mut self, id: NodeId) {
        let mut walk = Some(id);
        while let Some(nid) = walk {
            let node = &mut self.nodes[nid.index()];
            if let Backing::Materialized { dirty, .. } = &mut node.backing {
                *dirty = true;
            }
            walk = node.parent;
        }
    }

    pub fn set_null(&mut self, id: NodeId, t: IonType) -> Result<()> {
        self.replace_value(id, Value::Null(t))
    }

    pub fn set_bool(&mut self, id: NodeId, v: bool) -> Result<()> {
        self.replace_value(id, Value::Bool(v))
    }

    pub fn set_int(&mut self, id: NodeId, v: i64) -> Result<()> {
        self.replace_value(id, Value::Int(v))
    }

    pub fn set_float(&mut self, id: NodeId, v: f64) -> Result<()> {
        self.replace_value(id, Value::Float(v))
    }

    pub fn set_decimal(&mut self, id: NodeId, v: Decimal) -> Result<()> {
        self.replace_value(id, Value::Decimal(v))
    }

    pub fn set_timestamp(&mut self, id: NodeId, v: Timestamp) -> Result<()> {
        self.replace_value(id, Value::Timestamp(v))
    }

    pub fn set_symbol(&mut self, id: NodeId, sid: SymbolId) -> Result<()> {
        self.replace_value(id, Value::Symbol(sid))
    }

    pub fn set_string(&mut self, id: NodeId, v: impl Into<String>) -> Result<()> {
        self.replace_value(id, Value::String(v.into()))
    }

    pub fn set_clob(&mut self, id: NodeId, v: Vec<u8>) -> Result<()> {
        self.replace_value(id, Value::Clob(v))
    }

    pub fn set_blob(&mut self, id: NodeId, v: Vec<u8>) -> Result<()> {
        self.replace_value(id, Value::Blob(v))
    }

    // ========================================================================
    // Container engine
    // ========================================================================

    /// Direct children of a container, in held order. Materializes the
    /// container shallowly; child payloads stay unread.
    pub fn children(&mut self, id: NodeId) -> Result<&[NodeId]> {
        self.materialize(id)?;
        let Backing::Materialized { value, .. } = &self.nodes[id.index()].backing else {
            unreachable!("materialize leaves the node materialized");
        };
        value.children().ok_or_else(|| Error::NullOrTypeMismatch {
            // Repräsentativ für "irgendein Container"
            expected: IonType::List,
            found: if value.is_null() {
                None
            } else {
                Some(value.ion_type())
            },
        })
    }

    /// Struct members carrying field name `name`, duplicates included, in
    /// encounter order.
    pub fn fields_named(
        &mut self,
        id: NodeId,
        name: SymbolId,
    ) -> Result<impl Iterator<Item = NodeId> + '_> {
        self.materialize(id)?;
        let this: &Self = self;
        let ids = match &this.nodes[id.index()].backing {
            Backing::Materialized {
                value: Value::Struct(ids),
                ..
            } => ids.as_slice(),
            Backing::Materialized { value, .. } => {
                return Err(Error::NullOrTypeMismatch {
                    expected: IonType::Struct,
                    found: if value.is_null() {
                        None
                    } else {
                        Some(value.ion_type())
                    },
                })
            }
            Backing::Unmaterialized { .. } => {
                unreachable!("materialize leaves the node materialized")
            }
        };
        Ok(ids
            .iter()
            .copied()
            .filter(move |&c| this.nodes[c.index()].field_name == Some(name)))
    }

    /// Appends a detached node as a new top-level value.
    pub fn append_root(&mut self, id: NodeId) -> Result<()> {
        self.node(id)?;
        if self.nodes[id.index()].parent.is_some() || self.roots.contains(&id) {
            return Err(Error::ContainedValue);
        }
        self.roots.push(id);
        Ok(())
    }

    /// Appends `child` to a list or sexp. The child must be detached; a node
    /// never belongs to two places at once.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.attach(parent, child, None)
    }

    /// Appends `child` to a struct under field name `name`.
    pub fn append_field(&mut self, parent: NodeId, name: SymbolId, child: NodeId) -> Result<()> {
        self.attach(parent, child, Some(name))
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, field_name: Option<SymbolId>) -> Result<()> {
        self.node(child)?;
        self.materialize(parent)?;

        let expected = if field_name.is_some() {
            IonType::Struct
        } else {
            IonType::List
        };
        let parent_type = self.ion_type(parent)?;
        if self.nodes[parent.index()].is_null_shallow() {
            return Err(Error::NullOrTypeMismatch {
                expected,
                found: None,
            });
        }
        let shape_matches = match parent_type {
            IonType::Struct => field_name.is_some(),
            IonType::List | IonType::Sexp => field_name.is_none(),
            _ => false,
        };
        if !shape_matches {
            return Err(Error::NullOrTypeMismatch {
                expected,
                found: Some(parent_type),
            });
        }

        // Exklusivität: das Kind darf nirgendwo hängen
        if self.nodes[child.index()].parent.is_some() || self.roots.contains(&child) {
            return Err(Error::ContainedValue);
        }
        // Zyklenwächter: ein Vorfahr von parent darf nicht Kind werden
        let mut walk = Some(parent);
        while let Some(ancestor) = walk {
            if ancestor == child {
                return Err(Error::ContainedValue);
            }
            walk = self.nodes[ancestor.index()].parent;
        }

        if let Backing::Materialized { value, .. } = &mut self.nodes[parent.index()].backing {
            if let Some(ids) = value.children_mut() {
                ids.push(child);
            }
        }
        let node = &mut self.nodes[child.index()];
        node.parent = Some(parent);
        node.field_name = field_name;
        self.mark_dirty_upward(parent);
        Ok(())
    }

    /// Removes `child` from `parent`'s member list. Returns whether the child
    /// was present. Non-recursive: the child keeps its own subtree and can be
    /// re-attached.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<bool> {
        self.node(child)?;
        self.materialize(parent)?;
        let removed = {
            let Backing::Materialized { value, .. } = &mut self.nodes[parent.index()].backing
            else {
                unreachable!("materialize leaves the node materialized");
            };
            let found = if value.is_null() {
                None
            } else {
                Some(value.ion_type())
            };
            let Some(ids) = value.children_mut() else {
                return Err(Error::NullOrTypeMismatch {
                    expected: IonType::List,
                    found,
                });
            };
            match ids.iter().position(|&c| c == child) {
                Some(i) => {
                    ids.remove(i);
                    true
                }
                None => false,
            }
        };
        if removed {
            let node = &mut self.nodes[child.index()];
            node.parent = None;
            node.field_name = None;
            self.mark_dirty_upward(parent);
        }
        Ok(removed)
    }

    // ========================================================================
    // Encoding
    // ========================================================================

    /// Encoded size of the node's full extent (annotation wrapper included,
    /// field-name sid excluded). Stable between mutations: a span-backed node
    /// reports its span length, everything else the canonical re-encode size.
    pub fn encoded_length(&self, id: NodeId) -> Result<u64> {
        let node = self.node(id)?;
        match &node.backing {
            Backing::Unmaterialized { span, .. } => Ok(span.length),
            Backing::Materialized { value, .. } => {
                let body = self.body_len(value)?;
                if node.annotations.is_empty() {
                    return Ok(body);
                }
                let wrapped = Self::wrapped_len(&node.annotations, body);
                Ok(1 + Self::opt_var_len(wrapped) + wrapped)
            }
        }
    }

    /// Length of the annotation wrapper payload: annot-length VarUInt, the
    /// sids, and the wrapped value.
    fn wrapped_len(annotations: &[SymbolId], body: u64) -> u64 {
        let sids: u64 = annotations.iter().map(|&s| var_uint::encoded_len(s)).sum();
        var_uint::encoded_len(sids) + sids + body
    }

    #[inline]
    fn opt_var_len(payload_len: u64) -> u64 {
        if payload_len > MAX_DIRECT_LENGTH {
            var_uint::encoded_len(payload_len)
        } else {
            0
        }
    }

    /// Header + length + payload size of the bare (unwrapped) value.
    fn body_len(&self, value: &Value) -> Result<u64> {
        match value.children() {
            Some(_) => {
                let payload = self.container_payload_len(value)?;
                Ok(1 + Self::opt_var_len(payload) + payload)
            }
            None => {
                let payload = scalar_payload_len(value);
                let len_len = if value.is_null() {
                    0
                } else {
                    Self::opt_var_len(payload)
                };
                Ok(1 + len_len + payload)
            }
        }
    }

    fn container_payload_len(&self, value: &Value) -> Result<u64> {
        let is_struct = matches!(value, Value::Struct(_));
        let mut payload = 0u64;
        for &child in value.children().into_iter().flatten() {
            if is_struct {
                let sid = self.node(child)?.field_name.ok_or_else(|| {
                    Error::corrupt("struct member without a field name")
                })?;
                payload += var_uint::encoded_len(sid);
            }
            payload += self.encoded_length(child)?;
        }
        Ok(payload)
    }

    /// Writes one node's full extent to `out`.
    ///
    /// Never-materialized nodes are copied verbatim from the source buffer
    /// (their encoding is byte-stable). Materialized nodes are re-encoded
    /// canonically; a disagreement between the precomputed and the actually
    /// written payload size aborts with [`Error::CorruptState`].
    pub fn write_value(&self, id: NodeId, out: &mut SpanBuffer) -> Result<()> {
        let node = self.node(id)?;
        match &node.backing {
            Backing::Unmaterialized { span, .. } => {
                // Fast-Path: ungelesene Spans wandern byteweise durch
                out.write_all(self.buffer.span_bytes(*span)?);
                Ok(())
            }
            Backing::Materialized { value, .. } => {
                if node.annotations.is_empty() {
                    return self.write_body(out, value);
                }
                let body = self.body_len(value)?;
                let wrapped = Self::wrapped_len(&node.annotations, body);
                out.push(TypeDescriptor::new(TID_ANNOTATION, length_low_nibble(wrapped)).byte());
                if wrapped > MAX_DIRECT_LENGTH {
                    var_uint::write(out, wrapped);
                }
                let sids: u64 = node
                    .annotations
                    .iter()
                    .map(|&s| var_uint::encoded_len(s))
                    .sum();
                var_uint::write(out, sids);
                for &sid in &node.annotations {
                    var_uint::write(out, sid);
                }
                self.write_body(out, value)
            }
        }
    }

    fn write_body(&self, out: &mut SpanBuffer, value: &Value) -> Result<()> {
        match value.children() {
            Some(ids) => {
                let is_struct = matches!(value, Value::Struct(_));
                let payload = self.container_payload_len(value)?;
                out.push((value.type_id() << 4) | length_low_nibble(payload));
                if payload > MAX_DIRECT_LENGTH {
                    var_uint::write(out, payload);
                }
                let start = out.len();
                for &child in ids {
                    if is_struct {
                        let sid = self.node(child)?.field_name.ok_or_else(|| {
                            Error::corrupt("struct member without a field name")
                        })?;
                        var_uint::write(out, sid);
                    }
                    self.write_value(child, out)?;
                }
                if out.len() - start != payload {
                    return Err(Error::corrupt(
                        "container payload size disagrees with its precomputed length",
                    ));
                }
                Ok(())
            }
            None => {
                let payload = scalar_payload_len(value);
                out.push((value.type_id() << 4) | scalar_low_nibble(value));
                if !value.is_null() && payload > MAX_DIRECT_LENGTH {
                    var_uint::write(out, payload);
                }
                let written = write_scalar_payload(out, value)?;
                if written != payload {
                    return Err(Error::corrupt(
                        "scalar payload size disagrees with its precomputed length",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Encodes the whole document: version marker, then every root in order.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut out =
            SpanBuffer::with_capacity(self.buffer.len() as usize + BINARY_VERSION_MARKER.len());
        out.write_all(&BINARY_VERSION_MARKER);
        for &root in &self.roots {
            self.write_value(root, &mut out)?;
        }
        Ok(out.into_vec())
    }
}
