//! Document-level scenarios: lazy materialization, containment rules,
//! dirty tracking and the verbatim re-encode fast path.

use rion::{Document, Error, IonType, SymbolTable, BINARY_VERSION_MARKER};

fn stream(body: &[u8]) -> Vec<u8> {
    let mut data = BINARY_VERSION_MARKER.to_vec();
    data.extend_from_slice(body);
    data
}

// Ein nie angefasstes Dokument serialisiert byte-identisch, auch wenn
// einzelne Container zum Lesen geöffnet wurden.
#[test]
fn untouched_subtrees_are_copied_verbatim() {
    let data = stream(&[
        0xD7, 0x8A, 0x21, 0x07, 0x8B, 0x82, 0x68, 0x69, // {$10:7, $11:"hi"}
        0xE4, 0x82, 0x8A, 0x8B, 0x0F, // ann::ben::null
        0xB3, 0x21, 0x01, 0x20, // [1, 0]
    ]);
    let mut doc = Document::parse(&data).unwrap();
    assert_eq!(doc.serialize().unwrap(), data);

    let strukt = doc.roots()[0];
    let child = doc.children(strukt).unwrap()[0];
    assert_eq!(doc.int_value(child).unwrap(), 7);
    // Lesen macht nichts dirty
    assert!(!doc.is_dirty(strukt).unwrap());
    assert_eq!(doc.serialize().unwrap(), data);
}

// Ein Top-Level-Container, dessen deklarierte Ausdehnung den Puffer
// überragt, darf nie als Wurzel mit unlesbarem Span im Dokument landen.
#[test]
fn parse_rejects_a_truncated_top_level_container() {
    let data = stream(&[0xB5, 0x11]);
    let err = Document::parse(&data).unwrap_err();
    assert!(matches!(err, Error::UnexpectedEof { .. }), "{err}");
}

#[test]
fn mutating_one_leaf_leaves_sibling_bytes_untouched() {
    let data = stream(&[
        0xB7, 0x21, 0x07, 0x84, 0x74, 0x65, 0x78, 0x74, // [7, "text"]
    ]);
    let mut doc = Document::parse(&data).unwrap();
    let list = doc.roots()[0];
    let children: Vec<_> = doc.children(list).unwrap().to_vec();
    doc.set_int(children[0], 300).unwrap();

    let bytes = doc.serialize().unwrap();
    // Das String-Geschwister ist ein unveränderter Byte-Block
    let expected = stream(&[0xB8, 0x22, 0x01, 0x2C, 0x84, 0x74, 0x65, 0x78, 0x74]);
    assert_eq!(bytes, expected);
}

#[test]
fn duplicate_struct_fields_survive_reencode_in_held_order() {
    // {$10: 1, $10: 2} — Duplikate sind legal und bleiben geordnet
    let data = stream(&[0xD6, 0x8A, 0x21, 0x01, 0x8A, 0x21, 0x02]);
    let mut doc = Document::parse(&data).unwrap();
    let root = doc.roots()[0];
    doc.children(root).unwrap();
    assert_eq!(doc.serialize().unwrap(), data);

    let hits: Vec<_> = doc.fields_named(root, 10).unwrap().collect();
    assert_eq!(hits.len(), 2);
}

#[test]
fn removed_child_can_be_reattached_elsewhere() {
    let data = stream(&[0xD3, 0x8A, 0x21, 0x07]);
    let mut doc = Document::parse(&data).unwrap();
    let root = doc.roots()[0];
    let child = doc.children(root).unwrap()[0];

    assert!(doc.remove_child(root, child).unwrap());
    assert_eq!(doc.field_name(child).unwrap(), None);
    // Zweites Entfernen: nicht mehr vorhanden
    assert!(!doc.remove_child(root, child).unwrap());

    let list = doc.new_list();
    doc.append_child(list, child).unwrap();
    doc.append_root(list).unwrap();

    let bytes = doc.serialize().unwrap();
    assert_eq!(bytes, stream(&[0xD0, 0xB2, 0x21, 0x07]));
}

#[test]
fn deep_nesting_round_trips() {
    let mut doc = Document::new();
    let mut outer = doc.new_list();
    doc.append_root(outer).unwrap();
    for depth in 0..40 {
        let inner = doc.new_list();
        doc.append_child(outer, inner).unwrap();
        let v = doc.new_int(depth);
        doc.append_child(outer, v).unwrap();
        outer = inner;
    }
    let bytes = doc.serialize().unwrap();

    let mut doc = Document::parse(&bytes).unwrap();
    let mut node = doc.roots()[0];
    for depth in 0..40 {
        let children: Vec<_> = doc.children(node).unwrap().to_vec();
        assert_eq!(children.len(), 2);
        assert_eq!(doc.int_value(children[1]).unwrap(), depth);
        node = children[0];
    }
    assert!(doc.children(node).unwrap().is_empty());
}

#[test]
fn symbol_table_assigns_sids_behind_the_system_range() {
    let mut doc = Document::new();
    let root = doc.new_struct();
    let first = doc.symbols_mut().intern("first");
    assert_eq!(first, 10);
    let v = doc.new_symbol_text("first"); // idempotent
    doc.append_field(root, first, v).unwrap();
    doc.append_root(root).unwrap();

    let mut reparsed = {
        let bytes = doc.serialize().unwrap();
        Document::parse(&bytes).unwrap()
    };
    let root = reparsed.roots()[0];
    let member = reparsed.children(root).unwrap()[0];
    let sid = reparsed.symbol_value(member).unwrap();
    assert_eq!(sid, first);
    // Die Tabelle reist nicht im Strom mit; der Leser bindet sie selbst
    assert_eq!(reparsed.symbols().resolve(sid), None);
    let rebound = reparsed.symbols_mut().intern("first");
    assert_eq!(rebound, sid);
}

#[test]
fn getters_keep_the_node_usable_after_a_mismatch() {
    let data = stream(&[0xB2, 0x21, 0x07]);
    let mut doc = Document::parse(&data).unwrap();
    let list = doc.roots()[0];
    assert!(matches!(
        doc.string_value(list),
        Err(Error::NullOrTypeMismatch {
            expected: IonType::String,
            found: Some(IonType::List),
        })
    ));
    let child = doc.children(list).unwrap()[0];
    assert_eq!(doc.int_value(child).unwrap(), 7);
}

#[test]
fn encoded_length_is_stable_between_mutations() {
    let data = stream(&[0xB3, 0x21, 0x01, 0x20]);
    let doc = Document::parse(&data).unwrap();
    let list = doc.roots()[0];
    let before = doc.encoded_length(list).unwrap();
    assert_eq!(before, 4);

    let mut doc = doc;
    let child = doc.children(list).unwrap()[0];
    doc.set_int(child, 1 << 20).unwrap();
    let after = doc.encoded_length(list).unwrap();
    // 3-Byte-Magnitude statt 1 Byte
    assert_eq!(after, 6);
    let bytes = doc.serialize().unwrap();
    assert_eq!(bytes.len() as u64, 4 + after);
}

#[test]
fn annotations_on_containers_reencode_correctly() {
    let mut doc = Document::new();
    let list = doc.new_list();
    let v = doc.new_int(1);
    doc.append_child(list, v).unwrap();
    doc.set_annotations(list, vec![10]).unwrap();
    doc.append_root(list).unwrap();

    let bytes = doc.serialize().unwrap();
    assert_eq!(bytes, stream(&[0xE5, 0x81, 0x8A, 0xB2, 0x21, 0x01]));

    let mut doc = Document::parse(&bytes).unwrap();
    let root = doc.roots()[0];
    assert_eq!(doc.annotations(root).unwrap(), &[10]);
    let child = doc.children(root).unwrap()[0];
    assert_eq!(doc.int_value(child).unwrap(), 1);
}

#[test]
fn large_container_uses_the_var_len_header() {
    let mut doc = Document::new();
    let list = doc.new_list();
    for i in 0..100 {
        let v = doc.new_int(i);
        doc.append_child(list, v).unwrap();
    }
    doc.append_root(list).unwrap();
    let bytes = doc.serialize().unwrap();
    assert_eq!(bytes[4], 0xBE); // var-len Marker

    let mut doc = Document::parse(&bytes).unwrap();
    let root = doc.roots()[0];
    let children: Vec<_> = doc.children(root).unwrap().to_vec();
    assert_eq!(children.len(), 100);
    assert_eq!(doc.int_value(children[99]).unwrap(), 99);
}
