//! Streaming scenarios: truncated data, length-based skipping, annotation
//! and field-name resolution against a symbol table.

use rion::{Error, IonType, LocalSymbolTable, StreamCursor, SymbolTable};

// Liste deklariert 8 Payload-Bytes, der Strom bricht mitten im String ab.
// Das Betreten der Liste und das erste Kind funktionieren; erst der Wert,
// dessen Payload fehlt, meldet EOF.
#[test]
fn truncated_container_fails_only_at_the_missing_payload() {
    let data = [0xB8, 0x21, 0x01, 0x85, 0x61, 0x62];
    let mut cursor = StreamCursor::new(&data);
    assert_eq!(cursor.next().unwrap(), Some(IonType::List));
    cursor.step_in().unwrap();
    assert_eq!(cursor.next().unwrap(), Some(IonType::Int));
    let err = cursor.next().unwrap_err();
    assert!(matches!(err, Error::UnexpectedEof { .. }), "{err}");
}

// Liste deklariert 5 Payload-Bytes, der Strom endet nach einem. Das
// Überspringen braucht die deklarierte Ausdehnung wirklich; fehlt sie im
// Strom, darf next() nicht still None melden und das Bool verschlucken.
#[test]
fn skipping_a_truncated_top_level_container_is_eof() {
    let data = [0xB5, 0x11];
    let mut cursor = StreamCursor::new(&data);
    assert_eq!(cursor.next().unwrap(), Some(IonType::List));
    let err = cursor.next().unwrap_err();
    assert!(matches!(err, Error::UnexpectedEof { .. }), "{err}");
}

// Feld a enthält 3 Bytes Müll (reservierte Typ-Ids). Wer a nicht betritt,
// überspringt es rein über die Längenangabe und landet fehlerfrei auf d.
#[test]
fn skipping_a_container_never_reads_its_payload() {
    let data = [
        0xD8, // struct, 8 Payload-Bytes
        0x8A, 0xB3, 0xFF, 0xFF, 0xFF, // $10: Liste mit Müll-Payload
        0x8B, 0x21, 0x05, // $11: 5
    ];
    let mut cursor = StreamCursor::new(&data);
    assert_eq!(cursor.next().unwrap(), Some(IonType::Struct));
    cursor.step_in().unwrap();
    assert_eq!(cursor.next().unwrap(), Some(IonType::List));
    assert_eq!(cursor.field_name().unwrap(), Some(10));
    // next() überspringt die Listen-Payload, ohne sie zu decodieren
    assert_eq!(cursor.next().unwrap(), Some(IonType::Int));
    assert_eq!(cursor.field_name().unwrap(), Some(11));
    assert_eq!(cursor.next().unwrap(), None);
}

// step_out() von tief innen: alle ungelesenen Geschwister und deren
// Payloads werden über Längen übersprungen.
#[test]
fn step_out_skips_unread_siblings() {
    // [[1, 2, 3], true]
    let data = [0xB8, 0xB6, 0x21, 0x01, 0x21, 0x02, 0x21, 0x03, 0x11];
    let mut cursor = StreamCursor::new(&data);
    cursor.next().unwrap();
    cursor.step_in().unwrap();
    assert_eq!(cursor.next().unwrap(), Some(IonType::List));
    cursor.step_in().unwrap();
    assert_eq!(cursor.next().unwrap(), Some(IonType::Int));
    // 2 und 3 nie gelesen
    cursor.step_out().unwrap();
    assert_eq!(cursor.next().unwrap(), Some(IonType::Bool));
    assert_eq!(cursor.next().unwrap(), None);
    cursor.step_out().unwrap();
    assert_eq!(cursor.next().unwrap(), None);
}

// {$10: {$11: 1, $12: 2}, $13: false}: nach step_in in das innere Struct
// und dem Lesen von $11 positioniert step_out den Cursor vor $13, nicht $12.
#[test]
fn step_out_lands_on_the_next_outer_field() {
    let data = [
        0xDA, 0x8A, 0xD6, 0x8B, 0x21, 0x01, 0x8C, 0x21, 0x02, 0x8D, 0x10,
    ];
    let mut cursor = StreamCursor::new(&data);
    cursor.next().unwrap();
    cursor.step_in().unwrap();
    assert_eq!(cursor.next().unwrap(), Some(IonType::Struct));
    assert_eq!(cursor.field_name().unwrap(), Some(10));
    cursor.step_in().unwrap();
    assert_eq!(cursor.next().unwrap(), Some(IonType::Int));
    assert_eq!(cursor.field_name().unwrap(), Some(11));
    // $12 bleibt ungelesen
    cursor.step_out().unwrap();
    assert_eq!(cursor.next().unwrap(), Some(IonType::Bool));
    assert_eq!(cursor.field_name().unwrap(), Some(13));
    assert_eq!(cursor.next().unwrap(), None);
}

#[test]
fn annotations_resolve_through_the_symbol_table() {
    let mut table = LocalSymbolTable::new();
    let ann = table.intern("ann");
    let ben = table.intern("ben");
    assert_eq!((ann, ben), (10, 11));

    // ann::ben::null
    let data = [0xE4, 0x82, 0x8A, 0x8B, 0x0F];
    let mut cursor = StreamCursor::new(&data);
    assert_eq!(cursor.next().unwrap(), Some(IonType::Null));
    assert_eq!(cursor.annotations().unwrap(), &[10, 11]);
    assert_eq!(cursor.annotation_text(&table).unwrap(), ["ann", "ben"]);
}

#[test]
fn unknown_annotation_sid_is_unresolved_but_retrievable() {
    let table = LocalSymbolTable::new();
    let data = [0xE3, 0x81, 0x99, 0x0F]; // Sid 25 ohne Bindung
    let mut cursor = StreamCursor::new(&data);
    cursor.next().unwrap();
    assert_eq!(cursor.annotations().unwrap(), &[25]);
    assert_eq!(
        cursor.annotation_text(&table).unwrap_err(),
        Error::UnresolvedSymbol(25)
    );
}

#[test]
fn field_names_resolve_through_the_symbol_table() {
    let mut table = LocalSymbolTable::new();
    let score = table.intern("score");

    let data = [0xD3, 0x8A, 0x21, 0x07];
    let mut cursor = StreamCursor::new(&data);
    cursor.next().unwrap();
    assert_eq!(cursor.field_name_text(&table).unwrap(), None);
    cursor.step_in().unwrap();
    cursor.next().unwrap();
    assert_eq!(cursor.field_name().unwrap(), Some(score));
    assert_eq!(cursor.field_name_text(&table).unwrap(), Some("score"));
}

#[test]
fn nop_padding_in_a_struct_requires_sid_zero() {
    // Gültig: Sid 0 vor dem Pad
    let data = [0xD5, 0x80, 0x01, 0xAA, 0x8A, 0x11];
    let mut cursor = StreamCursor::new(&data);
    cursor.next().unwrap();
    cursor.step_in().unwrap();
    assert_eq!(cursor.next().unwrap(), Some(IonType::Bool));
    assert_eq!(cursor.field_name().unwrap(), Some(10));

    // Ungültig: Pad unter echtem Feldnamen
    let data = [0xD2, 0x8A, 0x00];
    let mut cursor = StreamCursor::new(&data);
    cursor.next().unwrap();
    cursor.step_in().unwrap();
    assert!(matches!(cursor.next(), Err(Error::MalformedData(_))));
}

#[test]
fn non_minimal_var_uint_length_is_malformed() {
    // String, var-len Marker, VarUInt mit führendem 0x00-Oktett
    let data = [0x8E, 0x00, 0x81, 0x61];
    let mut cursor = StreamCursor::new(&data);
    assert!(matches!(cursor.next(), Err(Error::MalformedData(_))));
}

#[test]
fn reserved_type_id_is_malformed() {
    let mut cursor = StreamCursor::new(&[0xF0]);
    assert!(matches!(cursor.next(), Err(Error::MalformedData(_))));
}

// Tiefe 0 und Containerende melden beide None; der Aufrufer unterscheidet
// über depth().
#[test]
fn none_is_normal_at_both_levels() {
    let data = [0xB0, 0x11];
    let mut cursor = StreamCursor::new(&data);
    assert_eq!(cursor.next().unwrap(), Some(IonType::List));
    cursor.step_in().unwrap();
    assert_eq!(cursor.depth(), 1);
    assert_eq!(cursor.next().unwrap(), None);
    cursor.step_out().unwrap();
    assert_eq!(cursor.next().unwrap(), Some(IonType::Bool));
    assert_eq!(cursor.next().unwrap(), None);
    assert_eq!(cursor.depth(), 0);
    // Wiederholtes next() am Ende bleibt None
    assert_eq!(cursor.next().unwrap(), None);
}

#[test]
fn annotated_value_inside_a_struct_keeps_its_field_name() {
    // {$10: ann::true} — Wrapper E3 81 8B, innen 0x11
    let data = [0xD5, 0x8A, 0xE3, 0x81, 0x8B, 0x11];
    let mut cursor = StreamCursor::new(&data);
    cursor.next().unwrap();
    cursor.step_in().unwrap();
    assert_eq!(cursor.next().unwrap(), Some(IonType::Bool));
    assert_eq!(cursor.field_name().unwrap(), Some(10));
    assert_eq!(cursor.annotations().unwrap(), &[11]);
}
