#![no_main]
use libfuzzer_sys::fuzz_target;

use rion::{var_uint, ByteReader, SpanBuffer};

// Decode-Encode-Fixpunkt: jeder akzeptierte VarUInt muss minimal sein und
// byte-identisch re-encodieren.
fuzz_target!(|data: &[u8]| {
    let mut reader = ByteReader::new(data);
    if let Ok(value) = var_uint::read(&mut reader) {
        let consumed = reader.position() as usize;
        assert_eq!(var_uint::encoded_len(value), consumed as u64);

        let mut buf = SpanBuffer::new();
        var_uint::write(&mut buf, value);
        assert_eq!(buf.as_bytes(), &data[..consumed]);
    }
});
