#![no_main]
use libfuzzer_sys::fuzz_target;

// Depth-first-Walk über beliebige Bytes: darf Fehler melden, nie panicken.
fuzz_target!(|data: &[u8]| {
    let mut cursor = rion::StreamCursor::new(data);
    let mut steps = 0usize;
    loop {
        steps += 1;
        if steps > 100_000 {
            break;
        }
        match cursor.next() {
            Ok(Some(t)) if t.is_container() && !cursor.is_null().unwrap_or(true) => {
                if cursor.step_in().is_err() {
                    break;
                }
            }
            Ok(Some(_)) => {
                let _ = cursor.annotations();
                let _ = cursor.field_name();
                let _ = cursor.value_span();
            }
            Ok(None) => {
                if cursor.depth() == 0 || cursor.step_out().is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    }
});
