#![no_main]
use libfuzzer_sys::fuzz_target;

// Parse + vollständige Materialisierung + Re-Encode + Re-Parse. Was der
// Parser akzeptiert, muss der Encoder wieder einlesen können.
fuzz_target!(|data: &[u8]| {
    let mut stream = vec![0xE0, 0x01, 0x00, 0xEA];
    stream.extend_from_slice(data);

    let Ok(mut doc) = rion::Document::parse(&stream) else {
        return;
    };
    let mut queue: Vec<rion::NodeId> = doc.roots().to_vec();
    while let Some(id) = queue.pop() {
        if queue.len() > 10_000 {
            return;
        }
        match doc.ion_type(id) {
            Ok(t) if t.is_container() && !doc.is_null(id).unwrap_or(true) => {
                match doc.children(id) {
                    Ok(children) => queue.extend_from_slice(children),
                    Err(_) => return,
                }
            }
            Ok(_) => {
                if doc.materialize(id).is_err() {
                    return;
                }
            }
            Err(_) => return,
        }
    }
    let Ok(bytes) = doc.serialize() else { return };
    let _ = rion::Document::parse(&bytes);
});
