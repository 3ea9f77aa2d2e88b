#![no_main]

// Probing any prefix of any input must not panic, and a complete probe
// must agree with the full parse when both succeed.

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(result) = zenloop::probe(data) else {
        return;
    };
    assert!(result.bytes_examined <= data.len());
    if let Ok(info) = zenloop::from_bytes(data) {
        assert_eq!(result.width, Some(info.width));
        assert_eq!(result.height, Some(info.height));
    }
});
