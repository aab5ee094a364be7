#![no_main]

use libfuzzer_sys::fuzz_target;
use tankpump::relay::codec::{LineDecoder, decode_command};

fuzz_target!(|data: &[u8]| {
    // Whole input as one frame.
    let _ = decode_command(data);

    // Byte-at-a-time through the line splitter.
    let mut lines = LineDecoder::new();
    for &b in data {
        if let Some(line) = lines.push(b) {
            assert!(!line.contains(&b'\n'));
            let _ = decode_command(line);
        }
    }
});
