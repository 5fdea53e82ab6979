#![no_main]

use benchguard::baseline::parse_records;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary text must decode to records or a load error, never a panic
    if let Ok(input) = std::str::from_utf8(data) {
        let _ = parse_records("fuzz", input);
    }
});
