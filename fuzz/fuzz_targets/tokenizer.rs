#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    crsh::fuzz_tokenize_bytes(data);
});
