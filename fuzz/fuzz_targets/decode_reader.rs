//! Fuzz target for document decoding with arbitrary byte input.
//!
//! Exercises the container parser, the manifest parser and the asset
//! name checks with adversarial input. Any panic or hang is a bug.
//!
//! Run with: cargo +nightly fuzz run decode_reader

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    let _ = docpack::bundle::decode_reader(Cursor::new(data));

    let limits = docpack::ResourceLimits::new().max_entry_size(1 << 20);
    if let Ok(mut container) = docpack::Container::open_with_limits(Cursor::new(data), limits) {
        for index in 0..container.len() {
            let _ = container.read_entry_at(index);
        }
        let _ = container.verify();
    }
});
