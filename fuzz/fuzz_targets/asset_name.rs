//! Fuzz target for AssetName::new with arbitrary string input.
//!
//! An accepted name must stay a single path segment, so joining it onto a
//! workspace directory can never escape that directory.
//!
//! Run with: cargo +nightly fuzz run asset_name

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::path::{Component, Path};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(name) = docpack::AssetName::new(s) else {
        return;
    };
    let name = name.as_str();

    assert!(!name.contains('/'), "separator accepted: {:?}", name);
    assert!(!name.contains('\\'), "separator accepted: {:?}", name);
    assert!(!name.contains('\0'), "NUL accepted: {:?}", name);
    assert!(name != "." && name != "..", "dot segment accepted: {:?}", name);

    let mut components = Path::new(name).components();
    assert!(
        matches!(components.next(), Some(Component::Normal(_))),
        "not a normal segment: {:?}",
        name
    );
    assert!(components.next().is_none(), "multiple segments: {:?}", name);
});
