//! Shared test utilities for integration tests.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use docpack::{ContainerWriter, ContentItem, WriteOptions, WriteResult, bundle};

/// A minimal PNG signature followed by filler bytes.
pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDRfake-png-body";

/// A minimal JPEG prefix followed by filler bytes.
pub const JPEG: &[u8] = b"\xFF\xD8\xFF\xE0fake-jpeg-body";

/// Creates an in-memory container from raw `(name, data)` entries.
///
/// Use this to build archives the codec would never produce, such as ones
/// without a manifest or with entries outside `assets/`.
pub fn create_container_with_result(
    options: Option<WriteOptions>,
    entries: &[(&str, &[u8])],
) -> docpack::Result<(Vec<u8>, WriteResult)> {
    let mut writer = ContainerWriter::new(Vec::new(), options.unwrap_or_default());
    for (name, data) in entries {
        writer.add_bytes(name, data)?;
    }
    let (result, bytes) = writer.finish_into_inner()?;
    Ok((bytes, result))
}

/// Creates an in-memory container with default options.
pub fn create_container(entries: &[(&str, &[u8])]) -> docpack::Result<Vec<u8>> {
    create_container_with_result(None, entries).map(|(bytes, _)| bytes)
}

/// Builds an asset map from `(filename, data)` pairs.
pub fn asset_map(pairs: &[(&str, &[u8])]) -> HashMap<String, Vec<u8>> {
    pairs
        .iter()
        .map(|(name, data)| (name.to_string(), data.to_vec()))
        .collect()
}

/// Encodes a document in memory with default options.
pub fn encode_document(
    content: &[ContentItem],
    assets: &[(&str, &[u8])],
) -> docpack::Result<Vec<u8>> {
    bundle::encode(content, &asset_map(assets), &WriteOptions::default()).map(|r| r.bytes)
}

/// Decodes an in-memory document.
pub fn decode_document(bytes: Vec<u8>) -> docpack::Result<bundle::Decoded> {
    bundle::decode_reader(Cursor::new(bytes))
}

/// Writes `bytes` to `name` inside `dir` and returns the path.
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("write test file");
    path
}

/// A text-and-image document used by several tests.
pub fn sample_content() -> Vec<ContentItem> {
    vec![
        ContentItem::text("Title\n"),
        ContentItem::image("photo.jpg"),
        ContentItem::text("caption"),
        ContentItem::image("chart.png"),
    ]
}

/// Assets for [`sample_content`].
pub fn sample_assets() -> Vec<(&'static str, &'static [u8])> {
    vec![("photo.jpg", JPEG), ("chart.png", PNG)]
}
