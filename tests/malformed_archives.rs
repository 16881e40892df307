//! Tests for malformed and corrupted archive handling.
//!
//! These tests verify that docpack reports format errors for archives it
//! cannot read, and degrades per asset where the archive itself is sound.

mod common;

use std::io::Cursor;

use docpack::codec::Method;
use docpack::read::Container;
use docpack::{ContentItem, Error, ResourceLimits, WriteOptions, bundle};

use common::*;

const END_RECORD_SIZE: usize = 22;

fn stored() -> Option<WriteOptions> {
    Some(WriteOptions::new().method(Method::Stored))
}

/// Returns the position of the last occurrence of `needle`.
fn rfind(haystack: &[u8], needle: &[u8]) -> usize {
    haystack
        .windows(needle.len())
        .rposition(|w| w == needle)
        .expect("needle present")
}

/// Returns the position of the first occurrence of `needle`.
fn find(haystack: &[u8], needle: &[u8]) -> usize {
    haystack
        .windows(needle.len())
        .position(|w| w == needle)
        .expect("needle present")
}

#[test]
fn test_missing_manifest() {
    let bytes = create_container(&[("assets/a.png", PNG)]).unwrap();
    let err = decode_document(bytes).unwrap_err();
    assert!(matches!(err, Error::ManifestMissing), "got {:?}", err);
    assert!(err.is_format_error());
}

#[test]
fn test_missing_manifest_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let bytes = create_container(&[("readme.txt", b"hi")]).unwrap();
    let path = write_file(dir.path(), "no-manifest.dpk", &bytes);
    assert!(bundle::decode(&path).unwrap_err().is_format_error());
}

#[test]
fn test_unparsable_manifest() {
    let bytes = create_container(&[("content.json", b"{ not json")]).unwrap();
    let err = decode_document(bytes).unwrap_err();
    assert!(matches!(err, Error::Manifest(_)));
    assert!(err.is_format_error());
}

#[test]
fn test_manifest_with_unknown_item_type() {
    let bytes = create_container(&[(
        "content.json",
        br#"{"version":1,"content":[{"type":"video","src":"a.mp4"}]}"#,
    )])
    .unwrap();
    assert!(matches!(
        decode_document(bytes).unwrap_err(),
        Error::Manifest(_)
    ));
}

#[test]
fn test_future_manifest_version() {
    let bytes = create_container(&[("content.json", br#"{"version":7,"content":[]}"#)]).unwrap();
    assert!(matches!(
        decode_document(bytes).unwrap_err(),
        Error::UnsupportedManifestVersion { version: 7 }
    ));
}

#[test]
fn test_empty_and_garbage_input() {
    assert!(decode_document(Vec::new()).unwrap_err().is_format_error());
    assert!(
        decode_document(b"PK but not really a zip file at all, just text".to_vec())
            .unwrap_err()
            .is_format_error()
    );
}

#[test]
fn test_truncated_archive() {
    let bytes = encode_document(&sample_content(), &sample_assets()).unwrap();
    for cut in [1, 10, END_RECORD_SIZE, bytes.len() / 2] {
        let truncated = bytes[..bytes.len() - cut].to_vec();
        let err = decode_document(truncated).unwrap_err();
        assert!(err.is_format_error(), "cut {}: {:?}", cut, err);
    }
}

#[test]
fn test_trailing_comment_is_skipped() {
    let mut bytes = encode_document(&sample_content(), &sample_assets()).unwrap();
    let comment = b"archive comment";
    let len_pos = bytes.len() - 2;
    bytes[len_pos..].copy_from_slice(&(comment.len() as u16).to_le_bytes());
    bytes.extend_from_slice(comment);

    assert_eq!(decode_document(bytes).unwrap().content, sample_content());
}

#[test]
fn test_central_directory_out_of_bounds() {
    let mut bytes = create_container(&[("content.json", b"[]")]).unwrap();
    let offset_pos = bytes.len() - 6;
    bytes[offset_pos..offset_pos + 4].copy_from_slice(&0x00FF_FFFFu32.to_le_bytes());

    let err = Container::open(Cursor::new(bytes)).unwrap_err();
    assert!(matches!(err, Error::CorruptHeader { .. }), "got {:?}", err);
}

#[test]
fn test_duplicate_entry_names() {
    let mut bytes = create_container(&[
        ("content.json", b"[]"),
        ("assets/a.png", b"1"),
        ("assets/b.png", b"2"),
    ])
    .unwrap();
    let pos = rfind(&bytes, b"assets/b.png");
    bytes[pos..pos + 12].copy_from_slice(b"assets/a.png");

    let err = Container::open(Cursor::new(bytes)).unwrap_err();
    assert!(matches!(err, Error::CorruptHeader { .. }), "got {:?}", err);
}

#[test]
fn test_corrupted_asset_is_skipped_on_extract() {
    let dir = tempfile::tempdir().unwrap();
    let mut bytes = create_container_with_result(
        stored(),
        &[
            ("content.json", br#"[{"type":"image","filename":"bad.png"}]"#),
            ("assets/bad.png", b"CORRUPT-ME-PLEASE"),
            ("assets/good.png", PNG),
        ],
    )
    .unwrap()
    .0;
    let pos = find(&bytes, b"CORRUPT-ME-PLEASE");
    bytes[pos] ^= 0xFF;
    let archive = write_file(dir.path(), "doc.dpk", &bytes);

    // Asset bytes are not read by decode.
    let decoded = bundle::decode(&archive).unwrap();
    assert_eq!(decoded.content, vec![ContentItem::image("bad.png")]);

    let result = bundle::extract_assets(&archive, dir.path().join("out")).unwrap();
    assert_eq!(result.assets.len(), 1);
    assert!(result.assets.contains_key("good.png"));
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].filename, "bad.png");

    let mut container = Container::open_path(&archive).unwrap();
    let verify = container.verify();
    assert_eq!(verify.failures.len(), 1);
    assert!(matches!(
        container.read_entry("assets/bad.png").unwrap_err(),
        Error::CrcMismatch { .. }
    ));
}

#[test]
fn test_corrupted_deflate_stream() {
    let payload: Vec<u8> = b"compressible ".repeat(200);
    let mut bytes = create_container(&[("assets/a.png", &payload)]).unwrap();
    let container = Container::open(Cursor::new(bytes.clone())).unwrap();
    let entry = container.entry("assets/a.png").unwrap().clone();

    // Overwrite the start of the compressed data with garbage.
    let data_start = entry.header_offset as usize + 30 + entry.name.len();
    for b in &mut bytes[data_start..data_start + 8] {
        *b = 0xFF;
    }

    let mut container = Container::open(Cursor::new(bytes)).unwrap();
    let err = container.read_entry("assets/a.png").unwrap_err();
    assert!(err.is_corruption(), "got {:?}", err);
}

#[test]
fn test_unsupported_method() {
    let mut bytes =
        create_container_with_result(stored(), &[("assets/a.png", b"data")]).unwrap().0;
    let container = Container::open(Cursor::new(bytes.clone())).unwrap();
    assert_eq!(container.len(), 1);

    // The method field sits 10 bytes into the central header.
    let central = rfind(&bytes, &[0x50, 0x4B, 0x01, 0x02]);
    bytes[central + 10..central + 12].copy_from_slice(&12u16.to_le_bytes());

    let mut container = Container::open(Cursor::new(bytes)).unwrap();
    assert!(matches!(
        container.read_entry("assets/a.png").unwrap_err(),
        Error::UnsupportedMethod { method: 12 }
    ));
}

#[test]
fn test_encrypted_entry_rejected() {
    let mut bytes =
        create_container_with_result(stored(), &[("assets/a.png", b"data")]).unwrap().0;
    let central = rfind(&bytes, &[0x50, 0x4B, 0x01, 0x02]);
    bytes[central + 8] |= 0x01;

    let mut container = Container::open(Cursor::new(bytes)).unwrap();
    assert!(container.entries()[0].is_encrypted());
    assert!(matches!(
        container.read_entry("assets/a.png").unwrap_err(),
        Error::InvalidFormat(_)
    ));
}

#[test]
fn test_resource_limits_enforced() {
    let dir = tempfile::tempdir().unwrap();
    let big = vec![0u8; 64 * 1024];
    let bytes = encode_document(&[ContentItem::image("big.bmp")], &[("big.bmp", &big)]).unwrap();
    let archive = write_file(dir.path(), "big.dpk", &bytes);

    let limits = ResourceLimits::default().max_entry_size(1024);
    let err = bundle::decode_with_limits(&archive, limits).unwrap_err();
    assert!(matches!(err, Error::ResourceLimitExceeded(_)));

    let limits = ResourceLimits::default().max_total_size(4096);
    assert!(bundle::extract_assets_with_limits(&archive, dir.path().join("out"), limits).is_err());

    assert!(bundle::decode_with_limits(&archive, ResourceLimits::unlimited()).is_ok());
}

#[test]
fn test_inflated_declared_size_is_rejected() {
    let mut bytes =
        create_container_with_result(stored(), &[("assets/a.png", b"data")]).unwrap().0;

    // The uncompressed size field sits 24 bytes into the central header.
    let central = rfind(&bytes, &[0x50, 0x4B, 0x01, 0x02]);
    bytes[central + 24..central + 28].copy_from_slice(&0xFFFF_FFF0u32.to_le_bytes());

    let mut container =
        Container::open_with_limits(Cursor::new(bytes), ResourceLimits::unlimited()).unwrap();
    assert_eq!(container.entries()[0].size, 0xFFFF_FFF0);
    let err = container.read_entry("assets/a.png").unwrap_err();
    assert!(matches!(err, Error::CorruptHeader { .. }), "got {:?}", err);
}

#[test]
fn test_non_archive_file_is_named_as_such() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "notes.txt", b"just some notes, nothing zipped here");

    let err = bundle::decode(&path).unwrap_err();
    assert!(err.is_format_error());
    assert!(err.to_string().contains("not a document archive"), "got {}", err);
}
