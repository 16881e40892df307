//! Encoding and decoding of document archives.
//!
//! An archive is a container holding one `content.json` manifest and zero
//! or more `assets/<filename>` entries with the bytes of embedded images.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::io::Cursor;
//! use docpack::{ContentItem, WriteOptions, bundle};
//!
//! let content = vec![ContentItem::text("caption"), ContentItem::image("a.png")];
//! let assets = HashMap::from([("a.png".to_string(), b"pixels".to_vec())]);
//!
//! let encoded = bundle::encode(&content, &assets, &WriteOptions::default())?;
//! assert!(encoded.warnings.is_empty());
//!
//! let decoded = bundle::decode_reader(Cursor::new(encoded.bytes))?;
//! assert_eq!(decoded.content, content);
//! assert_eq!(decoded.assets, vec!["a.png".to_string()]);
//! # Ok::<(), docpack::Error>(())
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::fs;
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

use crate::document::ContentItem;
use crate::format::MANIFEST_NAME;
use crate::manifest;
use crate::read::Container;
use crate::write::{ContainerWriter, WriteOptions, WriteResult};
use crate::{AssetName, Error, ResourceLimits, Result};

/// A recoverable per-asset problem encountered by a batch operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetWarning {
    /// The asset filename, or entry name for entries that are not valid
    /// asset names.
    pub filename: String,
    /// What went wrong.
    pub reason: String,
}

impl AssetWarning {
    pub(crate) fn new(filename: impl Into<String>, reason: impl fmt::Display) -> Self {
        let warning = Self {
            filename: filename.into(),
            reason: reason.to_string(),
        };
        log::warn!("Skipping asset '{}': {}", warning.filename, warning.reason);
        warning
    }
}

impl fmt::Display for AssetWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.filename, self.reason)
    }
}

/// Output of [`encode`].
#[derive(Debug, Clone)]
pub struct EncodeResult {
    /// The encoded archive.
    pub bytes: Vec<u8>,
    /// Assets that were referenced but could not be embedded.
    pub warnings: Vec<AssetWarning>,
    /// Asset filenames embedded, in first-reference order.
    pub assets_written: Vec<String>,
    /// Container statistics.
    pub stats: WriteResult,
}

/// Output of [`encode_to_path`].
#[derive(Debug, Clone)]
pub struct SaveReport {
    /// Where the archive was written.
    pub path: PathBuf,
    /// Size of the archive in bytes.
    pub size: u64,
    /// Assets that were referenced but could not be embedded.
    pub warnings: Vec<AssetWarning>,
    /// Asset filenames embedded, in first-reference order.
    pub assets_written: Vec<String>,
}

/// Output of [`decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// Content items in manifest order, with no render paths.
    pub content: Vec<ContentItem>,
    /// Filenames of the assets present in the archive.
    pub assets: Vec<String>,
}

/// Output of [`extract_assets`].
#[derive(Debug, Clone, Default)]
pub struct ExtractResult {
    /// Extracted assets, keyed by filename.
    pub assets: BTreeMap<String, PathBuf>,
    /// Entries that were skipped.
    pub warnings: Vec<AssetWarning>,
}

/// Encodes `content` into an archive.
///
/// Images are embedded once per distinct filename, in order of first
/// reference, using the bytes found in `assets`. An image whose bytes are
/// missing or whose filename is not a valid asset name is skipped with a
/// warning; the manifest still references it.
///
/// # Errors
///
/// Fails only if the manifest cannot be serialized or the container
/// cannot be written.
pub fn encode(
    content: &[ContentItem],
    assets: &HashMap<String, Vec<u8>>,
    options: &WriteOptions,
) -> Result<EncodeResult> {
    let mut writer = ContainerWriter::new(Vec::new(), options.clone());
    writer.add_bytes(MANIFEST_NAME, &manifest::to_bytes(content)?)?;

    let mut seen = HashSet::new();
    let mut warnings = Vec::new();
    let mut assets_written = Vec::new();
    for filename in content.iter().filter_map(ContentItem::filename) {
        if !seen.insert(filename) {
            continue;
        }
        let name = match AssetName::new(filename) {
            Ok(name) => name,
            Err(e) => {
                warnings.push(AssetWarning::new(filename, e));
                continue;
            }
        };
        match assets.get(filename) {
            Some(data) => {
                writer.add_bytes(&name.entry_path(), data)?;
                assets_written.push(filename.to_string());
            }
            None => warnings.push(AssetWarning::new(filename, "source bytes unavailable")),
        }
    }

    let (stats, bytes) = writer.finish_into_inner()?;
    log::debug!(
        "Encoded {} items, {} assets ({} skipped) into {} bytes",
        content.len(),
        assets_written.len(),
        warnings.len(),
        bytes.len()
    );
    Ok(EncodeResult {
        bytes,
        warnings,
        assets_written,
        stats,
    })
}

/// Encodes `content` and writes it to `path` atomically.
///
/// The archive is written to a temporary file in the destination directory
/// and renamed over `path`, so a failed save leaves any existing file
/// intact.
pub fn encode_to_path(
    path: impl AsRef<Path>,
    content: &[ContentItem],
    assets: &HashMap<String, Vec<u8>>,
    options: &WriteOptions,
) -> Result<SaveReport> {
    let path = path.as_ref();
    let encoded = encode(content, assets, options)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&encoded.bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;

    log::debug!("Saved archive to {}", path.display());
    Ok(SaveReport {
        path: path.to_path_buf(),
        size: encoded.bytes.len() as u64,
        warnings: encoded.warnings,
        assets_written: encoded.assets_written,
    })
}

/// Decodes the archive at `path` with default resource limits.
///
/// # Errors
///
/// Returns a format error (see [`Error::is_format_error`]) if the file is
/// not a readable archive or its manifest is absent or invalid.
pub fn decode(path: impl AsRef<Path>) -> Result<Decoded> {
    decode_with_limits(path, ResourceLimits::default())
}

/// Decodes the archive at `path`.
pub fn decode_with_limits(path: impl AsRef<Path>, limits: ResourceLimits) -> Result<Decoded> {
    let path = path.as_ref();
    let decoded = decode_container(Container::open_path_with_limits(path, limits)?)?;
    log::debug!(
        "Decoded {} ({} items, {} assets)",
        path.display(),
        decoded.content.len(),
        decoded.assets.len()
    );
    Ok(decoded)
}

/// Decodes an archive from a seekable reader.
pub fn decode_reader<R: Read + Seek>(reader: R) -> Result<Decoded> {
    decode_container(Container::open(reader)?)
}

fn decode_container<R: Read + Seek>(mut container: Container<R>) -> Result<Decoded> {
    let data = container.read_entry(MANIFEST_NAME).map_err(|e| match e {
        Error::EntryNotFound { .. } => Error::ManifestMissing,
        other => other,
    })?;
    let content = manifest::from_bytes(&data)?;
    let assets = container
        .entries()
        .iter()
        .filter_map(|entry| entry.asset_name()?.ok())
        .map(|name| name.as_str().to_string())
        .collect();
    Ok(Decoded { content, assets })
}

/// Extracts the assets of the archive at `path` into `dest`.
///
/// `dest` is created if needed. Only valid entries directly under
/// `assets/` are written; everything else is ignored, and entries that
/// fail to decode or write are skipped with a warning.
///
/// # Errors
///
/// Fails if the archive cannot be opened or `dest` cannot be created.
pub fn extract_assets(path: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<ExtractResult> {
    extract_assets_with_limits(path, dest, ResourceLimits::default())
}

/// Like [`extract_assets`], with explicit resource limits.
pub fn extract_assets_with_limits(
    path: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    limits: ResourceLimits,
) -> Result<ExtractResult> {
    let dest = dest.as_ref();
    let mut container = Container::open_path_with_limits(path, limits)?;
    fs::create_dir_all(dest).map_err(|e| Error::workspace(dest, e))?;

    let mut result = ExtractResult::default();
    for index in 0..container.len() {
        let entry = &container.entries()[index];
        let name = match entry.asset_name() {
            None => continue,
            Some(Ok(name)) => name,
            Some(Err(e)) => {
                result.warnings.push(AssetWarning::new(entry.name.clone(), e));
                continue;
            }
        };

        let data = match container.read_entry_at(index) {
            Ok(data) => data,
            Err(e) => {
                result.warnings.push(AssetWarning::new(name.as_str(), e));
                continue;
            }
        };
        let target = dest.join(name.as_str());
        match fs::write(&target, &data) {
            Ok(()) => {
                result.assets.insert(name.as_str().to_string(), target);
            }
            Err(e) => result.warnings.push(AssetWarning::new(name.as_str(), e)),
        }
    }

    log::debug!(
        "Extracted {} assets into {} ({} skipped)",
        result.assets.len(),
        dest.display(),
        result.warnings.len()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn assets(pairs: &[(&str, &[u8])]) -> HashMap<String, Vec<u8>> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_vec()))
            .collect()
    }

    #[test]
    fn test_missing_asset_is_skipped() {
        let content = vec![ContentItem::image("gone.png"), ContentItem::image("ok.png")];
        let result = encode(
            &content,
            &assets(&[("ok.png", b"1")]),
            &WriteOptions::default(),
        )
        .unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].filename, "gone.png");
        assert_eq!(result.assets_written, vec!["ok.png"]);

        let decoded = decode_reader(Cursor::new(result.bytes)).unwrap();
        assert_eq!(decoded.content, content);
        assert_eq!(decoded.assets, vec!["ok.png"]);
    }

    #[test]
    fn test_duplicate_references_embed_once() {
        let content = vec![
            ContentItem::image("a.png"),
            ContentItem::text("between"),
            ContentItem::image("a.png"),
        ];
        let result = encode(
            &content,
            &assets(&[("a.png", b"img")]),
            &WriteOptions::default(),
        )
        .unwrap();
        assert_eq!(result.assets_written, vec!["a.png"]);
        assert_eq!(result.stats.entries_written, 2);
    }

    #[test]
    fn test_invalid_filename_is_skipped() {
        let content = vec![ContentItem::image("../escape.png")];
        let result = encode(
            &content,
            &assets(&[("../escape.png", b"x")]),
            &WriteOptions::default(),
        )
        .unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert!(result.assets_written.is_empty());
    }

    #[test]
    fn test_missing_manifest() {
        let mut writer = ContainerWriter::new(Vec::new(), WriteOptions::default());
        writer.add_bytes("assets/a.png", b"x").unwrap();
        let (_, bytes) = writer.finish_into_inner().unwrap();

        let err = decode_reader(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, Error::ManifestMissing));
        assert!(err.is_format_error());
    }

    #[test]
    fn test_not_an_archive() {
        let err = decode_reader(Cursor::new(b"plain text, not a container".to_vec()))
            .unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn test_empty_document() {
        let result = encode(&[], &HashMap::new(), &WriteOptions::default()).unwrap();
        let decoded = decode_reader(Cursor::new(result.bytes)).unwrap();
        assert!(decoded.content.is_empty());
        assert!(decoded.assets.is_empty());
    }

    #[test]
    fn test_extract_skips_foreign_entries() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("doc.dpk");

        let mut writer = ContainerWriter::new(Vec::new(), WriteOptions::default());
        writer.add_bytes(MANIFEST_NAME, b"[]").unwrap();
        writer.add_directory("assets/").unwrap();
        writer.add_bytes("assets/a.png", b"aaa").unwrap();
        writer.add_bytes("assets/nested/b.png", b"bbb").unwrap();
        writer.add_bytes("other/c.png", b"ccc").unwrap();
        let (_, bytes) = writer.finish_into_inner().unwrap();
        fs::write(&archive, bytes).unwrap();

        let out = dir.path().join("deep").join("out");
        let result = extract_assets(&archive, &out).unwrap();
        assert_eq!(result.assets.len(), 1);
        assert_eq!(fs::read(&result.assets["a.png"]).unwrap(), b"aaa");
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].filename, "assets/nested/b.png");
        assert!(!out.join("c.png").exists());
    }

    #[test]
    fn test_encode_to_path_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.dpk");
        fs::write(&path, b"old").unwrap();

        let content = vec![ContentItem::text("new")];
        let report =
            encode_to_path(&path, &content, &HashMap::new(), &WriteOptions::default()).unwrap();
        assert_eq!(report.size, fs::metadata(&path).unwrap().len());
        assert_eq!(decode(&path).unwrap().content, content);
    }
}
