//! Error types for document archive and workspace operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when reading or writing document archives and managing
//! per-tab asset workspaces, along with a convenient [`Result<T>`] alias.
//!
//! # Error Categories
//!
//! Errors fall into three families that callers usually treat differently:
//!
//! | Family | Variants | Effect |
//! |--------|----------|--------|
//! | Format | [`InvalidFormat`][Error::InvalidFormat], [`CorruptHeader`][Error::CorruptHeader], [`ManifestMissing`][Error::ManifestMissing], [`Manifest`][Error::Manifest], ... | Aborts the current open/decode |
//! | Asset | [`Asset`][Error::Asset] | Per-asset; batch operations downgrade it to a warning |
//! | Workspace | [`Workspace`][Error::Workspace] | Fails `get_or_create` / `write_assets` |
//!
//! # Example
//!
//! ```rust,no_run
//! use docpack::{Error, bundle};
//!
//! fn open_document(path: &str) -> docpack::Result<()> {
//!     match bundle::decode(path) {
//!         Ok(decoded) => {
//!             println!("{} items, {} assets", decoded.content.len(), decoded.assets.len());
//!             Ok(())
//!         }
//!         Err(e) if e.is_format_error() => {
//!             eprintln!("Not a readable document: {}", e);
//!             Err(e)
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! ```

use std::io;
use std::path::PathBuf;

/// Helper struct for formatting CrcMismatch error messages.
struct CrcMismatchDisplay<'a> {
    entry_name: &'a str,
    expected: u32,
    actual: u32,
}

impl std::fmt::Display for CrcMismatchDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CRC mismatch for entry '{}': expected {:#x}, got {:#x}",
            self.entry_name, self.expected, self.actual
        )
    }
}

/// The main error type for document archive operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred during file operations.
    ///
    /// This wraps [`std::io::Error`] for failures that are not attributable
    /// to a specific asset or workspace, such as reading the archive file
    /// itself.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file is not a container archive.
    ///
    /// Returned when the end-of-central-directory record cannot be found,
    /// which usually means the file is not a document archive at all.
    #[error("Invalid archive format: {0}")]
    InvalidFormat(String),

    /// A container record is corrupt or truncated.
    ///
    /// The error includes the byte offset where the damage was detected.
    #[error("Corrupt header at offset {offset:#x}: {reason}")]
    CorruptHeader {
        /// The byte offset where corruption was detected.
        offset: u64,
        /// A description of the corruption.
        reason: String,
    },

    /// The archive has no manifest entry.
    ///
    /// Every document archive must contain exactly one manifest
    /// (`content.json`). Its absence is fatal to the decode and no partial
    /// document is produced.
    #[error("Archive has no manifest entry '{}'", crate::format::MANIFEST_NAME)]
    ManifestMissing,

    /// The manifest entry exists but could not be parsed.
    #[error("Manifest is not valid: {0}")]
    Manifest(#[from] serde_json::Error),

    /// The manifest declares a version newer than this build understands.
    #[error("Unsupported manifest version {version}")]
    UnsupportedManifestVersion {
        /// The version found in the manifest.
        version: u32,
    },

    /// An entry uses a compression method this build cannot decode.
    ///
    /// Only `Stored` (0) and `Deflate` (8) are supported.
    #[error("Unsupported compression method: {method}")]
    UnsupportedMethod {
        /// The ZIP method number.
        method: u16,
    },

    /// The CRC checksum of a decoded entry does not match the stored value.
    #[error("{}", CrcMismatchDisplay { entry_name: entry_name.as_str(), expected: *expected, actual: *actual })]
    CrcMismatch {
        /// Name of the entry with the mismatch.
        entry_name: String,
        /// The CRC stored in the archive.
        expected: u32,
        /// The CRC of the decoded data.
        actual: u32,
    },

    /// A single asset could not be read or written.
    ///
    /// Batch operations (`encode`, `extract_assets`, `read_assets`,
    /// `write_assets`) never return this error; they record a warning and
    /// omit the asset instead.
    #[error("Asset '{filename}' is not accessible: {source}")]
    Asset {
        /// Logical asset filename.
        filename: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A workspace directory could not be created or written.
    #[error("Workspace '{}' is not usable: {source}", path.display())]
    Workspace {
        /// The workspace directory.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// An asset filename or tab identifier is not a safe path segment.
    ///
    /// Names must be non-empty, contain no path separators or NUL bytes,
    /// and must not be `.` or `..`.
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// An entry with this name was already written to the container.
    #[error("Entry already exists: {path}")]
    EntryExists {
        /// The duplicated entry name.
        path: String,
    },

    /// No entry with this name exists in the container.
    #[error("Entry not found: {path}")]
    EntryNotFound {
        /// The entry name that was looked up.
        path: String,
    },

    /// A resource limit was exceeded.
    ///
    /// Raised for archives with too many entries, oversized entries, or
    /// sizes that do not fit the 32-bit container fields.
    #[error("Resource limit exceeded: {0}")]
    ResourceLimitExceeded(String),

    /// An invalid compression level was provided.
    ///
    /// ```rust
    /// use docpack::{Error, WriteOptions};
    ///
    /// assert!(WriteOptions::new().level(9).is_ok());
    /// assert!(matches!(
    ///     WriteOptions::new().level(12),
    ///     Err(Error::InvalidCompressionLevel { level: 12 })
    /// ));
    /// ```
    #[error("invalid compression level {level}: must be 0-9")]
    InvalidCompressionLevel {
        /// The invalid level that was provided.
        level: u32,
    },

    /// The tab is not open in this session.
    #[error("Unknown tab: {0}")]
    UnknownTab(String),

    /// A save was requested for a draft without a destination path.
    #[error("Document has no file path; a destination is required")]
    NoSavePath,
}

impl Error {
    /// Returns `true` if this error means the archive itself is unreadable.
    ///
    /// Format errors abort the current open or decode call without
    /// producing a document.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidFormat(_)
                | Error::CorruptHeader { .. }
                | Error::ManifestMissing
                | Error::Manifest(_)
                | Error::UnsupportedManifestVersion { .. }
                | Error::UnsupportedMethod { .. }
                | Error::CrcMismatch { .. }
        )
    }

    /// Returns `true` if this error might be recoverable.
    ///
    /// Per-asset failures are recoverable by definition: the containing
    /// operation continues without the asset. Transient I/O errors
    /// (`WouldBlock`, `Interrupted`, `TimedOut`) may succeed on retry.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Asset { .. } => true,
            Error::NoSavePath => true,
            Error::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }

    /// Returns `true` if this is a data corruption error.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::CrcMismatch { .. } | Error::CorruptHeader { .. }
        )
    }

    /// Returns the asset or entry name associated with this error, if any.
    pub fn entry_name(&self) -> Option<&str> {
        match self {
            Error::CrcMismatch { entry_name, .. } => Some(entry_name.as_str()),
            Error::Asset { filename, .. } => Some(filename.as_str()),
            Error::EntryExists { path } | Error::EntryNotFound { path } => Some(path.as_str()),
            _ => None,
        }
    }

    /// Creates a CorruptHeader error.
    pub fn corrupt_header(offset: u64, reason: impl Into<String>) -> Self {
        Error::CorruptHeader {
            offset,
            reason: reason.into(),
        }
    }

    /// Creates a Workspace error for `path`.
    pub fn workspace(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Workspace {
            path: path.into(),
            source,
        }
    }

    /// Creates an Asset error for `filename`.
    pub fn asset(filename: impl Into<String>, source: io::Error) -> Self {
        Error::Asset {
            filename: filename.into(),
            source,
        }
    }
}

/// A specialized Result type for docpack operations.
pub type Result<T> = std::result::Result<T, Error>;
