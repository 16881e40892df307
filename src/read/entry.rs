//! Container entry type.

use crate::format::FLAG_ENCRYPTED;
use crate::{AssetName, Result};

/// An entry in a container, as described by the central directory.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Entry {
    /// Position in the central directory.
    pub index: usize,
    /// The entry name (forward-slash separated).
    pub name: String,
    /// Raw compression method number.
    pub method: u16,
    /// General purpose flags.
    pub flags: u16,
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Size of the stored (compressed) data.
    pub compressed_size: u64,
    /// Uncompressed size in bytes.
    pub size: u64,
    /// Offset of the local header from the start of the container.
    pub header_offset: u64,
}

impl Entry {
    /// Returns `true` for directory markers: empty entries ending in `/`.
    ///
    /// Markers carry no data and are never treated as assets.
    pub fn is_directory_marker(&self) -> bool {
        self.name.ends_with('/') && self.size == 0
    }

    /// Returns `true` if the entry is flagged as encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }

    /// Returns the asset name if this entry lives under `assets/`.
    ///
    /// See [`AssetName::from_entry_path`].
    pub fn asset_name(&self) -> Option<Result<AssetName>> {
        if self.is_directory_marker() {
            return None;
        }
        AssetName::from_entry_path(&self.name)
    }
}
