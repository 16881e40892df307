//! Container format constants and record definitions.
//!
//! Document archives are ZIP-compatible containers: each entry is preceded by
//! a local file header, and a central directory followed by an
//! end-of-central-directory record closes the file. Only the subset needed
//! for documents is supported: `Stored` and `Deflate` entries, 32-bit sizes,
//! a single disk.

pub mod detect;
pub mod records;

/// Name of the manifest entry holding the ordered content items.
pub const MANIFEST_NAME: &str = "content.json";

/// Namespace prefix for embedded binary assets.
pub const ASSET_PREFIX: &str = "assets/";

/// Highest manifest version this build writes and understands.
pub const MANIFEST_VERSION: u32 = 1;

/// Record signatures (little-endian `PK..` magic values).
pub mod signature {
    /// Local file header.
    pub const LOCAL_HEADER: u32 = 0x0403_4B50;
    /// Central directory file header.
    pub const CENTRAL_HEADER: u32 = 0x0201_4B50;
    /// End of central directory record.
    pub const END_OF_CENTRAL_DIR: u32 = 0x0605_4B50;
}

/// Compression method numbers stored in entry headers.
pub mod method_id {
    /// No compression.
    pub const STORED: u16 = 0;
    /// Raw Deflate.
    pub const DEFLATE: u16 = 8;
}

/// General purpose flag: entry name is UTF-8.
pub const FLAG_UTF8: u16 = 1 << 11;

/// General purpose flag: entry is encrypted.
pub const FLAG_ENCRYPTED: u16 = 1;

/// "Version needed to extract" written for every entry (2.0: Deflate).
pub const VERSION_NEEDED: u16 = 20;

/// Fixed DOS date written for every entry (1980-01-01).
///
/// Entry timestamps carry no document meaning, so a constant keeps encoded
/// output byte-for-byte reproducible.
pub const DOS_EPOCH_DATE: u16 = (1 << 5) | 1;

/// Fixed DOS time written for every entry (00:00:00).
pub const DOS_EPOCH_TIME: u16 = 0;
