//! Container detection from leading bytes.

use std::io::{Read, Seek, SeekFrom};

use crate::{Error, Result};

/// Signature of a container whose first record is a local file header.
const LOCAL_HEADER_MAGIC: &[u8; 4] = b"PK\x03\x04";

/// Signature of an empty container (only the end record).
const EMPTY_MAGIC: &[u8; 4] = b"PK\x05\x06";

/// What the leading bytes of a file look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// A container with at least one entry.
    Container,
    /// A container with no entries.
    Empty,
    /// Not a recognized container.
    Unknown,
}

impl ContainerKind {
    /// Returns `true` for both populated and empty containers.
    pub fn is_container(self) -> bool {
        !matches!(self, ContainerKind::Unknown)
    }
}

/// Classifies a byte prefix.
///
/// ```rust
/// use docpack::format::detect::{ContainerKind, detect_bytes};
///
/// assert_eq!(detect_bytes(b"PK\x03\x04rest"), ContainerKind::Container);
/// assert_eq!(detect_bytes(b"7z\xBC\xAF"), ContainerKind::Unknown);
/// ```
pub fn detect_bytes(header: &[u8]) -> ContainerKind {
    if header.starts_with(LOCAL_HEADER_MAGIC) {
        ContainerKind::Container
    } else if header.starts_with(EMPTY_MAGIC) {
        ContainerKind::Empty
    } else {
        ContainerKind::Unknown
    }
}

/// Detects the container kind from a reader, restoring its position.
pub fn detect_format<R: Read + Seek>(reader: &mut R) -> Result<ContainerKind> {
    let start_pos = reader.stream_position().map_err(Error::Io)?;

    let mut header = [0u8; 4];
    let mut filled = 0;
    while filled < header.len() {
        let n = reader.read(&mut header[filled..]).map_err(Error::Io)?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    reader.seek(SeekFrom::Start(start_pos)).map_err(Error::Io)?;
    Ok(detect_bytes(&header[..filled]))
}
