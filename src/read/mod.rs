//! Container reading API.
//!
//! # Example
//!
//! ```rust,no_run
//! use docpack::read::Container;
//!
//! let mut container = Container::open_path("notes.dpk")?;
//! for entry in container.entries() {
//!     println!("{}: {} bytes", entry.name, entry.size);
//! }
//! let manifest = container.read_entry("content.json")?;
//! # Ok::<(), docpack::Error>(())
//! ```

mod entry;

pub use entry::Entry;

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::checksum::Crc32Reader;
use crate::codec::{self, Method};
use crate::format::detect::detect_format;
use crate::format::records::{
    CentralHeader, END_RECORD_SIZE, EndRecord, LOCAL_HEADER_SIZE, LocalHeader, MAX_COMMENT_SIZE,
};
use crate::{Error, Result, safety::ResourceLimits};

/// Upper bound on the buffer reserved up front from a declared entry size.
const MAX_PREALLOC: u64 = 64 * 1024;

/// Outcome of [`Container::verify`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyResult {
    /// Entries that decoded with a matching size and CRC.
    pub entries_ok: usize,
    /// Entries that failed, with the error message.
    pub failures: Vec<(String, String)>,
}

impl VerifyResult {
    /// Returns `true` if every entry verified.
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A container reader.
///
/// Opening parses only the central directory; entry data is decoded on
/// demand by [`read_entry`](Self::read_entry).
pub struct Container<R> {
    reader: R,
    entries: Vec<Entry>,
    /// Offset where entry data must end (start of the central directory).
    data_end: u64,
}

impl<R> std::fmt::Debug for Container<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl Container<BufReader<File>> {
    /// Opens a container file with default resource limits.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_path_with_limits(path, ResourceLimits::default())
    }

    /// Opens a container file with explicit resource limits.
    pub fn open_path_with_limits(path: impl AsRef<Path>, limits: ResourceLimits) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::open_with_limits(BufReader::new(file), limits)
    }
}

impl<R: Read + Seek> Container<R> {
    /// Opens a container from a seekable reader with default limits.
    pub fn open(reader: R) -> Result<Self> {
        Self::open_with_limits(reader, ResourceLimits::default())
    }

    /// Opens a container from a seekable reader.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidFormat`] if the data does not start with a container
    ///   signature or no end-of-central-directory record is found
    /// - [`Error::CorruptHeader`] if the central directory is inconsistent
    /// - [`Error::ResourceLimitExceeded`] if `limits` are exceeded
    pub fn open_with_limits(mut reader: R, limits: ResourceLimits) -> Result<Self> {
        let len = reader.seek(SeekFrom::End(0))?;
        if len < END_RECORD_SIZE as u64 {
            return Err(Error::InvalidFormat(format!(
                "file is {} bytes, too small to be an archive",
                len
            )));
        }

        reader.seek(SeekFrom::Start(0))?;
        if !detect_format(&mut reader)?.is_container() {
            return Err(Error::InvalidFormat(
                "not a document archive (unrecognized signature)".into(),
            ));
        }

        let tail_len = len.min((END_RECORD_SIZE + MAX_COMMENT_SIZE) as u64);
        let tail_offset = len - tail_len;
        reader.seek(SeekFrom::Start(tail_offset))?;
        let mut tail = vec![0u8; tail_len as usize];
        reader.read_exact(&mut tail)?;

        let end_offset = EndRecord::locate(&tail, tail_offset).ok_or_else(|| {
            Error::InvalidFormat("end of central directory record not found".into())
        })?;
        let end = EndRecord::parse(&tail[(end_offset - tail_offset) as usize..], end_offset)?;

        let cd_offset = u64::from(end.central_dir_offset);
        let cd_size = u64::from(end.central_dir_size);
        if cd_offset + cd_size > end_offset {
            return Err(Error::corrupt_header(
                end_offset,
                "central directory extends past the end record",
            ));
        }
        limits.check_entries(usize::from(end.entries))?;

        reader.seek(SeekFrom::Start(cd_offset))?;
        let mut directory = vec![0u8; cd_size as usize];
        reader.read_exact(&mut directory)?;

        let mut entries = Vec::with_capacity(usize::from(end.entries));
        let mut seen = HashSet::new();
        let mut pos = 0usize;
        let mut total: u64 = 0;
        for index in 0..usize::from(end.entries) {
            let offset = cd_offset + pos as u64;
            let (header, consumed) = CentralHeader::parse(&directory[pos..], offset)?;
            pos += consumed;

            if u64::from(header.local_header_offset) >= cd_offset {
                return Err(Error::corrupt_header(
                    offset,
                    format!("entry '{}' points past the data area", header.name),
                ));
            }
            if !seen.insert(header.name.clone()) {
                return Err(Error::corrupt_header(
                    offset,
                    format!("duplicate entry '{}'", header.name),
                ));
            }

            let size = u64::from(header.uncompressed_size);
            total = total.saturating_add(size);
            limits.check_entry(&header.name, size, total)?;

            entries.push(Entry {
                index,
                name: header.name,
                method: header.method,
                flags: header.flags,
                crc32: header.crc32,
                compressed_size: u64::from(header.compressed_size),
                size,
                header_offset: u64::from(header.local_header_offset),
            });
        }

        log::debug!("Opened container with {} entries", entries.len());

        Ok(Self {
            reader,
            entries,
            data_end: cd_offset,
        })
    }

    /// Returns all entries in central directory order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the container has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up an entry by name.
    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Returns `true` if an entry named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    /// Reads and decodes the entry named `name`.
    pub fn read_entry(&mut self, name: &str) -> Result<Vec<u8>> {
        let index = self
            .entry(name)
            .map(|e| e.index)
            .ok_or_else(|| Error::EntryNotFound {
                path: name.to_string(),
            })?;
        self.read_entry_at(index)
    }

    /// Reads and decodes the entry at `index`, verifying size and CRC.
    pub fn read_entry_at(&mut self, index: usize) -> Result<Vec<u8>> {
        let entry = self
            .entries
            .get(index)
            .cloned()
            .ok_or_else(|| Error::EntryNotFound {
                path: format!("#{}", index),
            })?;

        if entry.is_encrypted() {
            return Err(Error::InvalidFormat(format!(
                "entry '{}' is encrypted",
                entry.name
            )));
        }
        let method = Method::from_id(entry.method)?;

        self.reader.seek(SeekFrom::Start(entry.header_offset))?;
        let mut fixed = [0u8; LOCAL_HEADER_SIZE];
        self.reader
            .read_exact(&mut fixed)
            .map_err(|e| map_truncation(e, entry.header_offset, "local header"))?;
        let local = LocalHeader::parse(&fixed, entry.header_offset)?;

        let data_start = entry.header_offset + local.data_offset();
        if data_start + entry.compressed_size > self.data_end {
            return Err(Error::corrupt_header(
                entry.header_offset,
                format!("data of entry '{}' overlaps the central directory", entry.name),
            ));
        }
        self.reader.seek(SeekFrom::Start(data_start))?;

        let stored = (&mut self.reader).take(entry.compressed_size);
        let decoded = codec::decoder(method, BufReader::new(stored));
        let mut checked = Crc32Reader::new(decoded);
        let mut data = Vec::with_capacity(entry.size.min(MAX_PREALLOC) as usize);
        (&mut checked)
            .take(entry.size + 1)
            .read_to_end(&mut data)
            .map_err(|e| {
                Error::corrupt_header(
                    data_start,
                    format!("entry '{}' failed to decode: {}", entry.name, e),
                )
            })?;

        if data.len() as u64 != entry.size {
            return Err(Error::corrupt_header(
                data_start,
                format!(
                    "entry '{}' decoded to {} bytes, expected {}",
                    entry.name,
                    data.len(),
                    entry.size
                ),
            ));
        }

        let actual = checked.crc();
        if actual != entry.crc32 {
            return Err(Error::CrcMismatch {
                entry_name: entry.name,
                expected: entry.crc32,
                actual,
            });
        }

        Ok(data)
    }

    /// Decodes every entry and reports which ones fail.
    ///
    /// Directory markers are skipped.
    pub fn verify(&mut self) -> VerifyResult {
        let mut result = VerifyResult::default();
        for index in 0..self.entries.len() {
            if self.entries[index].is_directory_marker() {
                continue;
            }
            match self.read_entry_at(index) {
                Ok(_) => result.entries_ok += 1,
                Err(e) => result
                    .failures
                    .push((self.entries[index].name.clone(), e.to_string())),
            }
        }
        result
    }

    /// Consumes the container and returns the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Turns an unexpected EOF into a corrupt-header error at `offset`.
fn map_truncation(e: io::Error, offset: u64, what: &str) -> Error {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        Error::corrupt_header(offset, format!("truncated {}", what))
    } else {
        Error::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::write::{ContainerWriter, WriteOptions};
    use std::io::Cursor;

    fn sample() -> Vec<u8> {
        let mut writer = ContainerWriter::new(Vec::new(), WriteOptions::default());
        writer.add_bytes("content.json", b"[]").unwrap();
        writer.add_bytes("assets/a.png", b"pixels").unwrap();
        writer.finish_into_inner().unwrap().1
    }

    #[test]
    fn test_too_small() {
        let err = Container::open(Cursor::new(vec![0u8; 10])).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_unrecognized_signature() {
        let err = Container::open(Cursor::new(b"7z\xBC\xAF\x27\x1C".repeat(10))).unwrap_err();
        match err {
            Error::InvalidFormat(msg) => assert!(msg.contains("not a document archive")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_no_end_record() {
        let mut data = b"PK\x03\x04".to_vec();
        data.resize(200, 0);
        let err = Container::open(Cursor::new(data)).unwrap_err();
        match err {
            Error::InvalidFormat(msg) => assert!(msg.contains("end of central directory")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_entry_lookup() {
        let container = Container::open(Cursor::new(sample())).unwrap();
        assert!(container.contains("content.json"));
        assert!(!container.contains("missing"));
        assert_eq!(container.entry("assets/a.png").unwrap().size, 6);
    }

    #[test]
    fn test_missing_entry() {
        let mut container = Container::open(Cursor::new(sample())).unwrap();
        let err = container.read_entry("nope").unwrap_err();
        assert!(matches!(err, Error::EntryNotFound { .. }));
        assert!(container.read_entry_at(99).is_err());
    }

    #[test]
    fn test_crc_mismatch_detected() {
        let mut bytes = sample();
        let container = Container::open(Cursor::new(bytes.clone())).unwrap();
        let entry = container.entry("assets/a.png").unwrap().clone();
        // flip one byte of the stored CRC in the central directory copy
        let needle = entry.crc32.to_le_bytes();
        let pos = bytes
            .windows(4)
            .rposition(|w| w == needle)
            .unwrap();
        bytes[pos] ^= 0xFF;

        let mut container = Container::open(Cursor::new(bytes)).unwrap();
        let err = container.read_entry("assets/a.png").unwrap_err();
        assert!(err.is_corruption());
        assert_eq!(err.entry_name(), Some("assets/a.png"));
    }

    #[test]
    fn test_entry_limit() {
        let limits = ResourceLimits::new().max_entries(1);
        let err = Container::open_with_limits(Cursor::new(sample()), limits).unwrap_err();
        assert!(matches!(err, Error::ResourceLimitExceeded(_)));
    }

    #[test]
    fn test_verify_reports_failures() {
        let mut container = Container::open(Cursor::new(sample())).unwrap();
        let result = container.verify();
        assert_eq!(result.entries_ok, 2);
        assert!(result.is_ok());
    }
}
