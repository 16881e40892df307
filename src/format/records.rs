//! Binary records of the container format.
//!
//! All multi-byte integers are little-endian. Parsing works on byte slices
//! and reports the absolute archive offset of any truncation so callers get
//! a precise [`Error::CorruptHeader`].

use std::io::{self, Write};

use super::{
    DOS_EPOCH_DATE, DOS_EPOCH_TIME, FLAG_UTF8, VERSION_NEEDED, signature,
};
use crate::{Error, Result};

/// Fixed size of a local file header, excluding name and extra field.
pub const LOCAL_HEADER_SIZE: usize = 30;

/// Fixed size of a central directory header, excluding variable fields.
pub const CENTRAL_HEADER_SIZE: usize = 46;

/// Fixed size of the end-of-central-directory record, excluding comment.
pub const END_RECORD_SIZE: usize = 22;

/// Maximum length of the trailing archive comment.
pub const MAX_COMMENT_SIZE: usize = u16::MAX as usize;

/// Little-endian cursor over a byte slice that knows its archive offset.
struct FieldReader<'a> {
    data: &'a [u8],
    pos: usize,
    base_offset: u64,
}

impl<'a> FieldReader<'a> {
    fn new(data: &'a [u8], base_offset: u64) -> Self {
        Self {
            data,
            pos: 0,
            base_offset,
        }
    }

    fn offset(&self) -> u64 {
        self.base_offset + self.pos as u64
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        if self.data.len() - self.pos < len {
            return Err(Error::corrupt_header(
                self.offset(),
                format!("truncated {}", what),
            ));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn u16(&mut self, what: &str) -> Result<u16> {
        let b = self.take(2, what)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self, what: &str) -> Result<u32> {
        let b = self.take(4, what)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

/// Decodes an entry name, honoring the UTF-8 flag.
///
/// Names without the flag are CP437 in theory; in practice every name this
/// crate cares about is ASCII, so they are decoded lossily.
fn decode_name(raw: &[u8], flags: u16, offset: u64) -> Result<String> {
    if flags & FLAG_UTF8 != 0 {
        String::from_utf8(raw.to_vec())
            .map_err(|_| Error::corrupt_header(offset, "entry name is not valid UTF-8"))
    } else {
        Ok(String::from_utf8_lossy(raw).into_owned())
    }
}

/// Header preceding each entry's data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalHeader {
    /// General purpose flags.
    pub flags: u16,
    /// Compression method.
    pub method: u16,
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Size of the stored data.
    pub compressed_size: u32,
    /// Size after decompression.
    pub uncompressed_size: u32,
    /// Length of the entry name that follows the fixed part.
    pub name_len: u16,
    /// Length of the extra field that follows the name.
    pub extra_len: u16,
}

impl LocalHeader {
    /// Parses the fixed part of a local header located at `offset`.
    pub fn parse(data: &[u8], offset: u64) -> Result<Self> {
        let mut r = FieldReader::new(data, offset);
        let sig = r.u32("local header signature")?;
        if sig != signature::LOCAL_HEADER {
            return Err(Error::corrupt_header(
                offset,
                format!("bad local header signature {:#010x}", sig),
            ));
        }
        let _version_needed = r.u16("local header")?;
        let flags = r.u16("local header")?;
        let method = r.u16("local header")?;
        let _time = r.u16("local header")?;
        let _date = r.u16("local header")?;
        let crc32 = r.u32("local header")?;
        let compressed_size = r.u32("local header")?;
        let uncompressed_size = r.u32("local header")?;
        let name_len = r.u16("local header")?;
        let extra_len = r.u16("local header")?;
        Ok(Self {
            flags,
            method,
            crc32,
            compressed_size,
            uncompressed_size,
            name_len,
            extra_len,
        })
    }

    /// Offset of the entry data relative to the start of this header.
    pub fn data_offset(&self) -> u64 {
        LOCAL_HEADER_SIZE as u64 + u64::from(self.name_len) + u64::from(self.extra_len)
    }

    /// Writes this header followed by `name`.
    pub fn write_to<W: Write>(&self, w: &mut W, name: &str) -> io::Result<()> {
        w.write_all(&signature::LOCAL_HEADER.to_le_bytes())?;
        w.write_all(&VERSION_NEEDED.to_le_bytes())?;
        w.write_all(&self.flags.to_le_bytes())?;
        w.write_all(&self.method.to_le_bytes())?;
        w.write_all(&DOS_EPOCH_TIME.to_le_bytes())?;
        w.write_all(&DOS_EPOCH_DATE.to_le_bytes())?;
        w.write_all(&self.crc32.to_le_bytes())?;
        w.write_all(&self.compressed_size.to_le_bytes())?;
        w.write_all(&self.uncompressed_size.to_le_bytes())?;
        w.write_all(&self.name_len.to_le_bytes())?;
        w.write_all(&0u16.to_le_bytes())?;
        w.write_all(name.as_bytes())
    }
}

/// Central directory record describing one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralHeader {
    /// Entry name.
    pub name: String,
    /// General purpose flags.
    pub flags: u16,
    /// Compression method.
    pub method: u16,
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Size of the stored data.
    pub compressed_size: u32,
    /// Size after decompression.
    pub uncompressed_size: u32,
    /// Offset of the entry's local header from the start of the archive.
    pub local_header_offset: u32,
}

impl CentralHeader {
    /// Parses one central header at the start of `data`.
    ///
    /// Returns the header and the number of bytes it occupied.
    pub fn parse(data: &[u8], offset: u64) -> Result<(Self, usize)> {
        let mut r = FieldReader::new(data, offset);
        let sig = r.u32("central header signature")?;
        if sig != signature::CENTRAL_HEADER {
            return Err(Error::corrupt_header(
                offset,
                format!("bad central header signature {:#010x}", sig),
            ));
        }
        let _version_made_by = r.u16("central header")?;
        let _version_needed = r.u16("central header")?;
        let flags = r.u16("central header")?;
        let method = r.u16("central header")?;
        let _time = r.u16("central header")?;
        let _date = r.u16("central header")?;
        let crc32 = r.u32("central header")?;
        let compressed_size = r.u32("central header")?;
        let uncompressed_size = r.u32("central header")?;
        let name_len = r.u16("central header")?;
        let extra_len = r.u16("central header")?;
        let comment_len = r.u16("central header")?;
        let _disk_start = r.u16("central header")?;
        let _internal_attr = r.u16("central header")?;
        let _external_attr = r.u32("central header")?;
        let local_header_offset = r.u32("central header")?;

        let name_offset = r.offset();
        let raw_name = r.take(usize::from(name_len), "entry name")?;
        let name = decode_name(raw_name, flags, name_offset)?;
        r.take(usize::from(extra_len), "extra field")?;
        r.take(usize::from(comment_len), "entry comment")?;

        Ok((
            Self {
                name,
                flags,
                method,
                crc32,
                compressed_size,
                uncompressed_size,
                local_header_offset,
            },
            r.pos,
        ))
    }

    /// Writes this record.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let name_len = self.name.len() as u16;
        w.write_all(&signature::CENTRAL_HEADER.to_le_bytes())?;
        w.write_all(&VERSION_NEEDED.to_le_bytes())?; // version made by
        w.write_all(&VERSION_NEEDED.to_le_bytes())?;
        w.write_all(&self.flags.to_le_bytes())?;
        w.write_all(&self.method.to_le_bytes())?;
        w.write_all(&DOS_EPOCH_TIME.to_le_bytes())?;
        w.write_all(&DOS_EPOCH_DATE.to_le_bytes())?;
        w.write_all(&self.crc32.to_le_bytes())?;
        w.write_all(&self.compressed_size.to_le_bytes())?;
        w.write_all(&self.uncompressed_size.to_le_bytes())?;
        w.write_all(&name_len.to_le_bytes())?;
        w.write_all(&0u16.to_le_bytes())?; // extra
        w.write_all(&0u16.to_le_bytes())?; // comment
        w.write_all(&0u16.to_le_bytes())?; // disk start
        w.write_all(&0u16.to_le_bytes())?; // internal attributes
        w.write_all(&0u32.to_le_bytes())?; // external attributes
        w.write_all(&self.local_header_offset.to_le_bytes())?;
        w.write_all(self.name.as_bytes())
    }

    /// Returns the matching local header for this entry.
    pub fn local_header(&self) -> LocalHeader {
        LocalHeader {
            flags: self.flags,
            method: self.method,
            crc32: self.crc32,
            compressed_size: self.compressed_size,
            uncompressed_size: self.uncompressed_size,
            name_len: self.name.len() as u16,
            extra_len: 0,
        }
    }
}

/// End-of-central-directory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndRecord {
    /// Number of central directory entries.
    pub entries: u16,
    /// Size of the central directory in bytes.
    pub central_dir_size: u32,
    /// Offset of the central directory from the start of the archive.
    pub central_dir_offset: u32,
}

impl EndRecord {
    /// Parses the record at the start of `data`.
    pub fn parse(data: &[u8], offset: u64) -> Result<Self> {
        let mut r = FieldReader::new(data, offset);
        let sig = r.u32("end record signature")?;
        if sig != signature::END_OF_CENTRAL_DIR {
            return Err(Error::corrupt_header(offset, "bad end record signature"));
        }
        let disk = r.u16("end record")?;
        let cd_disk = r.u16("end record")?;
        let entries_on_disk = r.u16("end record")?;
        let entries = r.u16("end record")?;
        let central_dir_size = r.u32("end record")?;
        let central_dir_offset = r.u32("end record")?;

        if disk != 0 || cd_disk != 0 || entries_on_disk != entries {
            return Err(Error::InvalidFormat(
                "multi-disk archives are not supported".into(),
            ));
        }

        Ok(Self {
            entries,
            central_dir_size,
            central_dir_offset,
        })
    }

    /// Finds the last end record in the tail of an archive.
    ///
    /// `tail` holds the final bytes of the archive and starts at absolute
    /// offset `tail_offset`. The record is searched backwards so that a
    /// trailing comment is skipped. Returns the absolute offset of the record.
    pub fn locate(tail: &[u8], tail_offset: u64) -> Option<u64> {
        if tail.len() < END_RECORD_SIZE {
            return None;
        }
        let magic = signature::END_OF_CENTRAL_DIR.to_le_bytes();
        (0..=tail.len() - END_RECORD_SIZE)
            .rev()
            .find(|&i| {
                if tail[i..i + 4] != magic {
                    return false;
                }
                let comment_len = u16::from_le_bytes([tail[i + 20], tail[i + 21]]) as usize;
                i + END_RECORD_SIZE + comment_len == tail.len()
            })
            .map(|i| tail_offset + i as u64)
    }

    /// Writes this record with an empty comment.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&signature::END_OF_CENTRAL_DIR.to_le_bytes())?;
        w.write_all(&0u16.to_le_bytes())?;
        w.write_all(&0u16.to_le_bytes())?;
        w.write_all(&self.entries.to_le_bytes())?;
        w.write_all(&self.entries.to_le_bytes())?;
        w.write_all(&self.central_dir_size.to_le_bytes())?;
        w.write_all(&self.central_dir_offset.to_le_bytes())?;
        w.write_all(&0u16.to_le_bytes())
    }
}

/// Returns the flags written for an entry named `name`.
pub fn flags_for_name(name: &str) -> u16 {
    if name.is_ascii() { 0 } else { FLAG_UTF8 }
}
