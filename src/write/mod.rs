//! Container writing API.
//!
//! Entries are compressed in memory and streamed to the sink in the order
//! they are added; the central directory is emitted by
//! [`ContainerWriter::finish`]. Timestamps are fixed, so identical input
//! produces identical bytes.
//!
//! # Example
//!
//! ```rust
//! use docpack::write::ContainerWriter;
//! use docpack::WriteOptions;
//!
//! let mut writer = ContainerWriter::new(Vec::new(), WriteOptions::default());
//! writer.add_bytes("content.json", br#"{"version":1,"content":[]}"#)?;
//! writer.add_directory("assets/")?;
//! let (result, bytes) = writer.finish_into_inner()?;
//! assert_eq!(result.entries_written, 1);
//! assert!(!bytes.is_empty());
//! # Ok::<(), docpack::Error>(())
//! ```

pub(crate) mod options;

pub use options::{WriteOptions, WriteResult};

use std::collections::HashSet;
use std::io::Write;

use crate::checksum::Crc32;
use crate::codec::{self, Method};
use crate::format::records::{
    CENTRAL_HEADER_SIZE, CentralHeader, EndRecord, LOCAL_HEADER_SIZE, flags_for_name,
};
use crate::{Error, Result};

/// State of the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    AcceptingEntries,
    Finished,
}

/// Streams entries into a container.
pub struct ContainerWriter<W: Write> {
    sink: W,
    options: WriteOptions,
    state: WriterState,
    /// Bytes written so far; the next local header's offset.
    position: u64,
    central: Vec<CentralHeader>,
    names: HashSet<String>,
    result: WriteResult,
}

impl<W: Write> std::fmt::Debug for ContainerWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerWriter")
            .field("options", &self.options)
            .field("state", &self.state)
            .field("entries", &self.central.len())
            .finish_non_exhaustive()
    }
}

impl<W: Write> ContainerWriter<W> {
    /// Creates a writer over `sink`.
    pub fn new(sink: W, options: WriteOptions) -> Self {
        Self {
            sink,
            options,
            state: WriterState::AcceptingEntries,
            position: 0,
            central: Vec::new(),
            names: HashSet::new(),
            result: WriteResult::default(),
        }
    }

    /// Returns the options this writer was created with.
    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// Adds a file entry with the given content.
    ///
    /// Empty entries are always stored uncompressed.
    ///
    /// # Errors
    ///
    /// - [`Error::EntryExists`] if an entry with this name was already added
    /// - [`Error::ResourceLimitExceeded`] if the entry or container outgrows
    ///   the format's 32-bit fields
    pub fn add_bytes(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.ensure_accepting()?;
        let method = if data.is_empty() {
            Method::Stored
        } else {
            self.options.method
        };
        let stored = codec::compress(method, self.options.level, data)?;
        self.write_entry(name, method, Crc32::compute(data), data.len() as u64, &stored)?;

        self.result.entries_written += 1;
        self.result.total_size += data.len() as u64;
        self.result.compressed_size += stored.len() as u64;
        log::trace!(
            "Added entry '{}' ({} -> {} bytes, {})",
            name,
            data.len(),
            stored.len(),
            method
        );
        Ok(())
    }

    /// Adds a directory marker. A trailing `/` is appended if missing.
    pub fn add_directory(&mut self, name: &str) -> Result<()> {
        self.ensure_accepting()?;
        let name = if name.ends_with('/') {
            name.to_string()
        } else {
            format!("{}/", name)
        };
        self.write_entry(&name, Method::Stored, 0, 0, &[])?;
        self.result.directories_written += 1;
        Ok(())
    }

    /// Writes the central directory and end record.
    pub fn finish(self) -> Result<WriteResult> {
        self.finish_into_inner().map(|(result, _)| result)
    }

    /// Like [`finish`](Self::finish), but also returns the sink.
    pub fn finish_into_inner(mut self) -> Result<(WriteResult, W)> {
        self.ensure_accepting()?;
        let central_dir_offset = to_u32(self.position, "container")?;
        let entries = u16::try_from(self.central.len()).map_err(|_| {
            Error::ResourceLimitExceeded(format!(
                "{} entries exceed the format maximum of {}",
                self.central.len(),
                u16::MAX
            ))
        })?;

        let mut central_dir_size: u64 = 0;
        for header in &self.central {
            header.write_to(&mut self.sink)?;
            central_dir_size += (CENTRAL_HEADER_SIZE + header.name.len()) as u64;
        }
        EndRecord {
            entries,
            central_dir_size: to_u32(central_dir_size, "central directory")?,
            central_dir_offset,
        }
        .write_to(&mut self.sink)?;
        self.sink.flush()?;
        self.state = WriterState::Finished;

        log::debug!(
            "Finished container: {} entries, {} directories, {} bytes",
            self.result.entries_written,
            self.result.directories_written,
            self.result.total_size
        );
        Ok((self.result, self.sink))
    }

    fn ensure_accepting(&self) -> Result<()> {
        match self.state {
            WriterState::AcceptingEntries => Ok(()),
            WriterState::Finished => Err(Error::InvalidFormat(
                "writer has already been finished".into(),
            )),
        }
    }

    fn write_entry(
        &mut self,
        name: &str,
        method: Method,
        crc32: u32,
        size: u64,
        stored: &[u8],
    ) -> Result<()> {
        if name.is_empty() || name.len() > usize::from(u16::MAX) {
            return Err(Error::InvalidName(format!(
                "entry name must be 1..={} bytes",
                u16::MAX
            )));
        }
        if self.names.contains(name) {
            return Err(Error::EntryExists {
                path: name.to_string(),
            });
        }

        let header = CentralHeader {
            name: name.to_string(),
            flags: flags_for_name(name),
            method: method.id(),
            crc32,
            compressed_size: to_u32(stored.len() as u64, name)?,
            uncompressed_size: to_u32(size, name)?,
            local_header_offset: to_u32(self.position, name)?,
        };

        header.local_header().write_to(&mut self.sink, name)?;
        self.sink.write_all(stored)?;
        self.position += (LOCAL_HEADER_SIZE + name.len() + stored.len()) as u64;

        self.names.insert(header.name.clone());
        self.central.push(header);
        Ok(())
    }
}

fn to_u32(value: u64, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        Error::ResourceLimitExceeded(format!("{} exceeds 4 GiB ({} bytes)", what, value))
    })
}
