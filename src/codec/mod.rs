//! Compression methods for container entries.
//!
//! Only two methods are needed for documents: `Stored` (no compression) and
//! raw `Deflate`. Both decoders are exposed as boxed [`Read`] adapters so
//! the reader can stream entry data through a CRC check.

use std::io::{self, BufRead, Read, Write};

use flate2::Compression;
use flate2::bufread::DeflateDecoder;
use flate2::write::DeflateEncoder;

use crate::format::method_id;
use crate::{Error, Result};

/// Compression method of a container entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    /// No compression.
    Stored,
    /// Raw Deflate (RFC 1951).
    #[default]
    Deflate,
}

impl Method {
    /// Returns the method number written into entry headers.
    pub fn id(self) -> u16 {
        match self {
            Method::Stored => method_id::STORED,
            Method::Deflate => method_id::DEFLATE,
        }
    }

    /// Maps a header method number to a supported method.
    pub fn from_id(id: u16) -> Result<Self> {
        match id {
            method_id::STORED => Ok(Method::Stored),
            method_id::DEFLATE => Ok(Method::Deflate),
            _ => Err(Error::UnsupportedMethod { method: id }),
        }
    }

    /// Returns a human-readable method name.
    pub fn name(self) -> &'static str {
        match self {
            Method::Stored => "Stored",
            Method::Deflate => "Deflate",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Compresses `data` with `method` at `level` (0-9, ignored for `Stored`).
pub fn compress(method: Method, level: u32, data: &[u8]) -> io::Result<Vec<u8>> {
    match method {
        Method::Stored => Ok(data.to_vec()),
        Method::Deflate => {
            let mut encoder = DeflateEncoder::new(
                Vec::with_capacity(data.len() / 2),
                Compression::new(level.min(9)),
            );
            encoder.write_all(data)?;
            encoder.finish()
        }
    }
}

/// Wraps `input` (exactly the stored bytes of one entry) in a decoder.
pub fn decoder<'a, R: BufRead + 'a>(method: Method, input: R) -> Box<dyn Read + 'a> {
    match method {
        Method::Stored => Box::new(input),
        Method::Deflate => Box::new(DeflateDecoder::new(input)),
    }
}
