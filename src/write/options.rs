//! Write options and results for container creation.

use crate::codec::Method;

/// Options for writing a container.
///
/// # Example
///
/// ```rust
/// use docpack::WriteOptions;
/// use docpack::codec::Method;
///
/// let options = WriteOptions::new().method(Method::Stored);
/// let options = WriteOptions::new().level(9)?;
/// # Ok::<(), docpack::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Compression method for non-empty entries.
    pub method: Method,
    /// Compression level (0-9).
    pub level: u32,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            method: Method::Deflate,
            level: 6,
        }
    }
}

impl WriteOptions {
    /// Creates default write options (deflate, level 6).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the compression method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the compression level.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCompressionLevel`] if level is greater than 9.
    ///
    /// [`Error::InvalidCompressionLevel`]: crate::Error::InvalidCompressionLevel
    pub fn level(mut self, level: u32) -> crate::Result<Self> {
        if level > 9 {
            return Err(crate::Error::InvalidCompressionLevel { level });
        }
        self.level = level;
        Ok(self)
    }
}

/// Result of writing a container.
#[must_use = "write results should be checked to ensure the container was written"]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteResult {
    /// Number of file entries written.
    pub entries_written: usize,
    /// Number of directory markers written.
    pub directories_written: usize,
    /// Total uncompressed bytes.
    pub total_size: u64,
    /// Total stored bytes.
    pub compressed_size: u64,
}

impl WriteResult {
    /// Returns the compression ratio (compressed / uncompressed).
    pub fn compression_ratio(&self) -> f64 {
        if self.total_size == 0 {
            1.0
        } else {
            self.compressed_size as f64 / self.total_size as f64
        }
    }
}
