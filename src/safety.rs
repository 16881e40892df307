//! Resource limits for reading untrusted archives.
//!
//! Document archives are opened from arbitrary user-chosen files, so the
//! reader refuses containers whose directory or entries are implausibly
//! large before it allocates or decompresses anything.

use crate::{Error, Result};

/// Limits enforced while opening and reading a container.
///
/// # Examples
///
/// ```rust
/// use docpack::ResourceLimits;
///
/// let limits = ResourceLimits::default()
///     .max_entries(1_000)
///     .max_entry_size(16 << 20);
/// assert_eq!(limits.max_entries, 1_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Maximum number of entries in the central directory.
    pub max_entries: usize,
    /// Maximum uncompressed size of a single entry.
    pub max_entry_size: u64,
    /// Maximum uncompressed size of all entries together.
    pub max_total_size: u64,
}

impl Default for ResourceLimits {
    /// Creates resource limits with the following default values:
    ///
    /// | Limit | Default Value |
    /// |-------|---------------|
    /// | `max_entries` | 65,535 |
    /// | `max_entry_size` | 1 GiB |
    /// | `max_total_size` | 4 GiB |
    fn default() -> Self {
        Self {
            max_entries: u16::MAX as usize,
            max_entry_size: 1 << 30,
            max_total_size: 4 << 30,
        }
    }
}

impl ResourceLimits {
    /// Creates new resource limits with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates resource limits with no restrictions.
    pub fn unlimited() -> Self {
        Self {
            max_entries: usize::MAX,
            max_entry_size: u64::MAX,
            max_total_size: u64::MAX,
        }
    }

    /// Sets the maximum number of entries.
    pub fn max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    /// Sets the maximum size of a single entry.
    pub fn max_entry_size(mut self, max: u64) -> Self {
        self.max_entry_size = max;
        self
    }

    /// Sets the maximum total size of all entries.
    pub fn max_total_size(mut self, max: u64) -> Self {
        self.max_total_size = max;
        self
    }

    /// Checks the entry count of a central directory.
    pub(crate) fn check_entries(&self, count: usize) -> Result<()> {
        if count > self.max_entries {
            return Err(Error::ResourceLimitExceeded(format!(
                "archive has {} entries, limit is {}",
                count, self.max_entries
            )));
        }
        Ok(())
    }

    /// Checks one entry's declared size and the running total.
    pub(crate) fn check_entry(&self, name: &str, size: u64, running_total: u64) -> Result<()> {
        if size > self.max_entry_size {
            return Err(Error::ResourceLimitExceeded(format!(
                "entry '{}' is {} bytes, limit is {}",
                name, size, self.max_entry_size
            )));
        }
        if running_total > self.max_total_size {
            return Err(Error::ResourceLimitExceeded(format!(
                "archive expands to {} bytes, limit is {}",
                running_total, self.max_total_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let limits = ResourceLimits::default();
        assert_eq!(limits.max_entries, 65_535);
        assert!(limits.check_entries(10).is_ok());
        assert!(limits.check_entry("a", 1024, 1024).is_ok());
    }

    #[test]
    fn test_entry_count_limit() {
        let limits = ResourceLimits::new().max_entries(2);
        assert!(limits.check_entries(2).is_ok());
        assert!(matches!(
            limits.check_entries(3),
            Err(Error::ResourceLimitExceeded(_))
        ));
    }

    #[test]
    fn test_entry_size_and_total_limits() {
        let limits = ResourceLimits::new().max_entry_size(10).max_total_size(15);
        assert!(limits.check_entry("a", 10, 10).is_ok());
        assert!(limits.check_entry("b", 11, 11).is_err());
        assert!(limits.check_entry("c", 8, 18).is_err());
    }

    #[test]
    fn test_unlimited() {
        let limits = ResourceLimits::unlimited();
        assert!(limits.check_entries(usize::MAX).is_ok());
        assert!(limits.check_entry("a", u64::MAX, u64::MAX).is_ok());
    }
}
