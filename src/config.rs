//! Session configuration.

use std::path::{Path, PathBuf};

use crate::{ResourceLimits, WriteOptions};

/// Configuration for a [`Session`](crate::Session).
///
/// # Example
///
/// ```rust
/// use docpack::{ResourceLimits, SessionConfig, WriteOptions};
/// use docpack::codec::Method;
///
/// let config = SessionConfig::new("/tmp/my-editor")
///     .with_write_options(WriteOptions::new().method(Method::Stored))
///     .with_limits(ResourceLimits::default().max_entries(10_000));
/// assert_eq!(config.scratch_root(), std::path::Path::new("/tmp/my-editor"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Directory under which per-tab workspaces are created.
    pub scratch_root: PathBuf,
    /// Options used when saving.
    pub write: WriteOptions,
    /// Limits applied when opening archives.
    pub limits: ResourceLimits,
}

impl SessionConfig {
    /// Creates a configuration with workspaces under `scratch_root`.
    pub fn new(scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            scratch_root: scratch_root.into(),
            write: WriteOptions::default(),
            limits: ResourceLimits::default(),
        }
    }

    /// Creates a configuration rooted at `<system temp>/docpack-<pid>`.
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir().join(format!("docpack-{}", std::process::id())))
    }

    /// Sets the options used when saving.
    pub fn with_write_options(mut self, write: WriteOptions) -> Self {
        self.write = write;
        self
    }

    /// Sets the limits applied when opening archives.
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Returns the scratch root.
    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }
}
