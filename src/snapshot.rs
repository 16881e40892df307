//! Content snapshots and modification detection.
//!
//! A [`Snapshot`] is the serialized form of a content sequence at a point in
//! time. Comparison is exact: item order, variant and value all count.
//! Render paths are not part of the serialized form and never count.

use std::fmt;

use crate::Result;
use crate::document::ContentItem;

/// Serialized form of the empty content sequence.
const EMPTY: &str = "[]";

/// An immutable serialized baseline of a content sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Snapshot(String);

impl Snapshot {
    /// Captures the current state of `content`.
    pub fn capture(content: &[ContentItem]) -> Result<Self> {
        Ok(Self(serde_json::to_string(content)?))
    }

    /// Returns the snapshot of the empty sequence.
    pub fn empty() -> Self {
        Self(EMPTY.to_string())
    }

    /// Returns `true` if `content` serializes to this snapshot.
    pub fn matches(&self, content: &[ContentItem]) -> bool {
        !is_modified(content, self)
    }

    /// Returns the serialized form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns `true` if `current` differs from `baseline`.
///
/// Content that cannot be serialized is reported as modified.
pub fn is_modified(current: &[ContentItem], baseline: &Snapshot) -> bool {
    match Snapshot::capture(current) {
        Ok(snapshot) => snapshot != *baseline,
        Err(e) => {
            log::warn!("Failed to serialize content for comparison: {}", e);
            true
        }
    }
}
