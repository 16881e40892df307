//! Translation between archive asset names and renderable workspace paths.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::bundle::{self, SaveReport};
use crate::document::ContentItem;
use crate::workspace::{TabId, WorkspaceManager};
use crate::write::WriteOptions;
use crate::{AssetName, ResourceLimits, Result};

/// Moves assets between archives and tab workspaces.
#[derive(Debug, Clone, Copy)]
pub struct AssetResolver<'a> {
    workspaces: &'a WorkspaceManager,
    limits: ResourceLimits,
}

impl<'a> AssetResolver<'a> {
    /// Creates a resolver over `workspaces` with default resource limits.
    pub fn new(workspaces: &'a WorkspaceManager) -> Self {
        Self {
            workspaces,
            limits: ResourceLimits::default(),
        }
    }

    /// Sets the limits applied when reading archives.
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Decodes the archive at `path` and materializes its assets in the
    /// workspace of `tab`.
    ///
    /// Each image gets the render path of its extracted asset; images whose
    /// asset is absent keep `None`.
    pub fn open(&self, tab: &TabId, path: &Path) -> Result<Vec<ContentItem>> {
        let decoded = bundle::decode_with_limits(path, self.limits)?;
        let dir = self.workspaces.get_or_create(tab)?;
        let extracted = bundle::extract_assets_with_limits(path, &dir, self.limits)?;

        let mut content = decoded.content;
        for item in &mut content {
            if let ContentItem::Image {
                filename,
                render_path,
            } = item
            {
                *render_path = extracted.assets.get(filename.as_str()).cloned();
                if render_path.is_none() {
                    log::warn!("Image '{}' has no asset in {}", filename, path.display());
                }
            }
        }
        Ok(content)
    }

    /// Stores pasted image bytes in the workspace of `tab` and returns the
    /// image item referencing them.
    pub fn paste(&self, tab: &TabId, data: &[u8], hint: Option<&str>) -> Result<ContentItem> {
        let name = AssetName::for_content(data, hint);
        let path = self.workspaces.write_asset(tab, &name, data)?;
        log::debug!("Pasted {} bytes as {}", data.len(), name);
        Ok(ContentItem::Image {
            filename: name.as_str().to_string(),
            render_path: Some(path),
        })
    }

    /// Gathers the bytes of every image in `content` and writes the archive
    /// to `path`.
    ///
    /// Bytes come from the workspace of `tab`, falling back to the item's
    /// render path. Images with no readable bytes are skipped with a
    /// warning in the report.
    pub fn save(
        &self,
        tab: &TabId,
        content: &[ContentItem],
        path: &Path,
        options: &WriteOptions,
    ) -> Result<SaveReport> {
        let filenames: Vec<&str> = content.iter().filter_map(ContentItem::filename).collect();
        let mut assets = self.workspaces.read_assets(tab, filenames.as_slice());

        for item in content {
            let (Some(filename), Some(render_path)) = (item.filename(), item.render_path()) else {
                continue;
            };
            if assets.contains_key(filename) {
                continue;
            }
            match fs::read(render_path) {
                Ok(data) => {
                    assets.insert(filename.to_string(), data);
                }
                Err(e) => log::debug!("No bytes at {}: {}", render_path.display(), e),
            }
        }

        bundle::encode_to_path(path, content, &assets, options)
    }

    /// Returns the render paths of the images in `content`, keyed by filename.
    pub fn render_map(content: &[ContentItem]) -> HashMap<String, PathBuf> {
        content
            .iter()
            .filter_map(|item| {
                Some((item.filename()?.to_string(), item.render_path()?.to_path_buf()))
            })
            .collect()
    }
}
