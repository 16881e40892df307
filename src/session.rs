//! Open documents and the tabs that own them.
//!
//! A [`Session`] ties together the documents a user has open, their
//! workspaces, and the save/load paths that move a document's baseline.
//!
//! # Example
//!
//! ```rust,no_run
//! use docpack::{Session, SessionConfig};
//!
//! let mut session = Session::new(SessionConfig::in_temp_dir());
//! let tab = session.open("notes.dpk")?;
//! assert!(!session.is_modified(&tab)?);
//!
//! session.document_mut(&tab).unwrap().push_text("more");
//! assert!(session.is_modified(&tab)?);
//!
//! session.save(&tab, None)?;
//! assert!(!session.is_modified(&tab)?);
//! session.close(&tab);
//! # Ok::<(), docpack::Error>(())
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::bundle::SaveReport;
use crate::config::SessionConfig;
use crate::document::{ContentItem, Document};
use crate::resolver::AssetResolver;
use crate::snapshot::Snapshot;
use crate::workspace::{TabId, WorkspaceManager};
use crate::{Error, Result};

/// The set of open documents.
///
/// Dropping a session removes every workspace it created.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    workspaces: WorkspaceManager,
    documents: HashMap<TabId, Document>,
    /// Tabs in the order they were opened.
    order: Vec<TabId>,
    active: Option<TabId>,
    next_id: u64,
}

impl Session {
    /// Creates an empty session.
    pub fn new(config: SessionConfig) -> Self {
        let workspaces = WorkspaceManager::new(config.scratch_root.clone());
        Self {
            config,
            workspaces,
            documents: HashMap::new(),
            order: Vec::new(),
            active: None,
            next_id: 1,
        }
    }

    /// Returns the session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the workspace manager.
    pub fn workspaces(&self) -> &WorkspaceManager {
        &self.workspaces
    }

    fn resolver(&self) -> AssetResolver<'_> {
        AssetResolver::new(&self.workspaces).with_limits(self.config.limits)
    }

    fn generate_tab(&mut self) -> TabId {
        loop {
            let candidate = format!("tab-{}", self.next_id);
            self.next_id += 1;
            // generated names are always valid segments
            if let Ok(tab) = TabId::new(&candidate) {
                if !self.documents.contains_key(&tab) {
                    return tab;
                }
            }
        }
    }

    fn insert(&mut self, document: Document) -> TabId {
        let tab = document.tab().clone();
        if self.documents.insert(tab.clone(), document).is_none() {
            self.order.push(tab.clone());
        }
        self.active = Some(tab.clone());
        tab
    }

    /// Opens an empty draft in a new tab and activates it.
    pub fn new_tab(&mut self) -> TabId {
        let tab = self.generate_tab();
        self.insert(Document::new(tab.clone()))
    }

    /// Opens the archive at `path` in a new tab and activates it.
    ///
    /// # Errors
    ///
    /// Format errors leave the session unchanged.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<TabId> {
        let tab = self.generate_tab();
        self.open_in(&tab, path)?;
        Ok(tab)
    }

    /// Opens the archive at `path` in `tab`, replacing any document there.
    pub fn open_in(&mut self, tab: &TabId, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let is_new = !self.documents.contains_key(tab);

        let content = match self.resolver().open(tab, path) {
            Ok(content) => content,
            Err(e) => {
                if is_new {
                    self.workspaces.close(tab);
                }
                return Err(e);
            }
        };

        let document = Document::loaded(tab.clone(), path.to_path_buf(), content)?;
        log::debug!("Opened {} in {}", path.display(), tab);
        self.insert(document);
        Ok(())
    }

    /// Saves the document in `tab` to `path`, or to its current path.
    ///
    /// On success the document's path and baseline are updated.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownTab`] if `tab` is not open
    /// - [`Error::NoSavePath`] if no path is given and the document has none
    pub fn save(&mut self, tab: &TabId, path: Option<&Path>) -> Result<SaveReport> {
        let document = self
            .documents
            .get(tab)
            .ok_or_else(|| Error::UnknownTab(tab.to_string()))?;
        let dest: PathBuf = path
            .or_else(|| document.path())
            .ok_or(Error::NoSavePath)?
            .to_path_buf();

        let report = self
            .resolver()
            .save(tab, document.content(), &dest, &self.config.write)?;
        let saved = Snapshot::capture(document.content())?;

        if let Some(document) = self.documents.get_mut(tab) {
            document.mark_saved(dest, saved);
        }
        Ok(report)
    }

    /// Closes `tab` and removes its workspace.
    ///
    /// Always returns `true`. If `tab` was active, the most recently opened
    /// remaining tab becomes active.
    pub fn close(&mut self, tab: &TabId) -> bool {
        self.documents.remove(tab);
        self.order.retain(|t| t != tab);
        if self.active.as_ref() == Some(tab) {
            self.active = self.order.last().cloned();
        }
        self.workspaces.close(tab)
    }

    /// Stores pasted image bytes in the workspace of `tab` and appends the
    /// image to its document.
    pub fn paste_image(
        &mut self,
        tab: &TabId,
        data: &[u8],
        hint: Option<&str>,
    ) -> Result<ContentItem> {
        if !self.documents.contains_key(tab) {
            return Err(Error::UnknownTab(tab.to_string()));
        }
        let item = self.resolver().paste(tab, data, hint)?;
        if let Some(document) = self.documents.get_mut(tab) {
            document.push(item.clone());
        }
        Ok(item)
    }

    /// Makes `tab` the active tab.
    pub fn activate(&mut self, tab: &TabId) -> Result<()> {
        if !self.documents.contains_key(tab) {
            return Err(Error::UnknownTab(tab.to_string()));
        }
        self.active = Some(tab.clone());
        Ok(())
    }

    /// Returns the active tab.
    pub fn active(&self) -> Option<&TabId> {
        self.active.as_ref()
    }

    /// Returns the document open in `tab`.
    pub fn document(&self, tab: &TabId) -> Option<&Document> {
        self.documents.get(tab)
    }

    /// Returns the document open in `tab` for editing.
    pub fn document_mut(&mut self, tab: &TabId) -> Option<&mut Document> {
        self.documents.get_mut(tab)
    }

    /// Returns whether the document in `tab` has unsaved changes.
    pub fn is_modified(&self, tab: &TabId) -> Result<bool> {
        self.documents
            .get(tab)
            .map(Document::is_modified)
            .ok_or_else(|| Error::UnknownTab(tab.to_string()))
    }

    /// Returns the render path of every resolved image in `tab`, keyed by
    /// filename.
    pub fn render_map(&self, tab: &TabId) -> Result<HashMap<String, PathBuf>> {
        self.documents
            .get(tab)
            .map(|document| AssetResolver::render_map(document.content()))
            .ok_or_else(|| Error::UnknownTab(tab.to_string()))
    }

    /// Returns the open tabs in the order they were opened.
    pub fn tabs(&self) -> &[TabId] {
        &self.order
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.workspaces.close_all();
    }
}
