//! Async wrapper around [`WorkspaceManager`].

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use crate::async_bundle::blocking;
use crate::document::ContentItem;
use crate::resolver::AssetResolver;
use crate::workspace::{TabId, WorkspaceManager};
use crate::{AssetName, Result};

/// A shareable workspace manager whose filesystem work runs on Tokio's
/// blocking pool.
///
/// Clones share the same registry.
#[derive(Debug, Clone)]
pub struct AsyncWorkspaceManager {
    inner: Arc<WorkspaceManager>,
}

impl AsyncWorkspaceManager {
    /// Creates a manager whose workspaces live under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::from_manager(WorkspaceManager::new(root))
    }

    /// Wraps an existing manager.
    pub fn from_manager(manager: WorkspaceManager) -> Self {
        Self {
            inner: Arc::new(manager),
        }
    }

    /// Returns the wrapped manager.
    pub fn manager(&self) -> &WorkspaceManager {
        &self.inner
    }

    /// See [`WorkspaceManager::get_or_create`].
    pub async fn get_or_create(&self, tab: &TabId) -> Result<PathBuf> {
        let inner = Arc::clone(&self.inner);
        let tab = tab.clone();
        blocking(move || inner.get_or_create(&tab)).await
    }

    /// See [`WorkspaceManager::read_assets`].
    pub async fn read_assets(
        &self,
        tab: &TabId,
        filenames: Vec<String>,
    ) -> Result<HashMap<String, Vec<u8>>> {
        let inner = Arc::clone(&self.inner);
        let tab = tab.clone();
        blocking(move || Ok(inner.read_assets(&tab, filenames.as_slice()))).await
    }

    /// See [`WorkspaceManager::write_assets`].
    pub async fn write_assets(
        &self,
        tab: &TabId,
        assets: HashMap<String, Vec<u8>>,
    ) -> Result<BTreeMap<String, PathBuf>> {
        let inner = Arc::clone(&self.inner);
        let tab = tab.clone();
        blocking(move || inner.write_assets(&tab, &assets)).await
    }

    /// See [`WorkspaceManager::write_asset`].
    pub async fn write_asset(
        &self,
        tab: &TabId,
        name: AssetName,
        data: Vec<u8>,
    ) -> Result<PathBuf> {
        let inner = Arc::clone(&self.inner);
        let tab = tab.clone();
        blocking(move || inner.write_asset(&tab, &name, &data)).await
    }

    /// See [`AssetResolver::paste`].
    pub async fn paste(
        &self,
        tab: &TabId,
        data: Vec<u8>,
        hint: Option<String>,
    ) -> Result<ContentItem> {
        let inner = Arc::clone(&self.inner);
        let tab = tab.clone();
        blocking(move || AssetResolver::new(&inner).paste(&tab, &data, hint.as_deref())).await
    }

    /// See [`AssetResolver::open`].
    pub async fn open(&self, tab: &TabId, path: impl Into<PathBuf>) -> Result<Vec<ContentItem>> {
        let inner = Arc::clone(&self.inner);
        let tab = tab.clone();
        let path = path.into();
        blocking(move || AssetResolver::new(&inner).open(&tab, &path)).await
    }

    /// See [`WorkspaceManager::close`].
    pub async fn close(&self, tab: &TabId) -> bool {
        let inner = Arc::clone(&self.inner);
        let tab = tab.clone();
        blocking(move || Ok(inner.close(&tab))).await.unwrap_or(true)
    }

    /// See [`WorkspaceManager::close_all`].
    pub async fn close_all(&self) -> Result<()> {
        let inner = Arc::clone(&self.inner);
        blocking(move || {
            inner.close_all();
            Ok(())
        })
        .await
    }
}
