//! Per-tab scratch directories holding materialized assets.
//!
//! Each open tab owns at most one directory, `<root>/<tab>`, created the
//! first time an asset needs to live on disk and removed when the tab is
//! closed. The manager never reads ambient state; its root is fixed at
//! construction.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::asset_name::validate_segment;
use crate::{AssetName, Error, Result};

/// An opaque tab identifier, valid as a single directory name.
///
/// ```
/// use docpack::TabId;
///
/// assert!(TabId::new("tab-1").is_ok());
/// assert!(TabId::new("..").is_err());
/// assert!(TabId::new("a/b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TabId(String);

impl TabId {
    /// Creates a tab identifier, validating it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if `s` is empty, contains a path
    /// separator or NUL, or is `.` or `..`.
    pub fn new(s: &str) -> Result<Self> {
        validate_segment(s)?;
        Ok(Self(s.to_string()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TabId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for TabId {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Owns the lifecycle of per-tab workspace directories.
///
/// Methods take `&self`; the registry is behind a mutex so one manager can
/// be shared between threads. Calls for the same tab are expected to be
/// issued in order by the caller.
#[derive(Debug)]
pub struct WorkspaceManager {
    root: PathBuf,
    registry: Mutex<HashMap<TabId, PathBuf>>,
}

impl WorkspaceManager {
    /// Creates a manager whose workspaces live under `root`.
    ///
    /// Nothing is created on disk until a workspace is first needed.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            registry: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the scratch root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the directory `tab` uses, whether or not it exists yet.
    pub fn path_for(&self, tab: &TabId) -> PathBuf {
        self.root.join(tab.as_str())
    }

    fn lock_registry(&self) -> MutexGuard<'_, HashMap<TabId, PathBuf>> {
        self.registry.lock().unwrap_or_else(|poisoned| {
            log::warn!("Workspace registry mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Returns the workspace of `tab`, creating it on first use.
    ///
    /// Repeated calls return the same path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Workspace`] if the directory cannot be created.
    pub fn get_or_create(&self, tab: &TabId) -> Result<PathBuf> {
        if let Some(path) = self.get(tab) {
            if path.is_dir() {
                return Ok(path);
            }
        }

        // Created outside the registry lock.
        let path = self.path_for(tab);
        fs::create_dir_all(&path).map_err(|e| Error::workspace(&path, e))?;
        log::debug!("Created workspace {} for tab {}", path.display(), tab);
        self.lock_registry().insert(tab.clone(), path.clone());
        Ok(path)
    }

    /// Returns the registered workspace of `tab` without creating it.
    pub fn get(&self, tab: &TabId) -> Option<PathBuf> {
        self.lock_registry().get(tab).cloned()
    }

    /// Reads the named assets from the workspace of `tab`.
    ///
    /// Names that are invalid, missing or unreadable are left out of the
    /// result, as is everything when the tab has no workspace.
    pub fn read_assets<S: AsRef<str>>(
        &self,
        tab: &TabId,
        filenames: &[S],
    ) -> HashMap<String, Vec<u8>> {
        let Some(dir) = self.get(tab) else {
            return HashMap::new();
        };
        filenames
            .iter()
            .map(|s| s.as_ref())
            .filter_map(|filename| {
                let name = AssetName::new(filename).ok()?;
                match fs::read(dir.join(name.as_str())) {
                    Ok(data) => Some((filename.to_string(), data)),
                    Err(e) => {
                        if e.kind() != io::ErrorKind::NotFound {
                            log::warn!("Failed to read asset '{}': {}", filename, e);
                        }
                        None
                    }
                }
            })
            .collect()
    }

    /// Writes assets into the workspace of `tab`, creating it if needed.
    ///
    /// Returns the paths of the assets that were written; names that are
    /// invalid or fail to write are logged and left out.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Workspace`] if the workspace cannot be created.
    pub fn write_assets(
        &self,
        tab: &TabId,
        assets: &HashMap<String, Vec<u8>>,
    ) -> Result<BTreeMap<String, PathBuf>> {
        let dir = self.get_or_create(tab)?;
        let mut written = BTreeMap::new();
        for (filename, data) in assets {
            let name = match AssetName::new(filename) {
                Ok(name) => name,
                Err(e) => {
                    log::warn!("Skipping asset '{}': {}", filename, e);
                    continue;
                }
            };
            let path = dir.join(name.as_str());
            match fs::write(&path, data) {
                Ok(()) => {
                    written.insert(filename.clone(), path);
                }
                Err(e) => log::warn!("Failed to write asset '{}': {}", filename, e),
            }
        }
        Ok(written)
    }

    /// Writes one asset into the workspace of `tab`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Workspace`] if the workspace cannot be created, or
    /// [`Error::Asset`] if the file cannot be written.
    pub fn write_asset(&self, tab: &TabId, name: &AssetName, data: &[u8]) -> Result<PathBuf> {
        let path = self.get_or_create(tab)?.join(name.as_str());
        fs::write(&path, data).map_err(|e| Error::asset(name.as_str(), e))?;
        Ok(path)
    }

    /// Returns the path of an existing asset file in the workspace of `tab`.
    pub fn resolve(&self, tab: &TabId, filename: &str) -> Option<PathBuf> {
        let name = AssetName::new(filename).ok()?;
        let path = self.get(tab)?.join(name.as_str());
        path.is_file().then_some(path)
    }

    /// Removes the workspace of `tab` and everything in it.
    ///
    /// Always returns `true`: closing a tab without a workspace is a no-op
    /// and cleanup failures are logged rather than reported.
    pub fn close(&self, tab: &TabId) -> bool {
        let path = self
            .lock_registry()
            .remove(tab)
            .unwrap_or_else(|| self.path_for(tab));
        match fs::remove_dir_all(&path) {
            Ok(()) => log::debug!("Removed workspace {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove workspace {}: {}", path.display(), e),
        }
        true
    }

    /// Closes every registered workspace.
    pub fn close_all(&self) {
        for tab in self.open_tabs() {
            self.close(&tab);
        }
    }

    /// Returns `true` if `tab` has a registered workspace.
    pub fn is_open(&self, tab: &TabId) -> bool {
        self.lock_registry().contains_key(tab)
    }

    /// Returns the tabs with registered workspaces, sorted.
    pub fn open_tabs(&self) -> Vec<TabId> {
        let mut tabs: Vec<_> = self.lock_registry().keys().cloned().collect();
        tabs.sort();
        tabs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab(s: &str) -> TabId {
        TabId::new(s).unwrap()
    }

    #[test]
    fn test_tab_id_validation() {
        assert!(TabId::new("").is_err());
        assert!(TabId::new(".").is_err());
        assert!(TabId::new("a\\b").is_err());
        assert!(TabId::new("a\0b").is_err());
        assert_eq!(TabId::try_from("ok").unwrap().to_string(), "ok");
    }

    #[test]
    fn test_lazy_creation() {
        let dir = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(dir.path().join("scratch"));
        assert!(!manager.root().exists());
        assert!(!manager.is_open(&tab("a")));

        let path = manager.get_or_create(&tab("a")).unwrap();
        assert_eq!(path, dir.path().join("scratch").join("a"));
        assert!(path.is_dir());
        assert!(manager.is_open(&tab("a")));
    }

    #[test]
    fn test_recreated_after_external_removal() {
        let dir = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(dir.path());
        let path = manager.get_or_create(&tab("a")).unwrap();
        fs::remove_dir_all(&path).unwrap();
        assert_eq!(manager.get_or_create(&tab("a")).unwrap(), path);
        assert!(path.is_dir());
    }

    #[test]
    fn test_concurrent_get_or_create() {
        let dir = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(dir.path());
        let tabs: Vec<TabId> = (0..8)
            .map(|i| TabId::new(&format!("tab-{}", i % 4)).unwrap())
            .collect();

        let shared = &manager;
        let paths: Vec<PathBuf> = std::thread::scope(|scope| {
            let handles: Vec<_> = tabs
                .iter()
                .map(|tab| scope.spawn(move || shared.get_or_create(tab).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for (tab, path) in tabs.iter().zip(&paths) {
            assert_eq!(path, &manager.path_for(tab));
            assert!(path.is_dir());
        }
        assert_eq!(manager.open_tabs().len(), 4);
    }

    #[test]
    fn test_write_asset_and_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(dir.path());
        let name = AssetName::new("a.png").unwrap();
        let path = manager.write_asset(&tab("t"), &name, b"png").unwrap();

        assert_eq!(manager.resolve(&tab("t"), "a.png"), Some(path));
        assert_eq!(manager.resolve(&tab("t"), "b.png"), None);
        assert_eq!(manager.resolve(&tab("other"), "a.png"), None);
        assert_eq!(manager.resolve(&tab("t"), "../t/a.png"), None);
    }

    #[test]
    fn test_write_assets_skips_invalid_names() {
        let dir = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(dir.path());
        let assets = HashMap::from([
            ("good.png".to_string(), b"1".to_vec()),
            ("../bad.png".to_string(), b"2".to_vec()),
        ]);
        let written = manager.write_assets(&tab("t"), &assets).unwrap();
        assert_eq!(written.len(), 1);
        assert!(written.contains_key("good.png"));
        assert!(!dir.path().join("bad.png").exists());
    }

    #[test]
    fn test_read_assets_unknown_tab() {
        let dir = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(dir.path());
        assert!(manager.read_assets(&tab("nope"), &["a.png"]).is_empty());
    }

    #[test]
    fn test_close_never_opened() {
        let dir = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(dir.path());
        assert!(manager.close(&tab("never")));
    }

    #[test]
    fn test_close_all() {
        let dir = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(dir.path());
        let a = manager.get_or_create(&tab("a")).unwrap();
        let b = manager.get_or_create(&tab("b")).unwrap();
        assert_eq!(manager.open_tabs(), vec![tab("a"), tab("b")]);

        manager.close_all();
        assert!(!a.exists());
        assert!(!b.exists());
        assert!(manager.open_tabs().is_empty());
    }

    #[test]
    fn test_workspace_creation_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"not a directory").unwrap();

        let manager = WorkspaceManager::new(&blocker);
        let err = manager.get_or_create(&tab("t")).unwrap_err();
        assert!(matches!(err, Error::Workspace { .. }));
    }
}
