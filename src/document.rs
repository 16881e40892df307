//! Document content model.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::snapshot::{self, Snapshot};
use crate::workspace::TabId;

/// One element of a document.
///
/// The serialized form carries a `type` discriminant:
/// `{"type":"text","value":".."}` or `{"type":"image","filename":".."}`.
/// `render_path` is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentItem {
    /// A run of text.
    Text {
        /// The text.
        value: String,
    },
    /// An embedded image.
    Image {
        /// Archive-relative asset name.
        filename: String,
        /// Workspace path the image is rendered from, while the tab is open.
        #[serde(skip)]
        render_path: Option<PathBuf>,
    },
}

impl ContentItem {
    /// Creates a text item.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
        }
    }

    /// Creates an image item with no render path.
    pub fn image(filename: impl Into<String>) -> Self {
        Self::Image {
            filename: filename.into(),
            render_path: None,
        }
    }

    /// Returns `true` for image items.
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image { .. })
    }

    /// Returns the asset filename of an image item.
    pub fn filename(&self) -> Option<&str> {
        match self {
            Self::Image { filename, .. } => Some(filename),
            Self::Text { .. } => None,
        }
    }

    /// Returns the render path of an image item, if resolved.
    pub fn render_path(&self) -> Option<&Path> {
        match self {
            Self::Image { render_path, .. } => render_path.as_deref(),
            Self::Text { .. } => None,
        }
    }
}

/// An open document: its content, where it is saved, and the baseline it
/// is compared against.
///
/// The modified flag is never stored. [`is_modified`](Self::is_modified)
/// serializes the live content and compares it to the baseline captured at
/// the last load or save.
#[derive(Debug, Clone)]
pub struct Document {
    tab: TabId,
    path: Option<PathBuf>,
    content: Vec<ContentItem>,
    baseline: Snapshot,
}

impl Document {
    /// Creates an empty, unsaved draft.
    pub fn new(tab: TabId) -> Self {
        Self {
            tab,
            path: None,
            content: Vec::new(),
            baseline: Snapshot::empty(),
        }
    }

    /// Creates a document from freshly loaded content; the baseline is
    /// captured from `content`.
    pub(crate) fn loaded(
        tab: TabId,
        path: PathBuf,
        content: Vec<ContentItem>,
    ) -> crate::Result<Self> {
        let baseline = Snapshot::capture(&content)?;
        Ok(Self {
            tab,
            path: Some(path),
            content,
            baseline,
        })
    }

    /// Returns the owning tab.
    pub fn tab(&self) -> &TabId {
        &self.tab
    }

    /// Returns the path the document was loaded from or last saved to.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the file stem of the document path, or `"Untitled"`.
    pub fn title(&self) -> String {
        self.path
            .as_deref()
            .and_then(Path::file_stem)
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".to_string())
    }

    /// Returns the content items in order.
    pub fn content(&self) -> &[ContentItem] {
        &self.content
    }

    /// Returns the content for arbitrary edits.
    pub fn content_mut(&mut self) -> &mut Vec<ContentItem> {
        &mut self.content
    }

    /// Returns the image items in order.
    pub fn images(&self) -> impl Iterator<Item = &ContentItem> {
        self.content.iter().filter(|item| item.is_image())
    }

    /// Appends text, extending the trailing text run if there is one.
    pub fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.content.last_mut() {
            Some(ContentItem::Text { value }) => value.push_str(text),
            _ => self.content.push(ContentItem::text(text)),
        }
    }

    /// Deletes backwards from the end of the document.
    ///
    /// Removes the last character of a trailing text run, dropping the run
    /// once it is empty, or removes a trailing image. Returns `false` if the
    /// document is empty.
    pub fn backspace(&mut self) -> bool {
        let drop_last = match self.content.last_mut() {
            None => return false,
            Some(ContentItem::Text { value }) => {
                value.pop();
                value.is_empty()
            }
            Some(ContentItem::Image { .. }) => true,
        };
        if drop_last {
            self.content.pop();
        }
        true
    }

    /// Inserts an item at `index`, clamped to the end.
    pub fn insert(&mut self, index: usize, item: ContentItem) {
        let index = index.min(self.content.len());
        self.content.insert(index, item);
    }

    /// Appends an item.
    pub fn push(&mut self, item: ContentItem) {
        self.content.push(item);
    }

    /// Removes and returns the item at `index`.
    pub fn remove(&mut self, index: usize) -> Option<ContentItem> {
        (index < self.content.len()).then(|| self.content.remove(index))
    }

    /// Returns `true` if the content differs from the last loaded or saved
    /// state.
    pub fn is_modified(&self) -> bool {
        snapshot::is_modified(&self.content, &self.baseline)
    }

    /// Returns the baseline snapshot.
    pub fn baseline(&self) -> &Snapshot {
        &self.baseline
    }

    /// Records a successful save: the baseline becomes `saved` and the path
    /// becomes `path`.
    pub(crate) fn mark_saved(&mut self, path: PathBuf, saved: Snapshot) {
        self.path = Some(path);
        self.baseline = saved;
    }
}
