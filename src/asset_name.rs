//! Validated asset filenames and generated names for pasted images.

use std::fmt;

use crate::checksum::content_digest;
use crate::format::ASSET_PREFIX;
use crate::{Error, Result};

/// Maximum length for an asset filename (in bytes).
///
/// Matches the common `NAME_MAX` of 255 so a valid name can always be
/// materialized as a single file in a workspace directory.
const MAX_NAME_LENGTH: usize = 255;

/// Windows reserved device names that cannot be used as filenames.
///
/// Only rejected on Windows, where such a file cannot be created. Elsewhere
/// `aux.png` is an ordinary filename and must survive a save.
const WINDOWS_RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Number of hex digits of the content digest used in generated names.
const DIGEST_HEX_LEN: usize = 16;

/// Image extensions accepted from a filename hint.
const KNOWN_EXTENSIONS: &[&str] = &["png", "jpg", "gif", "webp", "bmp", "svg", "tiff"];

/// Checks if a filename is a Windows reserved name.
///
/// Reserved names are case-insensitive and also reserved when followed by
/// an extension (e.g., "CON.png").
fn is_windows_reserved(name: &str) -> bool {
    let base = match name.find('.') {
        Some(pos) => &name[..pos],
        None => name,
    };

    WINDOWS_RESERVED_NAMES
        .iter()
        .any(|reserved| base.eq_ignore_ascii_case(reserved))
}

/// Validates that `s` can be used as a single path segment.
///
/// Shared by [`AssetName`] and [`TabId`](crate::workspace::TabId): both end
/// up as one component under a directory the caller controls.
pub(crate) fn validate_segment(s: &str) -> Result<()> {
    if s.is_empty() {
        return Err(Error::InvalidName("empty name".into()));
    }
    if s.contains('\0') {
        return Err(Error::InvalidName("contains NUL byte".into()));
    }
    if s.len() > MAX_NAME_LENGTH {
        return Err(Error::InvalidName(format!(
            "name exceeds maximum length of {} bytes",
            MAX_NAME_LENGTH
        )));
    }
    if s.contains('/') || s.contains('\\') {
        return Err(Error::InvalidName(format!(
            "'{}' contains a path separator",
            s
        )));
    }
    if s == "." || s == ".." {
        return Err(Error::InvalidName(format!("'{}' is not allowed", s)));
    }
    Ok(())
}

/// A validated asset filename.
///
/// Asset names are the archive-relative logical names of embedded images.
/// They are stored in the archive as `assets/<name>` and materialized in a
/// workspace as `<workspace>/<name>`, so a name must be a single safe path
/// segment:
/// - not empty, at most 255 bytes
/// - no `/`, `\` or NUL
/// - not `.` or `..`
/// - on Windows, not a reserved device name
///
/// # Examples
///
/// ```
/// use docpack::AssetName;
///
/// let name = AssetName::new("diagram.png").unwrap();
/// assert_eq!(name.entry_path(), "assets/diagram.png");
///
/// assert!(AssetName::new("../secret.png").is_err());
/// assert!(AssetName::new("nested/a.png").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetName(String);

impl AssetName {
    /// Creates a new `AssetName`, validating it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if the name is not a safe single
    /// path segment.
    pub fn new(s: &str) -> Result<Self> {
        Self::validate(s)?;
        Ok(Self(s.to_string()))
    }

    fn validate(s: &str) -> Result<()> {
        validate_segment(s)?;
        if cfg!(windows) && is_windows_reserved(s) {
            return Err(Error::InvalidName(format!(
                "Windows reserved filename '{}' not allowed",
                s
            )));
        }
        Ok(())
    }

    /// Parses the asset name out of a container entry path.
    ///
    /// Returns `None` for entries outside the `assets/` namespace, and
    /// `Some(Err(_))` for entries inside it whose remainder is not a valid
    /// asset name (for example nested paths).
    pub fn from_entry_path(entry: &str) -> Option<Result<Self>> {
        entry.strip_prefix(ASSET_PREFIX).map(Self::new)
    }

    /// Generates a collision-resistant name for pasted image bytes.
    ///
    /// The name is `img-<16 hex digits of SHA-256>.<ext>`. Identical bytes
    /// always map to the same name. The extension is taken from `hint` when
    /// it names a known image type, otherwise sniffed from the data, and
    /// falls back to `png`.
    ///
    /// ```
    /// use docpack::AssetName;
    ///
    /// let png = b"\x89PNG\r\n\x1a\n....";
    /// let name = AssetName::for_content(png, None);
    /// assert!(name.as_str().starts_with("img-"));
    /// assert_eq!(name.extension(), Some("png"));
    ///
    /// let again = AssetName::for_content(png, Some("clipboard.PNG"));
    /// assert_eq!(name, again);
    /// ```
    pub fn for_content(data: &[u8], hint: Option<&str>) -> Self {
        let digest = content_digest(data);
        let ext = hint
            .and_then(hint_extension)
            .or_else(|| sniff_extension(data))
            .unwrap_or("png");
        Self(format!("img-{}.{}", &digest[..DIGEST_HEX_LEN], ext))
    }

    /// Returns the name as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the container entry path, `assets/<name>`.
    pub fn entry_path(&self) -> String {
        format!("{}{}", ASSET_PREFIX, self.0)
    }

    /// Returns the file extension, if any.
    ///
    /// A leading dot does not start an extension (`.hidden` has none).
    pub fn extension(&self) -> Option<&str> {
        let dot_pos = self.0.rfind('.')?;
        if dot_pos == 0 {
            None
        } else {
            Some(&self.0[dot_pos + 1..])
        }
    }
}

/// Extracts a lowercase known image extension from a filename hint.
fn hint_extension(hint: &str) -> Option<&'static str> {
    let (_, ext) = hint.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    let ext = if ext == "jpeg" { "jpg".to_string() } else { ext };
    KNOWN_EXTENSIONS.iter().copied().find(|known| *known == ext)
}

/// Detects common image formats from their magic bytes.
fn sniff_extension(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("png")
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg")
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some("gif")
    } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some("webp")
    } else if data.starts_with(b"BM") {
        Some("bmp")
    } else {
        None
    }
}

impl AsRef<str> for AssetName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for AssetName {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for AssetName {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::validate(&s)?;
        Ok(Self(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_simple_name() {
        let name = AssetName::new("photo.jpg").unwrap();
        assert_eq!(name.as_str(), "photo.jpg");
        assert_eq!(name.extension(), Some("jpg"));
    }

    #[test]
    fn test_valid_unicode() {
        let name = AssetName::new("снимок.png").unwrap();
        assert_eq!(name.entry_path(), "assets/снимок.png");
    }

    #[test]
    fn test_invalid_names() {
        for bad in ["", ".", "..", "a/b.png", "a\\b.png", "nul\0.png"] {
            let err = AssetName::new(bad).unwrap_err();
            assert!(matches!(err, Error::InvalidName(_)), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_windows_reserved_detection() {
        assert!(is_windows_reserved("CON"));
        assert!(is_windows_reserved("com1.png"));
        assert!(!is_windows_reserved("CONSOLE.png"));
    }

    #[test]
    #[cfg(windows)]
    fn test_windows_reserved_rejected() {
        assert!(AssetName::new("CON").is_err());
        assert!(AssetName::new("com1.png").is_err());
    }

    #[test]
    #[cfg(not(windows))]
    fn test_device_names_are_plain_files_elsewhere() {
        assert_eq!(AssetName::new("aux.png").unwrap().as_str(), "aux.png");
        assert!(AssetName::new("CON").is_ok());
    }

    #[test]
    fn test_too_long() {
        let long = "a".repeat(MAX_NAME_LENGTH + 1);
        assert!(AssetName::new(&long).is_err());
        let max = "a".repeat(MAX_NAME_LENGTH);
        assert!(AssetName::new(&max).is_ok());
    }

    #[test]
    fn test_from_entry_path() {
        let name = AssetName::from_entry_path("assets/a.png").unwrap().unwrap();
        assert_eq!(name.as_str(), "a.png");

        assert!(AssetName::from_entry_path("content.json").is_none());
        assert!(AssetName::from_entry_path("assets/sub/a.png").unwrap().is_err());
    }

    #[test]
    fn test_extension_hidden_file() {
        let name = AssetName::new(".hidden").unwrap();
        assert_eq!(name.extension(), None);
    }

    #[test]
    fn test_for_content_is_deterministic() {
        let a = AssetName::for_content(b"same bytes", None);
        let b = AssetName::for_content(b"same bytes", None);
        let c = AssetName::for_content(b"other bytes", None);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), "img-".len() + DIGEST_HEX_LEN + ".png".len());
    }

    #[test]
    fn test_for_content_extension_sources() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00];
        assert_eq!(AssetName::for_content(&jpeg, None).extension(), Some("jpg"));
        assert_eq!(
            AssetName::for_content(b"GIF89a...", None).extension(),
            Some("gif")
        );
        // Hint wins over sniffing
        assert_eq!(
            AssetName::for_content(&jpeg, Some("shot.WEBP")).extension(),
            Some("webp")
        );
        // Unknown hint extension falls back to sniffing
        assert_eq!(
            AssetName::for_content(&jpeg, Some("clip.exe")).extension(),
            Some("jpg")
        );
        assert_eq!(
            AssetName::for_content(&jpeg, Some("clip.jpeg")).extension(),
            Some("jpg")
        );
        assert_eq!(
            AssetName::for_content(b"unknown", None).extension(),
            Some("png")
        );
    }

    #[test]
    fn test_generated_name_is_valid() {
        let name = AssetName::for_content(b"\x89PNG\r\n\x1a\nrest", Some("x.png"));
        assert!(AssetName::new(name.as_str()).is_ok());
    }
}
