//! The `content.json` manifest.

use serde::{Deserialize, Serialize};

use crate::document::ContentItem;
use crate::format::MANIFEST_VERSION;
use crate::{Error, Result};

#[derive(Serialize)]
struct ManifestOut<'a> {
    version: u32,
    content: &'a [ContentItem],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ManifestIn {
    Versioned {
        version: u32,
        content: Vec<ContentItem>,
    },
    Legacy(Vec<ContentItem>),
}

/// Serializes `content` as a versioned manifest.
pub(crate) fn to_bytes(content: &[ContentItem]) -> Result<Vec<u8>> {
    let manifest = ManifestOut {
        version: MANIFEST_VERSION,
        content,
    };
    Ok(serde_json::to_vec_pretty(&manifest)?)
}

/// Parses a manifest, accepting both the versioned object and a bare array.
pub(crate) fn from_bytes(data: &[u8]) -> Result<Vec<ContentItem>> {
    match serde_json::from_slice(data)? {
        ManifestIn::Versioned { version, content } => {
            if version > MANIFEST_VERSION {
                return Err(Error::UnsupportedManifestVersion { version });
            }
            Ok(content)
        }
        ManifestIn::Legacy(content) => Ok(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versioned() {
        let content = vec![ContentItem::text("a"), ContentItem::image("b.png")];
        let bytes = to_bytes(&content).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["content"][1]["type"], "image");
        assert_eq!(from_bytes(&bytes).unwrap(), content);
    }

    #[test]
    fn test_legacy_array() {
        let items = from_bytes(br#"[{"type":"text","value":"old"}]"#).unwrap();
        assert_eq!(items, vec![ContentItem::text("old")]);
    }

    #[test]
    fn test_future_version_rejected() {
        let err = from_bytes(br#"{"version":2,"content":[]}"#).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedManifestVersion { version: 2 }
        ));
        assert!(err.is_format_error());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(from_bytes(b"not json"), Err(Error::Manifest(_))));
        assert!(matches!(
            from_bytes(br#"[{"type":"video","src":"x"}]"#),
            Err(Error::Manifest(_))
        ));
    }
}
