//! Async document archive API.
//!
//! The codec is synchronous; these wrappers read archives with
//! `tokio::fs` and run the decoding and encoding on Tokio's blocking pool.
//!
//! # Example
//!
//! ```rust,no_run
//! use docpack::async_bundle;
//!
//! #[tokio::main]
//! async fn main() -> docpack::Result<()> {
//!     let decoded = async_bundle::decode("notes.dpk").await?;
//!     println!("{} items", decoded.content.len());
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::bundle::{self, Decoded, ExtractResult, SaveReport};
use crate::document::ContentItem;
use crate::{Error, Result, WriteOptions};

/// Runs `f` on the blocking pool.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))?
}

/// Decodes the archive at `path`.
pub async fn decode(path: impl AsRef<Path>) -> Result<Decoded> {
    let data = tokio::fs::read(path.as_ref()).await?;
    decode_bytes(data).await
}

/// Decodes an archive held in memory.
pub async fn decode_bytes(data: Vec<u8>) -> Result<Decoded> {
    blocking(move || bundle::decode_reader(Cursor::new(data))).await
}

/// Reads an archive from `reader` to its end and decodes it.
pub async fn decode_reader<R: AsyncRead + Unpin>(mut reader: R) -> Result<Decoded> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data).await?;
    decode_bytes(data).await
}

/// Extracts the assets of the archive at `path` into `dest`.
pub async fn extract_assets(
    path: impl Into<PathBuf>,
    dest: impl Into<PathBuf>,
) -> Result<ExtractResult> {
    let path = path.into();
    let dest = dest.into();
    blocking(move || bundle::extract_assets(&path, &dest)).await
}

/// Encodes `content` and writes it to `path` atomically.
pub async fn encode_to_path(
    path: impl Into<PathBuf>,
    content: Vec<ContentItem>,
    assets: HashMap<String, Vec<u8>>,
    options: WriteOptions,
) -> Result<SaveReport> {
    let path = path.into();
    blocking(move || bundle::encode_to_path(&path, &content, &assets, &options)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_decode_bytes() {
        let encoded = bundle::encode(
            &[ContentItem::text("async")],
            &HashMap::new(),
            &WriteOptions::default(),
        )
        .unwrap();
        let decoded = decode_bytes(encoded.bytes).await.unwrap();
        assert_eq!(decoded.content, vec![ContentItem::text("async")]);
    }

    #[tokio::test]
    async fn test_decode_garbage() {
        let err = decode_reader(&b"nope"[..]).await.unwrap_err();
        assert!(err.is_format_error());
    }
}
