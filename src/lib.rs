//! # docpack
//!
//! Document archives with embedded images, per-tab asset workspaces, and
//! content-based change tracking.
//!
//! A document is an ordered list of [`ContentItem`]s: runs of text and
//! references to images. It is persisted as a ZIP-compatible archive holding
//! a `content.json` manifest and the image bytes under `assets/`. While a
//! document is open, its images live as ordinary files in a scratch
//! directory owned by its tab, so a renderer can load them by path.
//!
//! ## Quick Start
//!
//! ### Encoding and decoding
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::io::Cursor;
//! use docpack::{ContentItem, WriteOptions, bundle};
//!
//! let content = vec![ContentItem::text("A cat:"), ContentItem::image("cat.png")];
//! let assets = HashMap::from([("cat.png".to_string(), b"\x89PNG...".to_vec())]);
//!
//! let encoded = bundle::encode(&content, &assets, &WriteOptions::default())?;
//! let decoded = bundle::decode_reader(Cursor::new(encoded.bytes))?;
//! assert_eq!(decoded.content, content);
//! # Ok::<(), docpack::Error>(())
//! ```
//!
//! ### Editing session
//!
//! ```rust,no_run
//! use docpack::{Session, SessionConfig};
//!
//! let mut session = Session::new(SessionConfig::in_temp_dir());
//! let tab = session.new_tab();
//! session.document_mut(&tab).unwrap().push_text("Hello");
//! session.paste_image(&tab, &std::fs::read("screenshot.png")?, Some("screenshot.png"))?;
//! assert!(session.is_modified(&tab)?);
//!
//! session.save(&tab, Some("hello.dpk".as_ref()))?;
//! assert!(!session.is_modified(&tab)?);
//! # Ok::<(), docpack::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | Tokio wrappers that run filesystem and codec work on the blocking pool |
//! | `cli` | The `docpack` command-line tool |
//!
//! ## Logging
//!
//! The crate logs through the [`log`](https://docs.rs/log) facade and never
//! installs a logger. Skipped assets and failed cleanups are reported at
//! `warn`; workspace and archive lifecycle events at `debug`.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod asset_name;
pub mod bundle;
pub mod checksum;
pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod format;
mod manifest;
pub mod read;
pub mod resolver;
pub mod safety;
pub mod session;
pub mod snapshot;
pub mod workspace;
pub mod write;

// Async modules (requires "async" feature)
#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub mod async_bundle;

#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub mod async_workspace;

pub use asset_name::AssetName;
pub use error::{Error, Result};

pub use bundle::{AssetWarning, Decoded, EncodeResult, ExtractResult, SaveReport};
pub use config::SessionConfig;
pub use document::{ContentItem, Document};
pub use resolver::AssetResolver;
pub use session::Session;
pub use snapshot::Snapshot;
pub use workspace::{TabId, WorkspaceManager};

// Re-export container API at crate root for convenience
pub use read::{Container, Entry, VerifyResult};
pub use safety::ResourceLimits;
pub use write::{ContainerWriter, WriteOptions, WriteResult};

#[cfg(feature = "async")]
pub use async_workspace::AsyncWorkspaceManager;
