//! Foundation types for drivex.
//!
//! drivex addresses a remote hierarchical store (folders containing files)
//! with slash-delimited paths instead of opaque IDs. This crate holds the
//! types shared by every other drivex crate.
//!
//! # Key Types
//!
//! - [`Node`]: one store entry (file or folder) as reported by the store
//! - [`NodeKind`]: folder/file discriminator, always derived from the MIME type
//! - [`NodeMetadata`]: request body for creating a node
//! - [`FolderRef`]: a folder given either as a raw ID or as a folder [`Node`]
//! - [`ErrorKind`]: the caller-facing failure taxonomy shared by all crates

pub mod error;
pub mod folder;
pub mod node;
pub mod path;

pub use error::{ErrorKind, TypeError};
pub use folder::FolderRef;
pub use node::{Node, NodeKind, NodeMetadata, NodeView, FOLDER_MIME_TYPE};
pub use path::{folder_from, name_from, segments};
