//! High-level SDK for drivex.
//!
//! [`Drive`] is the entry point: it holds a shared [`RemoteStore`] and a
//! root folder and exposes path-addressed operations over them.
//!
//! ```no_run
//! # async fn demo(store: std::sync::Arc<dyn drivex_sdk::RemoteStore>) -> drivex_sdk::SdkResult<()> {
//! use drivex_sdk::{Drive, DriveOptions, UploadRequest};
//!
//! let drive = Drive::new(store, DriveOptions::default());
//! let request = UploadRequest::from_bytes("r.txt", "text/plain", "hello")
//!     .to_path("/a/b")
//!     .create_path(true);
//! let node = drive.upload(request).await?;
//! assert_eq!(drive.find_path("/a/b/r.txt").await?.id, node.id);
//! # Ok(())
//! # }
//! ```

pub mod drive;
pub mod error;
pub mod identity;
pub mod options;

pub use drive::Drive;
pub use error::{SdkError, SdkResult};
pub use identity::hex_id_from_email;
pub use options::{DriveOptions, APP_DATA_ROOT, APP_DATA_SPACE};

// Re-export key types
pub use drivex_query::{SearchFilter, SearchResult, SearchTerms};
pub use drivex_store::{ByteStream, InMemoryRemoteStore, RemoteStore};
pub use drivex_types::{
    folder_from, name_from, ErrorKind, FolderRef, Node, NodeKind, NodeView, FOLDER_MIME_TYPE,
};
pub use drivex_upload::{Sweep, UploadRequest};
