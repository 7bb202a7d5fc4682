//! Uploads for drivex.
//!
//! An upload resolves its destination folder, checks for same-named nodes,
//! deletes them when clobbering, negotiates a resumable session, and streams
//! the content while computing an MD5 digest that is checked against the
//! store's checksum.
//!
//! # Key Types
//!
//! - [`UploadRequest`] -- what to upload and where
//! - [`Uploader`] -- the orchestrating state machine
//! - [`UploadDirector`] -- negotiates an [`UploadSession`]
//! - [`StreamUploader`] -- streams content into a session and verifies it
//! - [`DigestStream`] -- MD5 over a byte stream as it passes through
//! - [`Janitor`] -- concurrent batch deletion
//!
//! No step retries. A clobber that deleted the old node is not undone when
//! the following upload fails.

pub mod digest;
pub mod director;
pub mod error;
pub mod janitor;
pub mod orchestrator;
pub mod request;
pub mod streamer;

pub use digest::{DigestHandle, DigestStream};
pub use director::{UploadDirector, UploadSession, UPLOAD_FIELDS};
pub use error::{UploadError, UploadResult};
pub use janitor::{Disposable, Flagged, Janitor, Sweep};
pub use orchestrator::{Stage, Uploader};
pub use request::{Destination, UploadRequest};
pub use streamer::{is_text_mime, StreamUploader};
