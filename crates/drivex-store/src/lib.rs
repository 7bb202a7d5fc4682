//! Remote object store interface for drivex.
//!
//! drivex never talks to a store directly; every remote call goes through the
//! [`RemoteStore`] trait. The trait mirrors the store's own operations
//! (list/get/create/update/delete/export plus the resumable upload session)
//! and does not interpret paths.
//!
//! # Backends
//!
//! - [`InMemoryRemoteStore`] -- `HashMap`-based store for tests and embedding.
//!   It evaluates the same query language the search layer produces.
//! - `drivex-http` provides the REST backend.
//!
//! # Design Rules
//!
//! 1. No retries at this layer; every failure is returned to the caller.
//! 2. Failure messages are translated into [`StoreError`] kinds in exactly one
//!    place, [`StoreError::from_api_message`].
//! 3. Content is moved as [`ByteStream`]s; nothing buffers a whole payload
//!    unless the backend itself must.

pub mod error;
pub mod handle;
pub mod memory;
pub mod query;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use handle::StoreHandle;
pub use memory::{InMemoryRemoteStore, StoreOp, NATIVE_DOC_MIME_TYPE};
pub use traits::{ByteStream, ListRequest, RemoteStore};
