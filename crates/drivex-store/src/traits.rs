use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use drivex_types::{Node, NodeMetadata};

use crate::error::StoreResult;

/// A content stream moving between the caller and the store.
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// One page request against the store's search endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListRequest {
    /// Query string in the store's query language.
    pub query: String,
    /// Comma-separated node fields to return.
    pub fields: String,
    pub page_size: usize,
    /// Comma-separated sort keys, each optionally followed by `desc`.
    pub order_by: String,
    /// Store space to search (`drive`, `appDataFolder`, ...).
    pub spaces: String,
}

/// Remote hierarchical object store.
///
/// Implementations are black boxes to the rest of drivex: they own transport,
/// authentication, and rate limiting. They must not retry on their own
/// initiative in ways that could duplicate creations.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Return one page of nodes matching `request.query`.
    ///
    /// Pagination cursors are not followed.
    async fn list(&self, request: &ListRequest) -> StoreResult<Vec<Node>>;

    /// Read node metadata. `fields` of `None` means the store's defaults.
    async fn get(&self, id: &str, fields: Option<&str>) -> StoreResult<Node>;

    /// Read node content.
    ///
    /// Fails with `StoreError::ExportRequired` for store-native documents.
    /// Reading a folder's content is invalid; callers must avoid it.
    async fn get_media(&self, id: &str) -> StoreResult<ByteStream>;

    /// Read a store-native document converted to `mime_type`.
    async fn export(&self, id: &str, mime_type: &str) -> StoreResult<ByteStream>;

    /// Create a node (folder or empty file) in one call.
    async fn create(&self, metadata: &NodeMetadata, fields: &str) -> StoreResult<Node>;

    /// Create a node in staged mode and return the upload session URL.
    async fn create_resumable(&self, metadata: &NodeMetadata, fields: &str) -> StoreResult<String>;

    /// Send the whole content of a staged creation to its session URL.
    ///
    /// The returned node carries whatever fields were requested when the
    /// session was negotiated.
    async fn upload_session(
        &self,
        session_url: &str,
        mime_type: &str,
        body: ByteStream,
    ) -> StoreResult<Node>;

    /// Patch node metadata.
    async fn update(&self, id: &str, patch: &serde_json::Value, fields: &str) -> StoreResult<Node>;

    async fn delete(&self, id: &str) -> StoreResult<()>;

    /// Account information (user, storage quota, ...).
    async fn about(&self, fields: &str) -> StoreResult<serde_json::Value>;
}
