use drivex_store::StoreHandle;
use drivex_types::{FolderRef, NodeMetadata};
use tracing::{debug, instrument};

use crate::error::UploadResult;

/// Fields requested for an uploaded node.
pub const UPLOAD_FIELDS: &str = "id,name,mimeType,md5Checksum,parents";

/// A negotiated write endpoint for one content stream.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadSession {
    pub url: String,
    pub parent_id: String,
    pub metadata: NodeMetadata,
}

/// Negotiates resumable upload sessions.
#[derive(Clone, Debug)]
pub struct UploadDirector {
    handle: StoreHandle,
}

impl UploadDirector {
    pub fn new(handle: StoreHandle) -> Self {
        Self { handle }
    }

    /// Create `metadata` under `parent` (as its only parent) in resumable
    /// mode and return the session endpoint.
    #[instrument(skip(self, parent, metadata), fields(parent = %parent, name = %metadata.name))]
    pub async fn negotiate(
        &self,
        parent: &FolderRef,
        metadata: NodeMetadata,
    ) -> UploadResult<UploadSession> {
        let parent_id = parent.resolve_id()?.to_string();
        let metadata = metadata.with_parent(parent_id.clone());
        let url = self
            .handle
            .store()
            .create_resumable(&metadata, UPLOAD_FIELDS)
            .await?;
        debug!(%url, "upload session negotiated");
        Ok(UploadSession {
            url,
            parent_id,
            metadata,
        })
    }
}
