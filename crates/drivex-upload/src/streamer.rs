use drivex_store::{ByteStream, StoreHandle};
use drivex_types::Node;
use tracing::{info, instrument, warn};

use crate::digest::DigestStream;
use crate::director::UploadSession;
use crate::error::{UploadError, UploadResult};

/// Whether `mime_type` is a text type. Text uploads skip the checksum
/// comparison since transports may normalize line endings.
pub fn is_text_mime(mime_type: &str) -> bool {
    mime_type.trim().to_ascii_lowercase().starts_with("text/")
}

/// Streams content into an [`UploadSession`] and verifies the result.
#[derive(Clone, Debug)]
pub struct StreamUploader {
    handle: StoreHandle,
}

impl StreamUploader {
    pub fn new(handle: StoreHandle) -> Self {
        Self { handle }
    }

    /// Send `body` to the session. The returned node is tagged `is_new`.
    ///
    /// Fails with [`UploadError::Integrity`] when the content is not text,
    /// the store reported a checksum, and it differs from the digest of the
    /// bytes sent.
    #[instrument(skip(self, session, body), fields(name = %session.metadata.name))]
    pub async fn upload(&self, session: UploadSession, body: ByteStream) -> UploadResult<Node> {
        let mime_type = session.metadata.mime_type.clone();
        let (stream, digest) = DigestStream::new(body);
        let mut node = self
            .handle
            .store()
            .upload_session(&session.url, &mime_type, stream.boxed())
            .await?
            .mark_new();
        if node.parents.is_empty() {
            node.parents = vec![session.parent_id];
        }

        let local = digest.hex();
        if !is_text_mime(&mime_type) {
            if let Some(remote) = &node.content_checksum {
                if !remote.eq_ignore_ascii_case(&local) {
                    warn!(id = %node.id, %local, %remote, "checksum mismatch");
                    return Err(UploadError::Integrity {
                        node_id: node.id,
                        local,
                        remote: remote.clone(),
                    });
                }
            }
        }

        info!(id = %node.id, bytes = digest.bytes(), md5 = %local, "file uploaded");
        Ok(node)
    }
}
