use std::fmt;

use drivex_path::{PathCreator, PathResolver};
use drivex_query::{SearchFilter, Searcher};
use drivex_store::StoreHandle;
use drivex_types::{FolderRef, Node};
use tracing::{debug, instrument, warn};

use crate::director::UploadDirector;
use crate::error::{UploadError, UploadResult};
use crate::janitor::Janitor;
use crate::request::{Destination, UploadRequest};
use crate::streamer::StreamUploader;

/// Stages of [`Uploader::upload`], in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    ResolvingDestination,
    CheckingExisting,
    Deleting,
    Uploading,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ResolvingDestination => "resolving-destination",
            Self::CheckingExisting => "checking-existing",
            Self::Deleting => "deleting",
            Self::Uploading => "uploading",
        };
        f.write_str(s)
    }
}

/// Uploads files into the tree under a clobber/conflict policy.
#[derive(Clone, Debug)]
pub struct Uploader {
    resolver: PathResolver,
    creator: PathCreator,
    existing: Searcher,
    janitor: Janitor,
    director: UploadDirector,
    streamer: StreamUploader,
}

impl Uploader {
    /// Paths in requests are taken relative to `root`.
    pub fn new(handle: StoreHandle, root: impl Into<FolderRef>) -> Self {
        let root = root.into();
        Self {
            resolver: PathResolver::new(handle.clone(), root.clone()),
            creator: PathCreator::new(handle.clone(), root),
            existing: Searcher::new(handle.clone(), SearchFilter::default()),
            janitor: Janitor::new(handle.clone()),
            director: UploadDirector::new(handle.clone()),
            streamer: StreamUploader::new(handle),
        }
    }

    /// Run one upload to completion.
    ///
    /// Same-named nodes in the destination (files or folders) fail the
    /// upload with `Conflict`, or are deleted first when `clobber` is set.
    #[instrument(skip(self, request), fields(name = %request.name, clobber = request.clobber))]
    pub async fn upload(&self, request: UploadRequest) -> UploadResult<Node> {
        let destination = request.validate()?;

        debug!(stage = %Stage::ResolvingDestination);
        let parent = match destination {
            Destination::Path { path, create: true } => self.creator.create(&path).await?,
            Destination::Path { path, create: false } => self.resolver.resolve(&path).await?,
            Destination::Folder(folder) => folder,
        };
        let parent_id = parent.resolve_id()?.to_string();

        debug!(stage = %Stage::CheckingExisting, parent = %parent_id);
        let existing = self
            .existing
            .search(Some(parent_id.as_str()), Some(request.name.as_str()))
            .await?;
        if !existing.is_empty() {
            if !request.clobber {
                let ids: Vec<String> = existing.files.iter().map(|n| n.id.clone()).collect();
                warn!(parent = %parent_id, existing = ?ids, "name already taken");
                return Err(UploadError::Conflict {
                    parent: parent_id,
                    name: request.name,
                    existing: ids,
                });
            }
            debug!(stage = %Stage::Deleting, count = existing.len());
            self.janitor.delete(&existing).await?;
        }

        debug!(stage = %Stage::Uploading);
        let metadata = request.metadata();
        let session = self.director.negotiate(&parent, metadata).await?;
        self.streamer.upload(session, request.body).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use drivex_store::{InMemoryRemoteStore, StoreOp};
    use drivex_types::{ErrorKind, NodeKind};

    use super::*;

    fn setup() -> (Arc<InMemoryRemoteStore>, Uploader) {
        let store = Arc::new(InMemoryRemoteStore::new());
        let uploader = Uploader::new(StoreHandle::new(store.clone(), "drive"), "root");
        (store, uploader)
    }

    fn named(store: &InMemoryRemoteStore, parent: &str, name: &str) -> Vec<Node> {
        store
            .children(parent)
            .into_iter()
            .filter(|n| n.name == name)
            .collect()
    }

    // ------------------------------------------------------------------
    // Destination
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn creates_missing_path() {
        let (store, uploader) = setup();
        let req = UploadRequest::from_bytes("r.txt", "text/plain", "hello")
            .to_path("/a/b")
            .create_path(true);
        let node = uploader.upload(req).await.unwrap();
        assert!(node.is_new);
        assert_eq!(node.kind(), NodeKind::File);
        let b = store.node(&node.parents[0]).unwrap();
        assert_eq!(b.name, "b");
    }

    #[tokio::test]
    async fn missing_path_without_create_is_not_found() {
        let (store, uploader) = setup();
        let req = UploadRequest::from_bytes("r.txt", "text/plain", "x").to_path("/nope");
        let err = uploader.upload(req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!store.operations().contains(&StoreOp::CreateResumable));
    }

    #[tokio::test]
    async fn uploads_into_folder_node() {
        let (store, uploader) = setup();
        let docs = store.insert_folder("root", "docs");
        let req = UploadRequest::from_bytes("f.bin", "application/octet-stream", "abc")
            .to_folder(docs.clone());
        let node = uploader.upload(req).await.unwrap();
        assert_eq!(node.parents, vec![docs.id]);
    }

    #[tokio::test]
    async fn bad_request_touches_nothing() {
        let (store, uploader) = setup();
        let req = UploadRequest::from_bytes("f", "text/plain", "x")
            .to_path("a")
            .to_folder("root");
        let err = uploader.upload(req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert!(store.operations().is_empty());
    }

    // ------------------------------------------------------------------
    // Clobber and conflict
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn clobber_is_idempotent() {
        let (store, uploader) = setup();
        for content in ["one", "two"] {
            let req = UploadRequest::from_bytes("f", "text/plain", content)
                .to_folder("root")
                .clobber(true);
            uploader.upload(req).await.unwrap();
        }
        let left = named(&store, "root", "f");
        assert_eq!(left.len(), 1);
        assert_eq!(store.content(&left[0].id).unwrap(), "two".as_bytes());
    }

    #[tokio::test]
    async fn conflict_leaves_existing_untouched() {
        let (store, uploader) = setup();
        let existing = store.insert_file("root", "f", "text/plain", "old");
        let req = UploadRequest::from_bytes("f", "text/plain", "new").to_folder("root");
        let err = uploader.upload(req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        match err {
            UploadError::Conflict { existing: ids, .. } => assert_eq!(ids, vec![existing.id.clone()]),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(store.node(&existing.id), Some(existing.clone()));
        assert_eq!(store.content(&existing.id).unwrap(), "old".as_bytes());
        assert!(!store.operations().contains(&StoreOp::Delete));
    }

    #[tokio::test]
    async fn folder_of_same_name_also_conflicts() {
        let (store, uploader) = setup();
        store.insert_folder("root", "f");
        let req = UploadRequest::from_bytes("f", "text/plain", "x").to_folder("root");
        let err = uploader.upload(req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn clobber_removes_all_duplicates() {
        let (store, uploader) = setup();
        store.insert_file("root", "f", "text/plain", "1");
        store.insert_file("root", "f", "text/plain", "2");
        let req = UploadRequest::from_bytes("f", "text/plain", "3")
            .to_folder("root")
            .clobber(true);
        let node = uploader.upload(req).await.unwrap();
        let left = named(&store, "root", "f");
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, node.id);
    }

    #[tokio::test]
    async fn failed_upload_after_clobber_is_not_rolled_back() {
        let (store, uploader) = setup();
        store.insert_file("root", "f", "text/plain", "old");
        store.fail_next(StoreOp::CreateResumable, "quota");
        let req = UploadRequest::from_bytes("f", "text/plain", "new")
            .to_folder("root")
            .clobber(true);
        let err = uploader.upload(req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransportFailure);
        assert!(named(&store, "root", "f").is_empty());
    }

    // ------------------------------------------------------------------
    // Integrity
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn integrity_mismatch_only_for_binary() {
        let (store, uploader) = setup();
        store.set_checksum_override(Some("ffffffffffffffffffffffffffffffff".into()));

        let req = UploadRequest::from_bytes("b.bin", "application/octet-stream", "data")
            .to_folder("root");
        let err = uploader.upload(req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IntegrityError);

        let req = UploadRequest::from_bytes("t.txt", "text/plain", "data").to_folder("root");
        assert!(uploader.upload(req).await.is_ok());
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::CheckingExisting.to_string(), "checking-existing");
    }
}
