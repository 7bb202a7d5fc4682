use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use drivex_path::{PathCreator, PathResolver};
use drivex_query::{check_search, SearchFilter, SearchResult, Searcher, DEFAULT_FIELDS};
use drivex_store::{ByteStream, RemoteStore, StoreError, StoreHandle};
use drivex_types::{FolderRef, Node};
use drivex_upload::{Disposable, Flagged, Janitor, UploadRequest, Uploader};
use futures::TryStreamExt;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::error::{SdkError, SdkResult};
use crate::identity::hex_id_from_email;
use crate::options::DriveOptions;

/// Fields `about_me` asks for when none are given.
const ABOUT_FIELDS: &str = "user,storageQuota";

/// Path-addressed access to one root of a remote store.
#[derive(Clone, Debug)]
pub struct Drive {
    handle: StoreHandle,
    options: DriveOptions,
    resolver: PathResolver,
    creator: PathCreator,
    uploader: Uploader,
    janitor: Janitor,
}

impl Drive {
    pub fn new(store: Arc<dyn RemoteStore>, options: DriveOptions) -> Self {
        let handle = StoreHandle::new(store, options.spaces.clone());
        let root = FolderRef::from(options.root.as_str());
        Self {
            resolver: PathResolver::new(handle.clone(), root.clone()),
            creator: PathCreator::new(handle.clone(), root.clone()),
            uploader: Uploader::new(handle.clone(), root),
            janitor: Janitor::new(handle.clone()),
            handle,
            options,
        }
    }

    /// A drive over the same store, rooted in the app-data space.
    pub fn app_data(&self) -> Self {
        let store = self.handle.store_arc();
        Self::new(store, self.options.app_data())
    }

    pub fn options(&self) -> &DriveOptions {
        &self.options
    }

    pub fn root(&self) -> &FolderRef {
        self.resolver.root()
    }

    pub fn store(&self) -> &dyn RemoteStore {
        self.handle.store()
    }

    // ------------------------------------------------------------------
    // Paths
    // ------------------------------------------------------------------

    /// Resolve `path` from the root. An empty path returns the root.
    pub async fn resolve_path(&self, path: &str) -> SdkResult<FolderRef> {
        Ok(self.resolver.resolve(path).await?)
    }

    /// Like [`resolve_path`](Self::resolve_path), but always returns node
    /// metadata, fetching it for the root.
    pub async fn find_path(&self, path: &str) -> SdkResult<Node> {
        match self.resolve_path(path).await? {
            FolderRef::Folder(node) => Ok(node),
            FolderRef::Id(id) => Ok(self.handle.store().get(&id, Some(DEFAULT_FIELDS)).await?),
        }
    }

    /// Resolve `path`, creating every missing folder along it.
    pub async fn create_path(&self, path: &str) -> SdkResult<FolderRef> {
        Ok(self.creator.create(path).await?)
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    pub fn searcher(&self, filter: SearchFilter) -> Searcher {
        Searcher::new(self.handle.clone(), filter)
    }

    /// One page of matches for `filter` under `parent`, unvalidated.
    pub async fn search(
        &self,
        filter: &SearchFilter,
        parent: Option<&FolderRef>,
        name: Option<&str>,
    ) -> SdkResult<SearchResult> {
        let parent_id = parent.map(FolderRef::resolve_id).transpose()?;
        let searcher = self.searcher(filter.clone());
        Ok(searcher.search(parent_id, name).await?)
    }

    /// [`search`](Self::search) followed by result validation.
    pub async fn search_checked(
        &self,
        filter: &SearchFilter,
        parent: Option<&FolderRef>,
        name: Option<&str>,
    ) -> SdkResult<SearchResult> {
        Ok(check_search(self.search(filter, parent, name).await?)?)
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    pub async fn upload(&self, request: UploadRequest) -> SdkResult<Node> {
        Ok(self.uploader.upload(request).await?)
    }

    /// Delete one node or a collection of them; returns how many.
    pub async fn remove<T: Disposable + ?Sized>(&self, target: &T) -> SdkResult<usize> {
        Ok(self.janitor.delete(target).await?)
    }

    /// [`remove`](Self::remove), reporting through the target's flag.
    pub async fn remove_with_flag<T: Flagged>(&self, target: &mut T) -> SdkResult<usize> {
        Ok(self.janitor.delete_with_flag(target).await?)
    }

    /// Patch metadata of `id`. The response carries the default fields plus
    /// every top-level key of `patch`.
    #[instrument(skip(self, patch))]
    pub async fn update_metadata(&self, id: &str, patch: &Value) -> SdkResult<Node> {
        let keys = patch
            .as_object()
            .ok_or_else(|| SdkError::BadRequest("metadata patch must be a JSON object".into()))?;
        let mut fields: Vec<&str> = DEFAULT_FIELDS.split(',').collect();
        for key in keys.keys() {
            if !fields.contains(&key.as_str()) {
                fields.push(key.as_str());
            }
        }
        let node = self
            .handle
            .store()
            .update(id, patch, &fields.join(","))
            .await?;
        info!(id, "metadata updated");
        Ok(node)
    }

    // ------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------

    /// Content of `id`. When the store requires an export and
    /// `export_mime` is given, exports to that type instead.
    #[instrument(skip(self))]
    pub async fn contents(&self, id: &str, export_mime: Option<&str>) -> SdkResult<ByteStream> {
        let store = self.handle.store();
        match (store.get_media(id).await, export_mime) {
            (Err(StoreError::ExportRequired { .. }), Some(mime)) => {
                debug!(mime, "falling back to export");
                Ok(store.export(id, mime).await?)
            }
            (result, _) => Ok(result?),
        }
    }

    /// Content of the node at `path`.
    pub async fn download(&self, path: &str, export_mime: Option<&str>) -> SdkResult<ByteStream> {
        let node = self.find_path(path).await?;
        self.contents(&node.id, export_mime).await
    }

    /// [`download`](Self::download) collected into memory.
    pub async fn download_bytes(&self, path: &str, export_mime: Option<&str>) -> SdkResult<Bytes> {
        let stream = self.download(path, export_mime).await?;
        let buf = stream
            .try_fold(BytesMut::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
            .map_err(StoreError::from)?;
        Ok(buf.freeze())
    }

    // ------------------------------------------------------------------
    // Account
    // ------------------------------------------------------------------

    pub async fn about_me(&self, fields: Option<&str>) -> SdkResult<Value> {
        Ok(self
            .handle
            .store()
            .about(fields.unwrap_or(ABOUT_FIELDS))
            .await?)
    }

    /// Salted identifier of the signed-in account. Fails `BadRequest`
    /// without a configured salt.
    pub async fn hexid(&self) -> SdkResult<String> {
        let salt = self
            .options
            .salt
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SdkError::BadRequest("hexid needs a salt".into()))?;
        let about = self.about_me(Some("user(emailAddress)")).await?;
        let email = about
            .pointer("/user/emailAddress")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                SdkError::Store(StoreError::Serialization(
                    "about response has no user.emailAddress".into(),
                ))
            })?;
        Ok(hex_id_from_email(email, salt))
    }
}

#[cfg(test)]
mod tests {
    use drivex_store::{InMemoryRemoteStore, StoreOp, NATIVE_DOC_MIME_TYPE};
    use drivex_types::{ErrorKind, NodeKind};
    use drivex_upload::Sweep;
    use serde_json::json;

    use super::*;

    fn setup() -> (Arc<InMemoryRemoteStore>, Drive) {
        let store = Arc::new(InMemoryRemoteStore::new().with_account_email("Ann@Example.com"));
        let drive = Drive::new(store.clone(), DriveOptions::default().with_salt("pepper"));
        (store, drive)
    }

    // ------------------------------------------------------------------
    // End to end
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn end_to_end_scenario() {
        let (_store, drive) = setup();
        drive.create_path("/a/b").await.unwrap();

        let upload = |clobber: bool| {
            UploadRequest::from_bytes("r.txt", "text/plain", "hello")
                .to_path("/a/b")
                .clobber(clobber)
        };
        let first = drive.upload(upload(false)).await.unwrap();
        assert_eq!(first.name, "r.txt");
        assert_eq!(first.kind(), NodeKind::File);

        let found = drive.resolve_path("/a/b/r.txt").await.unwrap();
        assert_eq!(found.id(), first.id);

        let err = drive.upload(upload(false)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let second = drive.upload(upload(true)).await.unwrap();
        assert_ne!(second.id, first.id);

        let b = drive.resolve_path("/a/b").await.unwrap();
        let all = drive
            .search(&SearchFilter::default(), Some(&b), Some("r.txt"))
            .await
            .unwrap();
        let ids: Vec<&str> = all.files.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str()]);
    }

    #[tokio::test]
    async fn find_path_on_root_fetches_metadata() {
        let (_store, drive) = setup();
        let root = drive.find_path("/").await.unwrap();
        assert_eq!(root.id, "root");
        assert!(root.is_folder());
    }

    #[tokio::test]
    async fn search_checked_validates() {
        let (store, drive) = setup();
        store.insert_file("root", "x", "text/plain", "1");
        store.insert_file("root", "x", "text/plain", "2");
        let filter = SearchFilter::default().unique();
        let err = drive
            .search_checked(&filter, Some(&"root".into()), Some("x"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AmbiguousResult);
    }

    // ------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn download_reads_content() {
        let (_store, drive) = setup();
        drive
            .upload(
                UploadRequest::from_bytes("f.bin", "application/octet-stream", "bytes!")
                    .to_path("d")
                    .create_path(true),
            )
            .await
            .unwrap();
        let content = drive.download_bytes("/d/f.bin", None).await.unwrap();
        assert_eq!(content, Bytes::from_static(b"bytes!"));
    }

    #[tokio::test]
    async fn native_doc_falls_back_to_export() {
        let (store, drive) = setup();
        let doc = store.insert_native_doc("root", "notes", "exported text");
        let bytes = drive.download_bytes("notes", Some("text/plain")).await.unwrap();
        assert_eq!(bytes, Bytes::from_static(b"exported text"));
        assert!(store.operations().contains(&StoreOp::Export));

        let err = drive.contents(&doc.id, None).await.err().unwrap();
        assert!(matches!(
            err,
            SdkError::Store(StoreError::ExportRequired { .. })
        ));
        assert_eq!(doc.mime_type, NATIVE_DOC_MIME_TYPE);
    }

    #[tokio::test]
    async fn other_media_errors_do_not_export() {
        let (store, drive) = setup();
        let f = store.insert_file("root", "f", "application/pdf", "x");
        store.fail_next(StoreOp::Media, "backend error");
        let err = drive.contents(&f.id, Some("text/plain")).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::TransportFailure);
        assert!(!store.operations().contains(&StoreOp::Export));
    }

    // ------------------------------------------------------------------
    // Metadata and removal
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn update_metadata_patches_and_asks_for_keys() {
        let (store, drive) = setup();
        let f = store.insert_file("root", "f", "text/plain", "x");
        let node = drive
            .update_metadata(&f.id, &json!({"name": "g", "starred": true}))
            .await
            .unwrap();
        assert_eq!(node.name, "g");
        assert!(node.starred);

        let err = drive.update_metadata(&f.id, &json!(["name"])).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn remove_search_result_and_sweep() {
        let (store, drive) = setup();
        store.insert_file("root", "tmp", "text/plain", "1");
        store.insert_file("root", "tmp", "text/plain", "2");
        let found = drive
            .search(&SearchFilter::default(), Some(&"root".into()), Some("tmp"))
            .await
            .unwrap();
        assert_eq!(drive.remove(&found).await.unwrap(), 2);

        let f = store.insert_file("root", "one", "text/plain", "1");
        let mut sweep = Sweep::from(vec![f]);
        drive.remove_with_flag(&mut sweep).await.unwrap();
        assert!(sweep.success);
        assert!(store.children("root").is_empty());
    }

    // ------------------------------------------------------------------
    // Account and spaces
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn about_me_defaults() {
        let (_store, drive) = setup();
        let about = drive.about_me(None).await.unwrap();
        assert_eq!(about["user"]["emailAddress"], "Ann@Example.com");
        assert!(about.get("storageQuota").is_some());
    }

    #[tokio::test]
    async fn hexid_uses_normalized_email() {
        let (_store, drive) = setup();
        let id = drive.hexid().await.unwrap();
        assert_eq!(id, hex_id_from_email("ann@example.com", "pepper"));
    }

    #[tokio::test]
    async fn hexid_without_salt_is_bad_request() {
        let store = Arc::new(InMemoryRemoteStore::new());
        let drive = Drive::new(store.clone(), DriveOptions::default());
        let err = drive.hexid().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert!(store.operations().is_empty());
    }

    #[tokio::test]
    async fn app_data_is_separate() {
        let (store, drive) = setup();
        let app = drive.app_data();
        assert_eq!(app.root(), &FolderRef::from("appDataFolder"));

        app.create_path("cfg").await.unwrap();
        assert_eq!(store.children("appDataFolder").len(), 1);
        assert!(store.children("root").is_empty());
        assert_eq!(
            drive.resolve_path("cfg").await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
        let spaces = store.list_requests().last().map(|r| r.spaces.clone());
        assert_eq!(spaces.as_deref(), Some("drive"));
        assert_eq!(store.list_requests()[0].spaces, "appDataFolder");
    }
}
