use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use drivex_store::ByteStream;
use drivex_types::{FolderRef, NodeMetadata};
use futures::stream::{self, StreamExt};

use crate::error::{UploadError, UploadResult};

/// Where an upload goes, after validation.
#[derive(Clone, Debug, PartialEq)]
pub enum Destination {
    /// A folder path from the root, created first when `create` is set.
    Path { path: String, create: bool },
    Folder(FolderRef),
}

/// One upload. Consumed by [`Uploader::upload`](crate::Uploader::upload).
///
/// Give the destination as either a folder path or a folder reference, not
/// both.
pub struct UploadRequest {
    pub name: String,
    pub mime_type: String,
    pub folder_path: Option<String>,
    pub folder: Option<FolderRef>,
    pub create_path: bool,
    pub clobber: bool,
    pub properties: BTreeMap<String, String>,
    pub body: ByteStream,
}

impl UploadRequest {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, body: ByteStream) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            folder_path: None,
            folder: None,
            create_path: false,
            clobber: false,
            properties: BTreeMap::new(),
            body,
        }
    }

    /// A request whose content is already in memory.
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        let content = content.into();
        let body = stream::once(async move { Ok(content) }).boxed();
        Self::new(name, mime_type, body)
    }

    pub fn to_path(mut self, path: impl Into<String>) -> Self {
        self.folder_path = Some(path.into());
        self
    }

    pub fn to_folder(mut self, folder: impl Into<FolderRef>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    pub fn create_path(mut self, create: bool) -> Self {
        self.create_path = create;
        self
    }

    pub fn clobber(mut self, clobber: bool) -> Self {
        self.clobber = clobber;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Check the request's shape and return its destination.
    pub fn validate(&self) -> UploadResult<Destination> {
        if self.name.is_empty() {
            return Err(UploadError::BadRequest("name must not be empty".into()));
        }
        if self.mime_type.is_empty() {
            return Err(UploadError::BadRequest("mime type must not be empty".into()));
        }
        match (&self.folder_path, &self.folder) {
            (Some(_), Some(_)) => Err(UploadError::BadRequest(
                "specify a folder path or a folder, not both".into(),
            )),
            (None, None) => Err(UploadError::BadRequest(
                "specify a folder path or a folder".into(),
            )),
            (None, Some(_)) if self.create_path => Err(UploadError::BadRequest(
                "create_path needs a folder path".into(),
            )),
            (None, Some(folder)) => Ok(Destination::Folder(folder.clone())),
            (Some(path), None) => Ok(Destination::Path {
                path: path.clone(),
                create: self.create_path,
            }),
        }
    }

    /// Metadata for the new node, without a parent.
    pub fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            properties: self.properties.clone(),
            ..NodeMetadata::new(self.name.clone(), self.mime_type.clone())
        }
    }
}

impl fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadRequest")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("folder_path", &self.folder_path)
            .field("folder", &self.folder)
            .field("create_path", &self.create_path)
            .field("clobber", &self.clobber)
            .finish_non_exhaustive()
    }
}
