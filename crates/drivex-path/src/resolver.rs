use drivex_store::StoreHandle;
use drivex_types::{segments, FolderRef};
use tracing::instrument;

use crate::error::PathResult;
use crate::stepper::PathStepper;

/// Walks a slash-delimited path from a root through [`PathStepper`].
#[derive(Clone, Debug)]
pub struct PathResolver {
    stepper: PathStepper,
    root: FolderRef,
}

impl PathResolver {
    pub fn new(handle: StoreHandle, root: impl Into<FolderRef>) -> Self {
        Self {
            stepper: PathStepper::new(handle),
            root: root.into(),
        }
    }

    pub fn root(&self) -> &FolderRef {
        &self.root
    }

    /// Resolve `path` from the configured root.
    ///
    /// An empty path returns the root unchanged. Otherwise the result holds
    /// the node named by the last segment, which may be a file.
    pub async fn resolve(&self, path: &str) -> PathResult<FolderRef> {
        self.resolve_from(&self.root, path).await
    }

    #[instrument(skip(self, root), fields(root = %root))]
    pub async fn resolve_from(&self, root: &FolderRef, path: &str) -> PathResult<FolderRef> {
        let mut current = root.clone();
        for segment in segments(path) {
            current = FolderRef::Folder(self.stepper.step(&current, segment).await?);
        }
        Ok(current)
    }
}
