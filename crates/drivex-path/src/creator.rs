use drivex_store::StoreHandle;
use drivex_types::{segments, FolderRef};
use tracing::instrument;

use crate::error::PathResult;
use crate::factory::FolderFactory;

/// Realizes a full folder chain, creating every missing segment.
#[derive(Clone, Debug)]
pub struct PathCreator {
    factory: FolderFactory,
    root: FolderRef,
}

impl PathCreator {
    pub fn new(handle: StoreHandle, root: impl Into<FolderRef>) -> Self {
        Self {
            factory: FolderFactory::new(handle),
            root: root.into(),
        }
    }

    /// The folder named by `path`, created as needed. An empty path returns
    /// the root unchanged.
    ///
    /// A failure partway leaves the folders created so far in place.
    #[instrument(skip(self), fields(root = %self.root))]
    pub async fn create(&self, path: &str) -> PathResult<FolderRef> {
        let mut current = self.root.clone();
        for segment in segments(path) {
            current = FolderRef::Folder(self.factory.get_or_create(&current, segment).await?);
        }
        Ok(current)
    }
}
