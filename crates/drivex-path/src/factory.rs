use drivex_query::DEFAULT_FIELDS;
use drivex_store::StoreHandle;
use drivex_types::{FolderRef, Node, NodeMetadata, FOLDER_MIME_TYPE};
use tracing::{info, instrument};

use crate::error::{PathError, PathResult};
use crate::stepper::PathStepper;

/// Creates one folder under a parent.
#[derive(Clone, Debug)]
pub struct FolderCreator {
    handle: StoreHandle,
}

impl FolderCreator {
    pub fn new(handle: StoreHandle) -> Self {
        Self { handle }
    }

    /// Create folder `name` with `parent` as its sole parent.
    ///
    /// Does not check for an existing sibling of the same name.
    #[instrument(skip(self, parent), fields(parent = %parent))]
    pub async fn create(&self, parent: &FolderRef, name: &str) -> PathResult<Node> {
        let parent_id = parent.resolve_id()?;
        if name.is_empty() {
            return Err(PathError::BadRequest("folder name is empty".into()));
        }
        let metadata = NodeMetadata::new(name, FOLDER_MIME_TYPE).with_parent(parent_id);
        let node = self
            .handle
            .store()
            .create(&metadata, DEFAULT_FIELDS)
            .await?;
        info!(id = %node.id, "folder created");
        Ok(node.mark_new())
    }
}

/// Get-or-create for a single folder segment.
#[derive(Clone, Debug)]
pub struct FolderFactory {
    stepper: PathStepper,
    creator: FolderCreator,
}

impl FolderFactory {
    pub fn new(handle: StoreHandle) -> Self {
        Self {
            stepper: PathStepper::new(handle.clone()),
            creator: FolderCreator::new(handle),
        }
    }

    /// The existing child `name` of `parent`, or a new folder tagged
    /// `is_new` when there is none. Other lookup failures propagate.
    pub async fn get_or_create(&self, parent: &FolderRef, name: &str) -> PathResult<Node> {
        match self.stepper.step(parent, name).await {
            Ok(node) => Ok(node),
            Err(e) if e.is_not_found() => self.creator.create(parent, name).await,
            Err(e) => Err(e),
        }
    }
}
