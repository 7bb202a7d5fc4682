use drivex_query::SearchResult;
use drivex_store::StoreHandle;
use drivex_types::Node;
use futures::future::try_join_all;
use tracing::{debug, info, instrument};

use crate::error::UploadResult;

/// Something the [`Janitor`] can delete: one node or a collection of them.
pub trait Disposable {
    fn nodes(&self) -> Vec<&Node>;
}

impl Disposable for Node {
    fn nodes(&self) -> Vec<&Node> {
        vec![self]
    }
}

impl Disposable for [Node] {
    fn nodes(&self) -> Vec<&Node> {
        self.iter().collect()
    }
}

impl Disposable for Vec<Node> {
    fn nodes(&self) -> Vec<&Node> {
        self.iter().collect()
    }
}

impl Disposable for SearchResult {
    fn nodes(&self) -> Vec<&Node> {
        self.files.iter().collect()
    }
}

/// A [`Disposable`] that carries a success flag for the batch.
pub trait Flagged: Disposable {
    fn set_success(&mut self, success: bool);
}

/// A node list paired with a success flag.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sweep {
    pub files: Vec<Node>,
    pub success: bool,
}

impl Disposable for Sweep {
    fn nodes(&self) -> Vec<&Node> {
        self.files.iter().collect()
    }
}

impl Flagged for Sweep {
    fn set_success(&mut self, success: bool) {
        self.success = success;
    }
}

impl From<SearchResult> for Sweep {
    fn from(result: SearchResult) -> Self {
        Self {
            files: result.files,
            success: false,
        }
    }
}

impl From<Vec<Node>> for Sweep {
    fn from(files: Vec<Node>) -> Self {
        Self {
            files,
            success: false,
        }
    }
}

/// Deletes nodes, concurrently when given several.
#[derive(Clone, Debug)]
pub struct Janitor {
    handle: StoreHandle,
}

impl Janitor {
    pub fn new(handle: StoreHandle) -> Self {
        Self { handle }
    }

    /// Delete every node in `target` and return how many were deleted.
    ///
    /// The first failure is returned; deletions that already completed stay
    /// done. Empty input succeeds without touching the store.
    #[instrument(skip_all)]
    pub async fn delete<T: Disposable + ?Sized>(&self, target: &T) -> UploadResult<usize> {
        let nodes = target.nodes();
        if nodes.is_empty() {
            return Ok(0);
        }
        let store = self.handle.store();
        try_join_all(nodes.iter().map(|node| {
            debug!(id = %node.id, "deleting");
            store.delete(&node.id)
        }))
        .await?;
        info!(count = nodes.len(), "nodes deleted");
        Ok(nodes.len())
    }

    /// Like [`delete`](Self::delete), but clears the target's success flag
    /// first and sets it once every deletion succeeded.
    pub async fn delete_with_flag<T: Flagged>(&self, target: &mut T) -> UploadResult<usize> {
        target.set_success(false);
        let count = self.delete(&*target).await?;
        target.set_success(true);
        Ok(count)
    }
}
