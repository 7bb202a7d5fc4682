use drivex_query::{check_search, QueryError, SearchFilter, Searcher, RECENT_ORDER_BY};
use drivex_store::StoreHandle;
use drivex_types::{FolderRef, Node};
use tracing::{debug, instrument};

use crate::error::{PathError, PathResult};

/// Resolves exactly one path segment.
#[derive(Clone, Debug)]
pub struct PathStepper {
    searcher: Searcher,
}

impl PathStepper {
    pub fn new(handle: StoreHandle) -> Self {
        let filter = SearchFilter::default().unique().order_by(RECENT_ORDER_BY);
        Self {
            searcher: Searcher::new(handle, filter),
        }
    }

    pub fn handle(&self) -> &StoreHandle {
        self.searcher.handle()
    }

    /// The single child of `parent` named `name`.
    ///
    /// Fails `NotFound` when there is none and `AmbiguousResult` when
    /// siblings share the name.
    #[instrument(skip(self, parent), fields(parent = %parent))]
    pub async fn step(&self, parent: &FolderRef, name: &str) -> PathResult<Node> {
        let parent_id = parent.resolve_id()?;
        if name.is_empty() {
            return Err(PathError::BadRequest("segment name is empty".into()));
        }
        let result = check_search(self.searcher.search(Some(parent_id), Some(name)).await?)?;
        let context = result.context();
        let node = result
            .into_files()
            .into_iter()
            .next()
            .ok_or_else(|| QueryError::NotFound(Box::new(context)))?;
        debug!(id = %node.id, "segment resolved");
        Ok(node)
    }
}
