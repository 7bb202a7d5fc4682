use drivex_store::{ListRequest, StoreHandle};
use drivex_types::Node;
use tracing::{debug, instrument};

use crate::builder::SearchTerms;
use crate::error::{QueryResult, SearchContext};
use crate::filter::SearchFilter;

/// One page of search results together with the search that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult {
    pub parent: Option<String>,
    pub name: Option<String>,
    pub query: String,
    pub terms: SearchTerms,
    /// Page size that was requested.
    pub limit: usize,
    pub unique: bool,
    pub recent: bool,
    pub files: Vec<Node>,
    /// Set once the result has passed validation.
    pub ok: bool,
}

impl SearchResult {
    pub fn context(&self) -> SearchContext {
        SearchContext {
            query: self.query.clone(),
            parent: self.parent.clone(),
            name: self.name.clone(),
            limit: self.limit,
            unique: self.unique,
            recent: self.recent,
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn first(&self) -> Option<&Node> {
        self.files.first()
    }

    pub fn into_files(self) -> Vec<Node> {
        self.files
    }
}

/// Runs a [`SearchFilter`] against a store.
#[derive(Clone, Debug)]
pub struct Searcher {
    handle: StoreHandle,
    filter: SearchFilter,
}

impl Searcher {
    pub fn new(handle: StoreHandle, filter: SearchFilter) -> Self {
        Self { handle, filter }
    }

    pub fn filter(&self) -> &SearchFilter {
        &self.filter
    }

    pub fn handle(&self) -> &StoreHandle {
        &self.handle
    }

    /// Fetch one page of matches under `parent` named `name`.
    ///
    /// The result is not validated; pass it to
    /// [`ResultValidator::check`](crate::ResultValidator::check) when
    /// emptiness or duplicates matter.
    #[instrument(skip(self), fields(spaces = self.handle.spaces()))]
    pub async fn search(
        &self,
        parent: Option<&str>,
        name: Option<&str>,
    ) -> QueryResult<SearchResult> {
        let query = self.filter.query_builder().build(parent, name)?;
        let request = ListRequest {
            query: query.clone(),
            fields: self.filter.result_fields(),
            page_size: self.filter.page_size(),
            order_by: self.filter.effective_order_by().to_string(),
            spaces: self.handle.spaces().to_string(),
        };
        debug!(query = %request.query, page_size = request.page_size, "listing");
        let files = self.handle.store().list(&request).await?;
        debug!(count = files.len(), "listed");

        Ok(SearchResult {
            parent: parent.map(String::from),
            name: name.map(String::from).or_else(|| self.filter.terms.name.clone()),
            query,
            terms: self.filter.terms.clone(),
            limit: request.page_size,
            unique: self.filter.unique,
            recent: self.filter.is_recent(),
            files,
            ok: false,
        })
    }
}
