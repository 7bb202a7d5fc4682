use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::searcher::SearchResult;

/// Validates search results before they are trusted.
pub struct ResultValidator;

impl ResultValidator {
    /// Accept `result` or explain why not.
    ///
    /// - no matches: `NotFound`
    /// - unique search with more than one match: `AmbiguousResult`
    /// - page filled (except in recent mode): `TooManyResults`
    ///
    /// On success the returned result has `ok` set.
    pub fn check(mut result: SearchResult) -> QueryResult<SearchResult> {
        let count = result.files.len();
        if count == 0 {
            debug!(query = %result.query, "no match");
            return Err(QueryError::NotFound(Box::new(result.context())));
        }
        if result.unique && count > 1 {
            return Err(QueryError::AmbiguousResult {
                count,
                context: Box::new(result.context()),
            });
        }
        if !result.unique && !result.recent && count >= result.limit {
            return Err(QueryError::TooManyResults {
                limit: result.limit,
                context: Box::new(result.context()),
            });
        }
        result.ok = true;
        Ok(result)
    }
}

/// Shorthand for [`ResultValidator::check`].
pub fn check_search(result: SearchResult) -> QueryResult<SearchResult> {
    ResultValidator::check(result)
}
