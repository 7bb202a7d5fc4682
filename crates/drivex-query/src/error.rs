use std::fmt;

use drivex_store::StoreError;
use drivex_types::{ErrorKind, TypeError};
use thiserror::Error;

/// The search that produced a failure, carried so callers can decide to
/// retry, widen the limit, or rename.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchContext {
    pub query: String,
    pub parent: Option<String>,
    pub name: Option<String>,
    /// Page size that was requested.
    pub limit: usize,
    pub unique: bool,
    pub recent: bool,
}

impl fmt::Display for SearchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "query {:?}", self.query)?;
        if let Some(parent) = &self.parent {
            write!(f, " in {parent}")?;
        }
        if let Some(name) = &self.name {
            write!(f, " for {name:?}")?;
        }
        write!(f, " (limit {})", self.limit)
    }
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(Box<SearchContext>),

    #[error("expected a unique match but found {count}: {context}")]
    AmbiguousResult {
        count: usize,
        context: Box<SearchContext>,
    },

    #[error("result count reached the limit of {limit}, increase the limit or narrow the filter: {context}")]
    TooManyResults {
        limit: usize,
        context: Box<SearchContext>,
    },

    #[error("invalid input: {0}")]
    Type(#[from] TypeError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadRequest(_) | Self::Type(_) => ErrorKind::BadRequest,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AmbiguousResult { .. } => ErrorKind::AmbiguousResult,
            Self::TooManyResults { .. } => ErrorKind::TooManyResults,
            Self::Store(e) => e.kind(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// The search behind this failure, if it came from a search result.
    pub fn context(&self) -> Option<&SearchContext> {
        match self {
            Self::NotFound(c) => Some(&**c),
            Self::AmbiguousResult { context, .. } | Self::TooManyResults { context, .. } => {
                Some(&**context)
            }
            _ => None,
        }
    }
}

pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> SearchContext {
        SearchContext {
            query: "name='x'".into(),
            parent: Some("p1".into()),
            name: Some("x".into()),
            limit: 2,
            unique: true,
            recent: false,
        }
    }

    #[test]
    fn context_display_names_the_search() {
        let s = ctx().to_string();
        assert!(s.contains("name='x'"));
        assert!(s.contains("in p1"));
        assert!(s.contains("limit 2"));
    }

    #[test]
    fn kinds_follow_variants() {
        assert_eq!(QueryError::NotFound(Box::new(ctx())).kind(), ErrorKind::NotFound);
        let e = QueryError::AmbiguousResult {
            count: 2,
            context: Box::new(ctx()),
        };
        assert_eq!(e.kind(), ErrorKind::AmbiguousResult);
        assert_eq!(e.context().map(|c| c.limit), Some(2));
        let e: QueryError = StoreError::Transport("reset".into()).into();
        assert_eq!(e.kind(), ErrorKind::TransportFailure);
        assert!(e.context().is_none());
    }
}
