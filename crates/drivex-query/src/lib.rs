//! Structured search for drivex.
//!
//! Turns declarative filter terms into the store's query language, runs one
//! page of results per call, and validates what came back.
//!
//! - [`QueryBuilder`] -- renders [`SearchTerms`] plus a per-call parent/name
//!   into a query string and the list of fields to request
//! - [`SearchFilter`] -- terms plus the non-predicate controls (limit,
//!   unique, recent, ordering)
//! - [`Searcher`] -- executes a filter against a store and returns a
//!   [`SearchResult`] envelope
//! - [`ResultValidator`] -- rejects empty, ambiguous, or truncated results
//!
//! Pagination cursors are never followed. A result that fills its page is
//! reported as [`QueryError::TooManyResults`] instead.

pub mod builder;
pub mod error;
pub mod filter;
pub mod searcher;
pub mod validator;

pub use builder::{escape, QueryBuilder, SearchTerms};
pub use error::{QueryError, QueryResult, SearchContext};
pub use filter::{
    SearchFilter, DEFAULT_FIELDS, DEFAULT_LIMIT, DEFAULT_ORDER_BY, MAX_PAGE_SIZE, RECENT_ORDER_BY,
};
pub use searcher::{SearchResult, Searcher};
pub use validator::{check_search, ResultValidator};
