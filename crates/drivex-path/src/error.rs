use drivex_query::QueryError;
use drivex_store::StoreError;
use drivex_types::{ErrorKind, TypeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("invalid folder reference: {0}")]
    Type(#[from] TypeError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl PathError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadRequest(_) | Self::Type(_) => ErrorKind::BadRequest,
            Self::Query(e) => e.kind(),
            Self::Store(e) => e.kind(),
        }
    }

    /// Returns `true` if a segment lookup found nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Query(e) if e.is_not_found())
    }
}

pub type PathResult<T> = Result<T, PathError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_errors_are_bad_requests() {
        let e: PathError = TypeError::InvalidFolderRef("x".into()).into();
        assert_eq!(e.kind(), ErrorKind::BadRequest);
        assert!(!e.is_not_found());
    }

    #[test]
    fn store_errors_are_transport() {
        let e: PathError = StoreError::Transport("eof".into()).into();
        assert_eq!(e.kind(), ErrorKind::TransportFailure);
    }
}
