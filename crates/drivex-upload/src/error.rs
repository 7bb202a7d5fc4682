use drivex_path::PathError;
use drivex_query::QueryError;
use drivex_store::StoreError;
use drivex_types::{ErrorKind, TypeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("{name:?} already exists in {parent} ({} node(s)); set clobber to replace", existing.len())]
    Conflict {
        parent: String,
        name: String,
        /// IDs of the nodes occupying the name.
        existing: Vec<String>,
    },

    #[error("checksum mismatch for {node_id}: computed {local}, store reported {remote}")]
    Integrity {
        node_id: String,
        local: String,
        remote: String,
    },

    #[error("invalid folder reference: {0}")]
    Type(#[from] TypeError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl UploadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadRequest(_) | Self::Type(_) => ErrorKind::BadRequest,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Integrity { .. } => ErrorKind::IntegrityError,
            Self::Path(e) => e.kind(),
            Self::Query(e) => e.kind(),
            Self::Store(e) => e.kind(),
        }
    }
}

pub type UploadResult<T> = Result<T, UploadError>;
