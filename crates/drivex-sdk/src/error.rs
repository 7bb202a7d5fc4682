use drivex_path::PathError;
use drivex_query::QueryError;
use drivex_store::StoreError;
use drivex_types::{ErrorKind, TypeError};
use drivex_upload::UploadError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("invalid folder reference: {0}")]
    Type(#[from] TypeError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl SdkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadRequest(_) | Self::Type(_) => ErrorKind::BadRequest,
            Self::Path(e) => e.kind(),
            Self::Query(e) => e.kind(),
            Self::Upload(e) => e.kind(),
            Self::Store(e) => e.kind(),
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
