use drivex_types::ErrorKind;
use thiserror::Error;

/// Errors setting up the HTTP backend. Call failures are `StoreError`s.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("no access token configured (set access_token or DRIVEX_ACCESS_TOKEN)")]
    MissingToken,

    #[error("invalid base URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl HttpError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Client(_) => ErrorKind::TransportFailure,
            _ => ErrorKind::BadRequest,
        }
    }
}

pub type HttpResult<T> = Result<T, HttpError>;
