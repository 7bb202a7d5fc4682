use drivex_types::ErrorKind;

/// Marker the store puts in its message when a node must be exported
/// rather than downloaded.
const EXPORT_REQUIRED_MARKER: &str = "Use Export";

/// Errors from remote store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store has no node with this ID.
    #[error("node not found: {id}")]
    NodeNotFound { id: String },

    /// Direct content read rejected; the node must be exported.
    #[error("export required for {id}: {message}")]
    ExportRequired { id: String, message: String },

    /// The store answered with an error status.
    #[error("store error {status}: {message}")]
    Api { status: u16, message: String },

    /// Network or protocol failure before the store answered.
    #[error("transport error: {0}")]
    Transport(String),

    /// The store did not hand back a usable upload session.
    #[error("invalid upload session: {0}")]
    InvalidSession(String),

    /// Request or response body could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error while reading a content stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Translate a store failure message into an error kind.
    ///
    /// The store only signals "export required" in its message text, so this
    /// is the single place drivex inspects message contents.
    pub fn from_api_message(status: u16, message: impl Into<String>, id: Option<&str>) -> Self {
        let message = message.into();
        match id {
            Some(id) if message.contains(EXPORT_REQUIRED_MARKER) => Self::ExportRequired {
                id: id.to_string(),
                message,
            },
            Some(id) if status == 404 => Self::NodeNotFound { id: id.to_string() },
            _ => Self::Api { status, message },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::TransportFailure
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
