use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No good response from {url}: {reason}")]
    RemoteUnavailable { url: String, reason: String },

    #[error("No valid XML from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Invalid OSM type: {0}")]
    InvalidOsmType(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn remote(url: impl Into<String>, reason: impl ToString) -> Self {
        Error::RemoteUnavailable {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(url: impl Into<String>, reason: impl ToString) -> Self {
        Error::MalformedResponse {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// True when the failure originates from the remote data source rather
    /// than from the caller's input.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::RemoteUnavailable { .. } | Error::MalformedResponse { .. }
        )
    }
}
