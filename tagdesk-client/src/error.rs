//! Error types for tagdesk-client
//!
//! Every backend or workflow failure maps to one variant; `user_message`
//! renders the text stored in the controller's error slot.

use thiserror::Error;

/// Main error type for the client engine
#[derive(Error, Debug)]
pub enum Error {
    /// Request could not be sent or no response arrived
    #[error("Network error: {0}")]
    Network(String),

    /// Backend answered with a non-success status
    #[error("Backend error {status}: {message}")]
    Status { status: u16, message: String },

    /// Backend answered 404
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body did not match the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// One file of an upload batch failed; later files were not attempted
    #[error("Upload of {filename} (file {index} of {total}) failed: {source}")]
    UploadFailed {
        filename: String,
        /// 1-based position within the batch
        index: usize,
        total: usize,
        source: Box<Error>,
    },

    /// An upload batch is already running
    #[error("An upload is already in progress")]
    UploadInProgress,

    /// A reset is running; uploads and further resets wait for it
    #[error("A reset is already in progress")]
    ResetInProgress,

    /// `start` called with an empty batch
    #[error("No files staged for upload")]
    NothingStaged,
}

impl Error {
    /// Human-readable message for display
    pub fn user_message(&self) -> String {
        match self {
            Error::Network(_) => format!("Could not reach the document service ({})", self),
            Error::Status { message, .. } if !message.is_empty() => {
                format!("The document service reported an error: {}", message)
            }
            Error::Status { status, .. } => {
                format!("The document service reported an error (HTTP {})", status)
            }
            Error::NotFound(what) => format!("{} was not found", what),
            Error::UploadFailed {
                filename, source, ..
            } => format!("Upload failed for {}: {}", filename, source.user_message()),
            _ => self.to_string(),
        }
    }

    /// Whether the failure came from the transport or the backend
    pub fn is_backend_failure(&self) -> bool {
        match self {
            Error::Network(_) | Error::Status { .. } | Error::NotFound(_) | Error::Parse(_) => true,
            Error::UploadFailed { source, .. } => source.is_backend_failure(),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::Parse(err.to_string())
        } else {
            Error::Network(err.to_string())
        }
    }
}

/// Convenience Result type using the client Error
pub type Result<T> = std::result::Result<T, Error>;
