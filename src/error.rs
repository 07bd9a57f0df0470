use std::fmt;

/// Errors raised while talking to the backend.
///
/// These never reach the user directly: the orchestrators fold them into a
/// rendered transcript message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request could not be sent or its response could not be read
    Network(String),

    /// A selected file could not be read from disk
    FileRead { file_name: String, reason: String },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Network(msg) => write!(f, "Network error: {}", msg),
            TransportError::FileRead { file_name, reason } => {
                write!(f, "Could not read {}: {}", file_name, reason)
            }
        }
    }
}

impl std::error::Error for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Network(err.to_string())
    }
}

/// Errors surfaced to the user as a blocking notice instead of a transcript entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// The upload was triggered with an empty file selection
    NoFilesSelected,
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::NoFilesSelected => write!(f, "Pick at least one file"),
        }
    }
}

impl std::error::Error for UploadError {}
