//! Error types for update-agent.

/// Errors produced by the update workflows.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport failure or non-success status while talking to the feed or
    /// the artifact host.
    #[error("Network error: {0}")]
    Network(String),

    /// The release feed returned an empty list.
    #[error("No releases found")]
    NoReleases,

    /// Local storage failure, including truncated or empty downloads.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Signer mismatch between the existing installation and this agent.
    #[error("Security error: {0}")]
    Security(String),

    /// The latest release carries no installable asset.
    #[error("No download URL available")]
    MissingDownloadUrl,

    /// Unexpected failure while reading host package metadata.
    #[error("Detection error: {0}")]
    Detection(String),

    /// The host uninstall primitive failed.
    #[error("Uninstall error: {0}")]
    Uninstall(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

/// Result type alias for update-agent operations.
pub type Result<T> = std::result::Result<T, Error>;
