//! Error types for Playview core operations.
//!
//! Errors are grouped by domain (URL parsing, playlist fetching, persistence)
//! and classified through [`ErrorKind`] so the presentation layer can decide
//! how to report them. Every error carries a short [`Error::title`] and a
//! descriptive message (its `Display` output).

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad error category used for reporting and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input could not be turned into a playlist identifier.
    InvalidUrl,
    /// The playlist collaborator reported a failure.
    FetchFailed,
    /// Durable storage could not be read or written.
    PersistenceUnavailable,
    /// A video index was outside the loaded playlist.
    OutOfRange,
    /// The command is not valid in the current session state.
    InvalidState,
    /// Configuration could not be loaded or is invalid.
    Configuration,
    /// Anything else (I/O, serialization).
    Internal,
}

/// Errors raised while extracting a playlist identifier from user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    /// Nothing was entered.
    #[error("Paste a YouTube playlist URL to get started")]
    Blank,

    /// The input has no usable `list=` parameter.
    #[error("Please enter a valid YouTube playlist URL")]
    MissingListParameter {
        /// The rejected input.
        url: String,
    },
}

/// Errors raised by a playlist fetch collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request never produced a response.
    #[error("{message}")]
    Network {
        /// Human-readable reason.
        message: String,
    },

    /// The service answered with an explicit error.
    #[error("{message}")]
    Service {
        /// Message reported by the service.
        message: String,
    },

    /// The service answered with a body that is not a playlist.
    #[error("Unexpected playlist response: {reason}")]
    InvalidResponse {
        /// Decoding failure description.
        reason: String,
    },

    /// No collaborator is configured to serve the request.
    #[error("No playlist service configured: {reason}")]
    NotConfigured {
        /// What is missing.
        reason: String,
    },
}

/// Errors raised by the progress persistence backend.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Reading the persisted blob failed.
    #[error("Failed to read progress from {path}: {reason}")]
    ReadFailed {
        /// Location of the blob.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// Writing the persisted blob failed.
    #[error("Failed to write progress to {path}: {reason}")]
    WriteFailed {
        /// Location of the blob.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// The parent directory could not be created.
    #[error("Failed to create directory {path}: {reason}")]
    CreateDirFailed {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// The persisted blob is not a valid progress mapping.
    #[error("Stored progress is malformed: {reason}")]
    Malformed {
        /// Decoding failure description.
        reason: String,
    },
}

/// Errors that can occur in Playview core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Playlist URL could not be parsed.
    #[error(transparent)]
    Url(#[from] UrlError),

    /// Playlist fetch failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Durable progress storage failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Requested video index is not in the playlist. The message counts
    /// positions from 1.
    #[error("Video {} is out of range for a playlist of {len} videos", .index + 1)]
    OutOfRange {
        /// Requested index.
        index: usize,
        /// Number of videos in the playlist.
        len: usize,
    },

    /// Command issued while the session cannot accept it.
    #[error("Cannot {action} while the session is {state}")]
    SessionNotReady {
        /// The rejected command.
        action: &'static str,
        /// Name of the current session state.
        state: &'static str,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a network-level fetch failure.
    pub fn network_error(message: impl Into<String>) -> Self {
        Self::Fetch(FetchError::Network {
            message: message.into(),
        })
    }

    /// Create a fetch failure reported by the playlist service itself.
    pub fn service_error(message: impl Into<String>) -> Self {
        Self::Fetch(FetchError::Service {
            message: message.into(),
        })
    }

    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Url(_) => ErrorKind::InvalidUrl,
            Self::Fetch(_) => ErrorKind::FetchFailed,
            Self::Persistence(_) => ErrorKind::PersistenceUnavailable,
            Self::OutOfRange { .. } => ErrorKind::OutOfRange,
            Self::SessionNotReady { .. } => ErrorKind::InvalidState,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Io(_) | Self::Serialization(_) => ErrorKind::Internal,
        }
    }

    /// Short headline suitable for a notification title.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Url(UrlError::Blank) => "Please enter a playlist URL",
            Self::Url(UrlError::MissingListParameter { .. }) => "Invalid playlist URL",
            Self::Fetch(_) => "Failed to load playlist",
            Self::Persistence(_) => "Progress not saved",
            Self::OutOfRange { .. } => "No such video",
            Self::SessionNotReady { .. } => "Not available right now",
            Self::Configuration(_) => "Configuration problem",
            Self::Io(_) | Self::Serialization(_) => "Something went wrong",
        }
    }

    /// Whether retrying the same operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Fetch(FetchError::Network { .. } | FetchError::Service { .. })
        )
    }
}
