//! Errors that end the viewer.

use thiserror::Error;

/// Fatal viewer errors. Recoverable problems are shown as notices instead.
#[derive(Debug, Error)]
pub enum AppError {
    /// Core library error (configuration, fetcher construction).
    #[error(transparent)]
    Core(#[from] playview_core::Error),

    /// Terminal I/O failed.
    #[error("Terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Short heading shown before the message.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Core(e) => e.title(),
            Self::Io(_) => "Something went wrong",
        }
    }
}
