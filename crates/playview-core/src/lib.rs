//! `Playview` Core Library
//!
//! This crate provides the core functionality for the `Playview` application:
//! - Extracting playlist identifiers from `YouTube` URLs
//! - Fetching playlist metadata from a playlist service
//! - Tracking per-video watch progress, persisted across sessions
//! - The playlist viewing session (selection, navigation, completion)
//! - Application configuration management
//!
//! # Error Handling
//!
//! Every fallible operation returns [`Result`]. Errors carry a short title
//! and a descriptive message, and are classified by [`ErrorKind`].
//!
//! ```rust
//! use playview_core::{MemoryBackend, PlaylistSession, ProgressStore};
//!
//! let mut session = PlaylistSession::new(ProgressStore::open(MemoryBackend::new()));
//! let err = session.begin_request("   ").unwrap_err();
//! assert_eq!(err.title(), "Please enter a playlist URL");
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod playlist;
pub mod progress;
pub mod session;
pub mod youtube;

pub use config::{AppConfig, ConfigManager, PlaylistSource, ServiceConfig};
pub use error::{Error, ErrorKind, FetchError, PersistenceError, Result, UrlError};
pub use fetch::{
    ConfiguredFetcher, PlaylistFetcher, SamplePlaylistFetcher, ServicePlaylistFetcher,
    parse_service_response, sample_playlist,
};
pub use playlist::{Playlist, Video, WatchProgress};
pub use progress::{
    JsonFileBackend, MemoryBackend, PROGRESS_STORAGE_KEY, ProgressBackend, ProgressMap,
    ProgressStore, default_progress_path,
};
pub use session::{
    AdvancePolicy, LoadOutcome, Navigation, Notice, PendingFetch, PlaylistSession, RequestId,
    SessionSnapshot, SessionStatus, VideoEntry,
};
pub use youtube::{embed_url, extract_playlist_id};
