//! Playlist viewing session.
//!
//! [`PlaylistSession`] owns the loaded playlist and the selected video, and
//! drives the [`ProgressStore`]. It is a plain state machine:
//!
//! ```text
//! Empty --request--> Loading --success--> Loaded
//!   ^                   |                   |
//!   +------failure------+                   |
//!                       ^------request------+
//! ```
//!
//! Fetching is split in two steps so the caller decides how the fetch runs:
//! [`PlaylistSession::begin_request`] validates the URL and enters `Loading`,
//! [`PlaylistSession::complete_request`] applies the result. Each request gets
//! a fresh [`RequestId`]; a result whose id is no longer the one being waited
//! on is discarded, so the most recent request always wins.
//! [`PlaylistSession::request_playlist`] chains both steps for callers that
//! simply await the fetch.
//!
//! Every transition publishes a [`SessionSnapshot`] to subscribers.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::{Error, FetchError, Result};
use crate::fetch::PlaylistFetcher;
use crate::playlist::{Playlist, Video, WatchProgress};
use crate::progress::ProgressStore;
use crate::youtube::{embed_url, extract_playlist_id};

/// Identifies one playlist request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A request that has entered `Loading` and awaits its fetch result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFetch {
    /// Request identifier to hand back to `complete_request`.
    pub request: RequestId,
    /// Playlist identifier to fetch.
    pub playlist_id: String,
}

/// Coarse session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No playlist loaded.
    Empty,
    /// A fetch is in flight.
    Loading,
    /// A playlist is loaded and a video selected.
    Loaded,
}

impl SessionStatus {
    const fn name(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
enum SessionState {
    Empty,
    Loading {
        request: RequestId,
        playlist_id: String,
    },
    Loaded {
        playlist: Arc<Playlist>,
        current_index: usize,
    },
}

/// What happens to the video being left when advancing with `next_video`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdvancePolicy {
    /// Advancing past a video counts as having watched it.
    #[default]
    CompleteDeparted,
    /// Advancing leaves progress untouched.
    KeepProgress,
}

/// Result of applying a fetch result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The playlist is now loaded.
    Loaded {
        /// Number of videos in the playlist.
        video_count: usize,
    },
    /// A newer request started meanwhile; the result was discarded.
    Superseded,
}

/// Result of a relative navigation command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// The selection moved.
    Moved {
        /// Index before the move.
        from: usize,
        /// Index after the move.
        to: usize,
    },
    /// Already at the first/last video; nothing changed.
    AtBoundary,
}

/// Short title plus message for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Headline.
    pub title: String,
    /// Details.
    pub message: String,
}

impl Notice {
    /// Notice for a successful load.
    #[must_use]
    pub fn loaded(video_count: usize) -> Self {
        Self {
            title: "Playlist loaded successfully!".to_string(),
            message: format!("Found {video_count} videos"),
        }
    }
}

impl From<&Error> for Notice {
    fn from(e: &Error) -> Self {
        Self {
            title: e.title().to_string(),
            message: e.to_string(),
        }
    }
}

/// One row of the playlist as seen by the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoEntry {
    /// Position in the playlist.
    pub index: usize,
    /// Whether this is the selected video.
    pub is_current: bool,
    /// Stored progress.
    pub progress: WatchProgress,
}

/// Immutable view of the session published after each transition.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// Coarse state.
    pub status: SessionStatus,
    /// Loaded playlist.
    pub playlist: Option<Arc<Playlist>>,
    /// Selected index; meaningful only when a playlist is loaded.
    pub current_index: usize,
    /// Per-video rows, in playlist order.
    pub entries: Vec<VideoEntry>,
    /// Percentage of completed videos, in `[0, 100]`.
    pub progress_percent: f64,
    /// Whether the last progress write reached durable storage.
    pub persisted: bool,
}

impl SessionSnapshot {
    fn empty(status: SessionStatus, persisted: bool) -> Self {
        Self {
            status,
            playlist: None,
            current_index: 0,
            entries: Vec::new(),
            progress_percent: 0.0,
            persisted,
        }
    }

    /// Selected video, if any.
    #[must_use]
    pub fn current_video(&self) -> Option<&Video> {
        self.playlist
            .as_deref()
            .and_then(|p| p.video(self.current_index))
    }

    /// Aggregate progress rounded to a whole percentage.
    #[must_use]
    pub fn rounded_percent(&self) -> u32 {
        self.progress_percent.round() as u32
    }

    /// "Video i of N" label for the selection.
    #[must_use]
    pub fn position_label(&self) -> Option<String> {
        self.playlist
            .as_deref()
            .map(|p| format!("Video {} of {}", self.current_index + 1, p.len()))
    }
}

/// The single playlist viewing session.
#[derive(Debug)]
pub struct PlaylistSession {
    state: SessionState,
    store: ProgressStore,
    policy: AdvancePolicy,
    next_request: u64,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl PlaylistSession {
    /// Start an empty session over `store`.
    pub fn new(store: ProgressStore) -> Self {
        let (snapshots, _) =
            watch::channel(SessionSnapshot::empty(SessionStatus::Empty, store.is_persisted()));
        Self {
            state: SessionState::Empty,
            store,
            policy: AdvancePolicy::default(),
            next_request: 0,
            snapshots,
        }
    }

    /// Replace the advance policy.
    #[must_use]
    pub fn with_advance_policy(mut self, policy: AdvancePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Receive a snapshot after every transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    /// Validate `url` and enter `Loading`.
    ///
    /// A request made while another is in flight supersedes it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`] for blank or unusable input; the session is left
    /// unchanged.
    pub fn begin_request(&mut self, url: &str) -> Result<PendingFetch> {
        let playlist_id = extract_playlist_id(url)?;

        self.next_request += 1;
        let request = RequestId(self.next_request);

        if let SessionState::Loading {
            request: previous, ..
        } = &self.state
        {
            debug!("Request {} supersedes {}", request, previous);
        }

        info!("Requesting playlist {} ({})", playlist_id, request);
        self.state = SessionState::Loading {
            request,
            playlist_id: playlist_id.clone(),
        };
        self.publish();

        Ok(PendingFetch {
            request,
            playlist_id,
        })
    }

    /// Apply the fetch result for `request`.
    ///
    /// # Errors
    ///
    /// Returns the fetch error (after reverting to `Empty`) when the current
    /// request failed. A playlist without videos counts as a failure.
    pub fn complete_request(
        &mut self,
        request: RequestId,
        result: Result<Playlist>,
    ) -> Result<LoadOutcome> {
        let waiting = matches!(
            &self.state,
            SessionState::Loading { request: current, .. } if *current == request
        );
        if !waiting {
            warn!("Discarding stale result for request {}", request);
            return Ok(LoadOutcome::Superseded);
        }

        let playlist = result.and_then(|playlist| {
            if playlist.is_empty() {
                Err(Error::Fetch(FetchError::InvalidResponse {
                    reason: "playlist has no videos".to_string(),
                }))
            } else {
                Ok(playlist)
            }
        });

        match playlist {
            Ok(playlist) => {
                let video_count = playlist.len();
                info!(
                    "Loaded playlist \"{}\" with {} videos",
                    playlist.title, video_count
                );
                self.state = SessionState::Loaded {
                    playlist: Arc::new(playlist),
                    current_index: 0,
                };
                self.publish();
                Ok(LoadOutcome::Loaded { video_count })
            }
            Err(e) => {
                error!("Failed to load playlist ({}): {}", request, e);
                self.state = SessionState::Empty;
                self.publish();
                Err(e)
            }
        }
    }

    /// Validate `url`, fetch it with `fetcher` and apply the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`] for unusable input and [`Error::Fetch`] when the
    /// fetch fails.
    pub async fn request_playlist<F>(&mut self, fetcher: &F, url: &str) -> Result<LoadOutcome>
    where
        F: PlaylistFetcher,
    {
        let pending = self.begin_request(url)?;
        let result = fetcher.fetch_playlist(&pending.playlist_id).await;
        self.complete_request(pending.request, result)
    }

    /// Select the video at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotReady`] unless a playlist is loaded and
    /// [`Error::OutOfRange`] for an index past the end.
    pub fn select_video(&mut self, index: usize) -> Result<()> {
        let (playlist, current_index) = self.loaded_mut("select a video")?;
        let len = playlist.len();
        if index >= len {
            return Err(Error::OutOfRange { index, len });
        }
        *current_index = index;
        debug!("Selected video {}", index);
        self.publish();
        Ok(())
    }

    /// Move to the next video.
    ///
    /// Under the default policy the video being left is marked as watched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotReady`] unless a playlist is loaded.
    pub fn next_video(&mut self) -> Result<Navigation> {
        let policy = self.policy;
        let (playlist, current_index) = self.loaded_mut("go to the next video")?;
        let from = *current_index;
        if from + 1 >= playlist.len() {
            debug!("Already at the last video");
            return Ok(Navigation::AtBoundary);
        }

        let departed = playlist.videos[from].id.clone();
        *current_index = from + 1;

        if policy == AdvancePolicy::CompleteDeparted {
            self.store.mark_watched_fully(&departed);
        }
        debug!("Advanced from video {} to {}", from, from + 1);
        self.publish();
        Ok(Navigation::Moved { from, to: from + 1 })
    }

    /// Move to the previous video. Progress is not touched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotReady`] unless a playlist is loaded.
    pub fn previous_video(&mut self) -> Result<Navigation> {
        let (_, current_index) = self.loaded_mut("go to the previous video")?;
        let from = *current_index;
        if from == 0 {
            debug!("Already at the first video");
            return Ok(Navigation::AtBoundary);
        }
        *current_index = from - 1;
        self.publish();
        Ok(Navigation::Moved { from, to: from - 1 })
    }

    /// Flip the completed flag of `video_id` and return the new value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotReady`] while a fetch is in flight.
    pub fn toggle_completion(&mut self, video_id: &str) -> Result<bool> {
        if matches!(self.state, SessionState::Loading { .. }) {
            return Err(self.not_ready("change completion"));
        }
        let completed = self.store.toggle_completion(video_id);
        info!(
            "Marked {} as {}",
            video_id,
            if completed { "done" } else { "not done" }
        );
        self.publish();
        Ok(completed)
    }

    /// Flip the completed flag of the selected video.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotReady`] unless a playlist is loaded.
    pub fn toggle_current(&mut self) -> Result<bool> {
        let video_id = self
            .current_video()
            .map(|v| v.id.clone())
            .ok_or_else(|| self.not_ready("change completion"))?;
        self.toggle_completion(&video_id)
    }

    /// Percentage of videos in the loaded playlist marked completed.
    ///
    /// Zero when no playlist is loaded.
    #[must_use]
    pub fn aggregate_progress(&self) -> f64 {
        match &self.state {
            SessionState::Loaded { playlist, .. } if !playlist.is_empty() => {
                let completed = playlist
                    .videos
                    .iter()
                    .filter(|v| self.store.is_completed(&v.id))
                    .count();
                completed as f64 / playlist.len() as f64 * 100.0
            }
            _ => 0.0,
        }
    }

    /// Stored progress for `video_id`.
    #[must_use]
    pub fn video_progress(&self, video_id: &str) -> WatchProgress {
        self.store.get(video_id)
    }

    /// Coarse state.
    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        match self.state {
            SessionState::Empty => SessionStatus::Empty,
            SessionState::Loading { .. } => SessionStatus::Loading,
            SessionState::Loaded { .. } => SessionStatus::Loaded,
        }
    }

    /// Playlist id being fetched, while `Loading`.
    #[must_use]
    pub fn pending_playlist_id(&self) -> Option<&str> {
        match &self.state {
            SessionState::Loading { playlist_id, .. } => Some(playlist_id),
            _ => None,
        }
    }

    /// Loaded playlist.
    #[must_use]
    pub fn playlist(&self) -> Option<&Playlist> {
        match &self.state {
            SessionState::Loaded { playlist, .. } => Some(playlist),
            _ => None,
        }
    }

    /// Selected index, when a playlist is loaded.
    #[must_use]
    pub const fn current_index(&self) -> Option<usize> {
        match self.state {
            SessionState::Loaded { current_index, .. } => Some(current_index),
            _ => None,
        }
    }

    /// Selected video, when a playlist is loaded.
    #[must_use]
    pub fn current_video(&self) -> Option<&Video> {
        match &self.state {
            SessionState::Loaded {
                playlist,
                current_index,
            } => playlist.video(*current_index),
            _ => None,
        }
    }

    /// Player URL for the selected video.
    #[must_use]
    pub fn current_embed_url(&self, autoplay: bool) -> Option<String> {
        self.current_video().map(|v| embed_url(&v.id, autoplay))
    }

    /// Whether `previous_video` would move.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        matches!(self.current_index(), Some(i) if i > 0)
    }

    /// Whether `next_video` would move.
    #[must_use]
    pub fn has_next(&self) -> bool {
        match &self.state {
            SessionState::Loaded {
                playlist,
                current_index,
            } => current_index + 1 < playlist.len(),
            _ => false,
        }
    }

    /// Underlying progress store.
    #[must_use]
    pub const fn store(&self) -> &ProgressStore {
        &self.store
    }

    /// Build a snapshot of the current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let persisted = self.store.is_persisted();
        match &self.state {
            SessionState::Loaded {
                playlist,
                current_index,
            } => SessionSnapshot {
                status: SessionStatus::Loaded,
                playlist: Some(Arc::clone(playlist)),
                current_index: *current_index,
                entries: playlist
                    .videos
                    .iter()
                    .enumerate()
                    .map(|(index, video)| VideoEntry {
                        index,
                        is_current: index == *current_index,
                        progress: self.store.get(&video.id),
                    })
                    .collect(),
                progress_percent: self.aggregate_progress(),
                persisted,
            },
            _ => SessionSnapshot::empty(self.status(), persisted),
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }

    fn loaded_mut(&mut self, action: &'static str) -> Result<(&Playlist, &mut usize)> {
        let status = self.status();
        match &mut self.state {
            SessionState::Loaded {
                playlist,
                current_index,
            } => Ok((&**playlist, current_index)),
            _ => Err(Error::SessionNotReady {
                action,
                state: status.name(),
            }),
        }
    }

    fn not_ready(&self, action: &'static str) -> Error {
        Error::SessionNotReady {
            action,
            state: self.status().name(),
        }
    }
}
