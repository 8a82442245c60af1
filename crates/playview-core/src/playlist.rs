//! Playlist and watch-progress data model.
//!
//! Field names serialize in camelCase so the same types decode the playlist
//! service response and the persisted progress blob.

use serde::{Deserialize, Serialize};

/// A single video in a playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    /// Video identifier, unique within a playlist.
    pub id: String,
    /// Video title.
    pub title: String,
    /// Thumbnail URL.
    #[serde(default)]
    pub thumbnail: String,
    /// Display duration, e.g. `45:23`.
    #[serde(default)]
    pub duration: String,
    /// Video description.
    #[serde(default)]
    pub description: String,
    /// Channel/uploader name.
    #[serde(default)]
    pub channel_title: String,
    /// Publish date as reported by the service.
    #[serde(default)]
    pub published_at: String,
}

/// A fetched playlist. Replaced wholesale on every successful fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    /// Playlist title.
    pub title: String,
    /// Playlist description.
    #[serde(default)]
    pub description: String,
    /// Channel that owns the playlist.
    #[serde(default)]
    pub channel_title: String,
    /// Videos in playback order.
    pub videos: Vec<Video>,
}

impl Playlist {
    /// Number of videos.
    #[must_use]
    pub fn len(&self) -> usize {
        self.videos.len()
    }

    /// Whether the playlist has no videos.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }

    /// Video at `index`, if any.
    #[must_use]
    pub fn video(&self, index: usize) -> Option<&Video> {
        self.videos.get(index)
    }
}

/// Watch progress for one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchProgress {
    /// Video this record belongs to.
    pub video_id: String,
    /// Seconds elapsed.
    #[serde(default)]
    pub current_time: f64,
    /// Total seconds, 0 when unknown.
    #[serde(default)]
    pub duration: f64,
    /// Whether the video counts as watched.
    #[serde(default)]
    pub completed: bool,
}

impl WatchProgress {
    /// The record used for videos with no stored progress.
    pub fn unwatched(video_id: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            current_time: 0.0,
            duration: 0.0,
            completed: false,
        }
    }

    /// The record written when a video is treated as fully watched.
    pub fn watched_fully(video_id: impl Into<String>) -> Self {
        Self {
            completed: true,
            ..Self::unwatched(video_id)
        }
    }

    /// Fraction of the video already watched, for a partially watched video.
    ///
    /// Returns `None` for completed videos, videos never started, and videos
    /// whose duration is unknown.
    #[must_use]
    pub fn partial_fraction(&self) -> Option<f64> {
        if self.completed || self.current_time <= 0.0 || self.duration <= 0.0 {
            return None;
        }
        Some((self.current_time / self.duration).clamp(0.0, 1.0))
    }
}
