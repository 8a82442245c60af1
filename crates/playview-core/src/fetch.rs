//! Playlist fetch collaborators.
//!
//! A [`PlaylistFetcher`] turns a playlist identifier into a [`Playlist`]. Two
//! implementations ship with the crate:
//!
//! - [`ServicePlaylistFetcher`] POSTs `{"playlistId": ...}` to a playlist
//!   service and decodes its JSON answer.
//! - [`SamplePlaylistFetcher`] answers every request with a built-in sample
//!   playlist, for offline use.
//!
//! A service answer carrying an `error` field is a failure just like a
//! transport error.

use std::future::Future;
use std::time::Duration;

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::config::{AppConfig, PlaylistSource, ServiceConfig};
use crate::error::{Error, FetchError, Result};
use crate::playlist::{Playlist, Video};

/// Fallback message when a failed request carries no message of its own.
pub const DEFAULT_FETCH_ERROR: &str = "Failed to fetch playlist";

/// Source of playlist data.
pub trait PlaylistFetcher: Send + Sync {
    /// Fetch the playlist identified by `playlist_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fetch`] on transport or service failure.
    fn fetch_playlist(&self, playlist_id: &str) -> impl Future<Output = Result<Playlist>> + Send;
}

/// Client for the remote playlist service.
#[derive(Debug, Clone)]
pub struct ServicePlaylistFetcher {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl ServicePlaylistFetcher {
    /// Build a client from service settings.
    ///
    /// # Errors
    ///
    /// Returns an error if no endpoint is configured or the HTTP client cannot
    /// be created.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| {
                Error::Fetch(FetchError::NotConfigured {
                    reason: "missing service endpoint".to_string(),
                })
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::network_error(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
        })
    }

    /// Endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl PlaylistFetcher for ServicePlaylistFetcher {
    async fn fetch_playlist(&self, playlist_id: &str) -> Result<Playlist> {
        info!("Fetching playlist {} from {}", playlist_id, self.endpoint);

        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "playlistId": playlist_id }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key).header("apikey", key);
        }

        let response = request.send().await.map_err(|e| {
            warn!("Playlist request failed: {}", e);
            Error::network_error(format!("{DEFAULT_FETCH_ERROR}: {e}"))
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::network_error(format!("{DEFAULT_FETCH_ERROR}: {e}")))?;

        debug!("Playlist service answered {} ({} bytes)", status, body.len());
        parse_service_response(status.as_u16(), &body)
    }
}

/// Decode a playlist service answer.
///
/// # Errors
///
/// Returns [`FetchError::Service`] when the body has an `error` field or the
/// status is not a success, and [`FetchError::InvalidResponse`] when the body
/// is not a playlist.
pub fn parse_service_response(status: u16, body: &str) -> Result<Playlist> {
    let value: Option<Value> = serde_json::from_str(body).ok();

    if let Some(message) = value.as_ref().and_then(error_message) {
        return Err(Error::service_error(message));
    }

    if !(200..300).contains(&status) {
        return Err(Error::service_error(format!(
            "{DEFAULT_FETCH_ERROR} (HTTP {status})"
        )));
    }

    let value = value.ok_or_else(|| {
        Error::Fetch(FetchError::InvalidResponse {
            reason: "body is not JSON".to_string(),
        })
    })?;

    serde_json::from_value(value).map_err(|e| {
        Error::Fetch(FetchError::InvalidResponse {
            reason: e.to_string(),
        })
    })
}

/// Message carried by a truthy `error` field. `null`, `false`, zero and blank
/// strings do not mark a failure.
fn error_message(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(message) if message.trim().is_empty() => None,
        Value::Number(n) if n.as_f64().is_some_and(|f| f.abs() < f64::EPSILON) => None,
        Value::String(message) => Some(message.clone()),
        Value::Object(inner) => Some(
            inner
                .get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(DEFAULT_FETCH_ERROR)
                .to_string(),
        ),
        Value::Bool(true) => Some(DEFAULT_FETCH_ERROR.to_string()),
        other => Some(other.to_string()),
    }
}

/// Answers every request with the built-in sample playlist.
#[derive(Debug, Clone, Copy, Default)]
pub struct SamplePlaylistFetcher;

impl PlaylistFetcher for SamplePlaylistFetcher {
    async fn fetch_playlist(&self, playlist_id: &str) -> Result<Playlist> {
        debug!("Serving sample playlist for {}", playlist_id);
        Ok(sample_playlist())
    }
}

/// Fetcher chosen by configuration.
#[derive(Debug, Clone)]
pub enum ConfiguredFetcher {
    /// Remote playlist service.
    Service(ServicePlaylistFetcher),
    /// Built-in sample playlist.
    Sample(SamplePlaylistFetcher),
}

impl ConfiguredFetcher {
    /// Build the fetcher selected by `config.source`.
    ///
    /// # Errors
    ///
    /// Returns an error if the service source is selected but cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        match config.source {
            PlaylistSource::Service => Ok(Self::Service(ServicePlaylistFetcher::new(
                &config.service,
            )?)),
            PlaylistSource::Sample => Ok(Self::Sample(SamplePlaylistFetcher)),
        }
    }
}

impl PlaylistFetcher for ConfiguredFetcher {
    async fn fetch_playlist(&self, playlist_id: &str) -> Result<Playlist> {
        match self {
            Self::Service(fetcher) => fetcher.fetch_playlist(playlist_id).await,
            Self::Sample(fetcher) => fetcher.fetch_playlist(playlist_id).await,
        }
    }
}

fn sample_video(
    id: &str,
    title: &str,
    duration: &str,
    description: &str,
    published_at: &str,
) -> Video {
    Video {
        id: id.to_string(),
        title: title.to_string(),
        thumbnail: format!("https://i.ytimg.com/vi/{id}/maxresdefault.jpg"),
        duration: duration.to_string(),
        description: description.to_string(),
        channel_title: "Code Academy".to_string(),
        published_at: published_at.to_string(),
    }
}

/// The built-in sample playlist.
#[must_use]
pub fn sample_playlist() -> Playlist {
    Playlist {
        title: "Sample Programming Playlist".to_string(),
        description: "Learn programming fundamentals with this comprehensive playlist"
            .to_string(),
        channel_title: "Code Academy".to_string(),
        videos: vec![
            sample_video(
                "dQw4w9WgXcQ",
                "Introduction to JavaScript - Complete Beginner Tutorial",
                "45:23",
                "Learn JavaScript basics in this comprehensive tutorial",
                "2024-01-15",
            ),
            sample_video(
                "9bZkp7q19f0",
                "React Hooks Explained - useState, useEffect, and More",
                "32:17",
                "Master React Hooks with practical examples",
                "2024-01-20",
            ),
            sample_video(
                "Ke90Tje7VS0",
                "CSS Grid & Flexbox - Modern Layout Techniques",
                "28:45",
                "Build responsive layouts with CSS Grid and Flexbox",
                "2024-01-25",
            ),
            sample_video(
                "fJeHlvw7O4s",
                "Node.js Backend Development - REST API Tutorial",
                "52:30",
                "Build a complete REST API with Node.js and Express",
                "2024-02-01",
            ),
        ],
    }
}
