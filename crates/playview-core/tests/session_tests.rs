//! End-to-end tests for the playlist session and its persisted progress.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::VecDeque;
use std::sync::Mutex;

use playview_core::{
    Error, ErrorKind, JsonFileBackend, LoadOutcome, MemoryBackend, Navigation, Notice, Playlist,
    PlaylistFetcher, PlaylistSession, ProgressMap, ProgressStore, Result, SessionStatus, Video,
    WatchProgress, extract_playlist_id, sample_playlist,
};
use tempfile::TempDir;

/// Answers fetches from a queue of canned results and records what was asked.
#[derive(Default)]
struct ScriptedFetcher {
    responses: Mutex<VecDeque<Result<Playlist>>>,
    requested: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    fn with(responses: Vec<Result<Playlist>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requested: Mutex::default(),
        }
    }

    fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl PlaylistFetcher for ScriptedFetcher {
    async fn fetch_playlist(&self, playlist_id: &str) -> Result<Playlist> {
        self.requested.lock().unwrap().push(playlist_id.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::network_error("no scripted response")))
    }
}

fn playlist_of(ids: &[&str]) -> Playlist {
    Playlist {
        title: "Test Playlist".to_string(),
        description: String::new(),
        channel_title: "Tester".to_string(),
        videos: ids
            .iter()
            .map(|id| Video {
                id: (*id).to_string(),
                title: format!("Video {id}"),
                thumbnail: String::new(),
                duration: "1:00".to_string(),
                description: String::new(),
                channel_title: "Tester".to_string(),
                published_at: "2024-01-01".to_string(),
            })
            .collect(),
    }
}

fn memory_session() -> PlaylistSession {
    PlaylistSession::new(ProgressStore::open(MemoryBackend::new()))
}

const URL: &str = "https://www.youtube.com/playlist?list=PLtest";

#[test]
fn test_extracts_identifier_from_common_shapes() {
    for url in [
        "https://www.youtube.com/playlist?list=ABC123",
        "https://www.youtube.com/watch?v=x&list=ABC123&foo=1",
        "https://www.youtube.com/watch?v=x&list=ABC123#t=10",
    ] {
        assert_eq!(extract_playlist_id(url).unwrap(), "ABC123", "url {url}");
    }
}

#[tokio::test]
async fn test_blank_or_listless_url_keeps_session_empty() {
    let fetcher = ScriptedFetcher::default();
    let mut session = memory_session();

    for url in ["", "https://www.youtube.com/watch?v=dQw4w9WgXcQ"] {
        let err = session.request_playlist(&fetcher, url).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidUrl);
        assert_eq!(session.status(), SessionStatus::Empty);
    }
    assert!(fetcher.requested().is_empty(), "no fetch for invalid input");
}

#[tokio::test]
async fn test_successful_fetch_starts_at_first_video() {
    let fetcher = ScriptedFetcher::with(vec![Ok(playlist_of(&["a", "b", "c"]))]);
    let mut session = memory_session();

    let outcome = session.request_playlist(&fetcher, URL).await.unwrap();

    assert_eq!(outcome, LoadOutcome::Loaded { video_count: 3 });
    assert_eq!(fetcher.requested(), vec!["PLtest".to_string()]);
    assert_eq!(session.current_index(), Some(0));
    assert_eq!(session.aggregate_progress(), 0.0);
}

#[tokio::test]
async fn test_next_through_playlist() {
    let fetcher = ScriptedFetcher::with(vec![Ok(playlist_of(&["a", "b", "c"]))]);
    let mut session = memory_session();
    session.request_playlist(&fetcher, URL).await.unwrap();

    assert_eq!(
        session.next_video().unwrap(),
        Navigation::Moved { from: 0, to: 1 }
    );
    assert!(session.video_progress("a").completed);
    assert_eq!(session.current_index(), Some(1));

    session.next_video().unwrap();
    assert!(session.video_progress("b").completed);
    assert_eq!(session.current_index(), Some(2));

    // The last video is never auto-completed
    assert_eq!(session.next_video().unwrap(), Navigation::AtBoundary);
    assert_eq!(session.current_index(), Some(2));
    assert!(!session.video_progress("c").completed);
}

#[tokio::test]
async fn test_previous_never_changes_completion() {
    let fetcher = ScriptedFetcher::with(vec![Ok(playlist_of(&["a", "b", "c"]))]);
    let mut session = memory_session();
    session.request_playlist(&fetcher, URL).await.unwrap();

    assert_eq!(session.previous_video().unwrap(), Navigation::AtBoundary);
    assert_eq!(session.current_index(), Some(0));

    session.select_video(2).unwrap();
    let before = session.store().records().clone();
    session.previous_video().unwrap();
    assert_eq!(session.current_index(), Some(1));
    assert_eq!(session.store().records(), &before);
}

#[test]
fn test_toggle_twice_restores_record() {
    let backend = MemoryBackend::new();
    let mut seeded = ProgressMap::new();
    seeded.insert(
        "a".to_string(),
        WatchProgress {
            video_id: "a".to_string(),
            current_time: 42.0,
            duration: 600.0,
            completed: false,
        },
    );
    ProgressStore::open(backend.clone()).save(seeded);

    let mut session = PlaylistSession::new(ProgressStore::open(backend));
    let original = session.video_progress("a");

    assert!(session.toggle_completion("a").unwrap());
    assert!(!session.toggle_completion("a").unwrap());
    assert_eq!(session.video_progress("a"), original);
}

#[test]
fn test_save_then_load_round_trips_on_disk() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("youtube-playlist-progress.json");

    let mut map = ProgressMap::new();
    map.insert("a".to_string(), WatchProgress::watched_fully("a"));
    map.insert(
        "b".to_string(),
        WatchProgress {
            video_id: "b".to_string(),
            current_time: 90.5,
            duration: 1800.0,
            completed: false,
        },
    );

    let mut store = ProgressStore::open(JsonFileBackend::new(&path));
    store.save(map.clone());

    assert_eq!(store.load(), map);
    assert_eq!(ProgressStore::open(JsonFileBackend::new(&path)).load(), map);
}

#[tokio::test]
async fn test_quarter_progress() {
    let fetcher = ScriptedFetcher::with(vec![Ok(playlist_of(&["a", "b", "c", "d"]))]);
    let mut session = memory_session();
    session.request_playlist(&fetcher, URL).await.unwrap();

    session.toggle_completion("c").unwrap();
    // Progress for videos outside the playlist does not count
    session.toggle_completion("elsewhere").unwrap();

    assert_eq!(session.aggregate_progress(), 25.0);
    assert_eq!(session.snapshot().rounded_percent(), 25);
}

#[tokio::test]
async fn test_failed_fetch_then_retry() {
    let fetcher = ScriptedFetcher::with(vec![
        Err(Error::service_error("Service unavailable")),
        Ok(playlist_of(&["a", "b"])),
    ]);
    let mut session = memory_session();

    let err = session.request_playlist(&fetcher, URL).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FetchFailed);
    assert_eq!(Notice::from(&err).message, "Service unavailable");
    assert_eq!(session.status(), SessionStatus::Empty);
    assert!(session.playlist().is_none());

    let outcome = session.request_playlist(&fetcher, URL).await.unwrap();
    assert_eq!(outcome, LoadOutcome::Loaded { video_count: 2 });
    assert_eq!(session.status(), SessionStatus::Loaded);
}

#[tokio::test]
async fn test_failed_refetch_drops_previous_playlist() {
    let fetcher = ScriptedFetcher::with(vec![
        Ok(sample_playlist()),
        Err(Error::network_error("connection reset")),
    ]);
    let mut session = memory_session();
    session.request_playlist(&fetcher, URL).await.unwrap();

    session.request_playlist(&fetcher, URL).await.unwrap_err();
    assert_eq!(session.status(), SessionStatus::Empty);
    assert!(session.next_video().is_err());
}

#[tokio::test]
async fn test_progress_survives_restart() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("progress.json");

    {
        let fetcher = ScriptedFetcher::with(vec![Ok(playlist_of(&["a", "b", "c", "d"]))]);
        let mut session = PlaylistSession::new(ProgressStore::open(JsonFileBackend::new(&path)));
        session.request_playlist(&fetcher, URL).await.unwrap();
        session.next_video().unwrap();
        session.toggle_current().unwrap();
    }

    let fetcher = ScriptedFetcher::with(vec![Ok(playlist_of(&["a", "b", "c", "d"]))]);
    let mut session = PlaylistSession::new(ProgressStore::open(JsonFileBackend::new(&path)));
    session.request_playlist(&fetcher, URL).await.unwrap();

    assert!(session.video_progress("a").completed);
    assert!(session.video_progress("b").completed);
    assert_eq!(session.aggregate_progress(), 50.0);
}

#[tokio::test]
async fn test_unwritable_storage_does_not_block_session() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    // A directory where the progress file should be makes every write fail
    let path = temp_dir.path().join("progress.json");
    std::fs::create_dir_all(&path).unwrap();

    let fetcher = ScriptedFetcher::with(vec![Ok(playlist_of(&["a", "b"]))]);
    let mut session = PlaylistSession::new(ProgressStore::open(JsonFileBackend::new(&path)));
    session.request_playlist(&fetcher, URL).await.unwrap();

    session.next_video().unwrap();
    assert!(session.video_progress("a").completed);
    assert!(!session.snapshot().persisted);
}
