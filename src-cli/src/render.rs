//! Text rendering of session snapshots.
//!
//! Every function here is a pure function of a [`SessionSnapshot`] (or a
//! [`Notice`]); the viewer keeps no presentation state of its own.

use std::fmt::Write as _;

use playview_core::{Notice, SessionSnapshot, SessionStatus, VideoEntry, embed_url};

const BAR_WIDTH: usize = 20;

/// Render a progress bar for a percentage in `[0, 100]`.
pub fn progress_bar(percent: f64) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

/// One-block summary: playlist, overall progress and the selected video.
pub fn now_playing(snapshot: &SessionSnapshot, autoplay: bool) -> String {
    match snapshot.status {
        SessionStatus::Empty => {
            "No playlist loaded. Paste a playlist URL or type 'load <url>'.".to_string()
        }
        SessionStatus::Loading => "Loading playlist...".to_string(),
        SessionStatus::Loaded => {
            let mut out = String::new();
            if let Some(playlist) = snapshot.playlist.as_deref() {
                let _ = writeln!(out, "{} - {}", playlist.title, playlist.channel_title);
            }
            let _ = writeln!(
                out,
                "Overall Progress {} {}%",
                progress_bar(snapshot.progress_percent),
                snapshot.rounded_percent()
            );
            if let Some(video) = snapshot.current_video() {
                let done = snapshot
                    .entries
                    .get(snapshot.current_index)
                    .is_some_and(|e| e.progress.completed);
                let _ = writeln!(
                    out,
                    "> {} [{}]{}",
                    video.title,
                    video.duration,
                    if done { " (completed)" } else { "" }
                );
                let _ = writeln!(out, "  {}", embed_url(&video.id, autoplay));
            }
            if let Some(label) = snapshot.position_label() {
                let _ = write!(out, "  {label}");
            }
            if !snapshot.persisted {
                let _ = write!(
                    out,
                    "\n  (progress could not be saved; it is kept for this session)"
                );
            }
            out
        }
    }
}

/// The sidebar: every video with its completion mark.
pub fn playlist_listing(snapshot: &SessionSnapshot) -> String {
    let Some(playlist) = snapshot.playlist.as_deref() else {
        return "No playlist loaded.".to_string();
    };

    let mut out = String::new();
    for (video, entry) in playlist.videos.iter().zip(&snapshot.entries) {
        let _ = writeln!(
            out,
            "{} {:>3}. {} {} [{}]{}",
            if entry.is_current { ">" } else { " " },
            entry.index + 1,
            completion_mark(entry),
            video.title,
            video.duration,
            partial_suffix(entry),
        );
    }
    out.trim_end().to_string()
}

fn completion_mark(entry: &VideoEntry) -> &'static str {
    if entry.progress.completed { "[x]" } else { "[ ]" }
}

fn partial_suffix(entry: &VideoEntry) -> String {
    entry
        .progress
        .partial_fraction()
        .map(|f| format!(" {:.0}% watched", f * 100.0))
        .unwrap_or_default()
}

/// Render a notice as "title: message".
pub fn notice(notice: &Notice) -> String {
    format!("{}: {}", notice.title, notice.message)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use playview_core::{MemoryBackend, PlaylistSession, ProgressStore, sample_playlist};

    fn loaded() -> PlaylistSession {
        let mut session = PlaylistSession::new(ProgressStore::open(MemoryBackend::new()));
        let pending = session
            .begin_request("https://www.youtube.com/playlist?list=PLsample")
            .unwrap();
        session
            .complete_request(pending.request, Ok(sample_playlist()))
            .unwrap();
        session
    }

    #[test]
    fn test_progress_bar_bounds() {
        assert_eq!(progress_bar(0.0), format!("[{}]", "-".repeat(20)));
        assert_eq!(progress_bar(100.0), format!("[{}]", "#".repeat(20)));
        assert_eq!(
            progress_bar(25.0),
            format!("[{}{}]", "#".repeat(5), "-".repeat(15))
        );
        assert_eq!(progress_bar(250.0), progress_bar(100.0));
    }

    #[test]
    fn test_now_playing_empty() {
        let session = PlaylistSession::new(ProgressStore::open(MemoryBackend::new()));
        assert!(now_playing(&session.snapshot(), true).starts_with("No playlist loaded"));
    }

    #[test]
    fn test_now_playing_loaded() {
        let mut session = loaded();
        session.next_video().unwrap();
        let text = now_playing(&session.snapshot(), true);

        assert!(text.contains("Sample Programming Playlist - Code Academy"));
        assert!(text.contains("25%"));
        assert!(text.contains("> React Hooks Explained"));
        assert!(
            text.contains("https://www.youtube.com/embed/9bZkp7q19f0?autoplay=1&rel=0")
        );
        assert!(text.contains("Video 2 of 4"));
    }

    #[test]
    fn test_listing_marks_current_and_completed() {
        let mut session = loaded();
        session.next_video().unwrap();
        let text = playlist_listing(&session.snapshot());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("[x]"));
        assert!(lines[1].starts_with('>'));
        assert!(lines[1].contains("[ ]"));
    }

    #[test]
    fn test_notice_format() {
        let text = notice(&Notice::loaded(4));
        assert_eq!(text, "Playlist loaded successfully!: Found 4 videos");
    }
}
