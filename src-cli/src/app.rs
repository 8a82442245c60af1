//! Interactive viewer loop.
//!
//! Reads commands from stdin, applies them to the [`PlaylistSession`] and
//! prints the result. Fetches run on spawned tasks and report back through a
//! channel, so the prompt stays responsive while a playlist loads and a newer
//! `load` supersedes an older one.

use std::io::Write;

use playview_core::{
    ConfiguredFetcher, LoadOutcome, Navigation, Notice, Playlist, PlaylistFetcher,
    PlaylistSession, RequestId, Result as CoreResult, SessionStatus,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::commands::{Command, HELP};
use crate::error::AppError;
use crate::render;

/// Fetch result tagged with the request that asked for it.
type Completion = (RequestId, CoreResult<Playlist>);

const COMPLETION_BUFFER: usize = 8;

/// Whether the loop keeps running after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next command.
    Continue,
    /// Leave the loop.
    Quit,
}

/// The interactive viewer.
pub struct Viewer<W: Write> {
    session: PlaylistSession,
    fetcher: ConfiguredFetcher,
    autoplay: bool,
    out: W,
    completions_tx: mpsc::Sender<Completion>,
    completions_rx: mpsc::Receiver<Completion>,
}

impl<W: Write> Viewer<W> {
    /// Create a viewer writing to `out`.
    pub fn new(
        session: PlaylistSession,
        fetcher: ConfiguredFetcher,
        autoplay: bool,
        out: W,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::channel(COMPLETION_BUFFER);
        Self {
            session,
            fetcher,
            autoplay,
            out,
            completions_tx,
            completions_rx,
        }
    }

    /// Run until `quit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if reading stdin or writing output fails.
    pub async fn run(mut self, initial_url: Option<String>) -> Result<(), AppError> {
        let mut snapshots = self.session.subscribe();
        let mut last_status = snapshots.borrow_and_update().status;
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        writeln!(self.out, "Playlist viewer. Type 'help' for commands.")?;
        if let Some(url) = initial_url {
            self.execute(Command::Load(url))?;
        } else {
            self.show_status()?;
        }
        self.prompt()?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        debug!("Input closed");
                        break;
                    };
                    if self.handle_line(&line)? == Flow::Quit {
                        break;
                    }
                    self.prompt()?;
                }
                Some((request, result)) = self.completions_rx.recv() => {
                    writeln!(self.out)?;
                    self.apply_fetch(request, result)?;
                    self.prompt()?;
                }
                Ok(()) = snapshots.changed() => {
                    let status = snapshots.borrow_and_update().status;
                    if status != last_status {
                        debug!("Session {} -> {}", last_status, status);
                        last_status = status;
                    }
                }
            }
        }

        info!("Viewer closed");
        Ok(())
    }

    /// Parse and execute one input line.
    ///
    /// # Errors
    ///
    /// Returns an error if writing output fails.
    pub fn handle_line(&mut self, line: &str) -> Result<Flow, AppError> {
        match Command::parse(line) {
            Ok(Some(command)) => self.execute(command),
            Ok(None) => Ok(Flow::Continue),
            Err(message) => {
                writeln!(self.out, "{message}")?;
                Ok(Flow::Continue)
            }
        }
    }

    /// Execute a parsed command.
    ///
    /// # Errors
    ///
    /// Returns an error if writing output fails.
    pub fn execute(&mut self, command: Command) -> Result<Flow, AppError> {
        debug!("Executing {:?}", command);
        match command {
            Command::Load(url) => self.start_load(&url)?,
            Command::List => {
                let listing = render::playlist_listing(&self.session.snapshot());
                writeln!(self.out, "{listing}")?;
            }
            Command::Select(index) => match self.session.select_video(index) {
                Ok(()) => self.show_status()?,
                Err(e) => self.show_notice(&Notice::from(&e))?,
            },
            Command::Next => match self.session.next_video() {
                Ok(Navigation::Moved { .. }) => self.show_status()?,
                Ok(Navigation::AtBoundary) => {
                    writeln!(self.out, "Already at the last video.")?;
                }
                Err(e) => self.show_notice(&Notice::from(&e))?,
            },
            Command::Previous => match self.session.previous_video() {
                Ok(Navigation::Moved { .. }) => self.show_status()?,
                Ok(Navigation::AtBoundary) => {
                    writeln!(self.out, "Already at the first video.")?;
                }
                Err(e) => self.show_notice(&Notice::from(&e))?,
            },
            Command::Done => match self.session.toggle_current() {
                Ok(completed) => self.show_completion(completed)?,
                Err(e) => self.show_notice(&Notice::from(&e))?,
            },
            Command::Toggle(video_id) => match self.session.toggle_completion(&video_id) {
                Ok(completed) => self.show_completion(completed)?,
                Err(e) => self.show_notice(&Notice::from(&e))?,
            },
            Command::Status => self.show_status()?,
            Command::Export => {
                match serde_json::to_string_pretty(self.session.store().records()) {
                    Ok(json) => writeln!(self.out, "{json}")?,
                    Err(e) => warn!("Failed to serialize progress: {}", e),
                }
            }
            Command::Help => writeln!(self.out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Apply a finished fetch to the session.
    ///
    /// # Errors
    ///
    /// Returns an error if writing output fails.
    pub fn apply_fetch(
        &mut self,
        request: RequestId,
        result: CoreResult<Playlist>,
    ) -> Result<(), AppError> {
        match self.session.complete_request(request, result) {
            Ok(LoadOutcome::Loaded { video_count }) => {
                self.show_notice(&Notice::loaded(video_count))?;
                self.show_status()?;
            }
            Ok(LoadOutcome::Superseded) => {
                debug!("Dropped result of superseded request {}", request);
            }
            Err(e) => self.show_notice(&Notice::from(&e))?,
        }
        Ok(())
    }

    /// Wait for the next fetch result.
    #[cfg(test)]
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.completions_rx.recv().await
    }

    /// Current session.
    #[cfg(test)]
    pub const fn session(&self) -> &PlaylistSession {
        &self.session
    }

    /// Output written so far.
    #[cfg(test)]
    pub const fn output(&self) -> &W {
        &self.out
    }

    fn start_load(&mut self, url: &str) -> Result<(), AppError> {
        let pending = match self.session.begin_request(url) {
            Ok(pending) => pending,
            Err(e) => return self.show_notice(&Notice::from(&e)),
        };

        writeln!(self.out, "Loading playlist {}...", pending.playlist_id)?;
        let fetcher = self.fetcher.clone();
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = fetcher.fetch_playlist(&pending.playlist_id).await;
            if tx.send((pending.request, result)).await.is_err() {
                debug!("Viewer closed before request {} finished", pending.request);
            }
        });
        Ok(())
    }

    fn show_status(&mut self) -> Result<(), AppError> {
        let text = render::now_playing(&self.session.snapshot(), self.autoplay);
        writeln!(self.out, "{text}")?;
        Ok(())
    }

    fn show_completion(&mut self, completed: bool) -> Result<(), AppError> {
        let snapshot = self.session.snapshot();
        let state = if completed { "completed" } else { "not completed" };
        if snapshot.status == SessionStatus::Loaded {
            writeln!(
                self.out,
                "Marked as {state}. Overall progress {}%",
                snapshot.rounded_percent()
            )?;
        } else {
            writeln!(self.out, "Marked as {state}.")?;
        }
        Ok(())
    }

    fn show_notice(&mut self, notice: &Notice) -> Result<(), AppError> {
        writeln!(self.out, "{}", render::notice(notice))?;
        Ok(())
    }

    fn prompt(&mut self) -> Result<(), AppError> {
        write!(self.out, "> ")?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use playview_core::{MemoryBackend, ProgressStore, SamplePlaylistFetcher};

    const URL: &str = "https://www.youtube.com/playlist?list=PLsample";

    fn viewer() -> Viewer<Vec<u8>> {
        let session = PlaylistSession::new(ProgressStore::open(MemoryBackend::new()));
        Viewer::new(
            session,
            ConfiguredFetcher::Sample(SamplePlaylistFetcher),
            true,
            Vec::new(),
        )
    }

    fn output(viewer: &Viewer<Vec<u8>>) -> String {
        String::from_utf8_lossy(viewer.output()).into_owned()
    }

    async fn load(viewer: &mut Viewer<Vec<u8>>) {
        viewer.handle_line(&format!("load {URL}")).unwrap();
        let (request, result) = viewer.next_completion().await.unwrap();
        viewer.apply_fetch(request, result).unwrap();
    }

    #[tokio::test]
    async fn test_load_reports_video_count() {
        let mut viewer = viewer();
        load(&mut viewer).await;

        let text = output(&viewer);
        assert!(text.contains("Loading playlist PLsample..."));
        assert!(text.contains("Playlist loaded successfully!: Found 4 videos"));
        assert_eq!(viewer.session().status(), SessionStatus::Loaded);
    }

    #[tokio::test]
    async fn test_invalid_url_is_a_notice() {
        let mut viewer = viewer();
        viewer.handle_line("load https://www.youtube.com/watch?v=abc").unwrap();

        assert!(
            output(&viewer)
                .contains("Invalid playlist URL: Please enter a valid YouTube playlist URL")
        );
        assert_eq!(viewer.session().status(), SessionStatus::Empty);
    }

    #[tokio::test]
    async fn test_newer_load_supersedes_older() {
        let mut viewer = viewer();
        viewer.handle_line(&format!("load {URL}")).unwrap();
        viewer
            .handle_line("load https://www.youtube.com/playlist?list=PLnewer")
            .unwrap();

        let mut outcomes = Vec::new();
        for _ in 0..2 {
            let (request, result) = viewer.next_completion().await.unwrap();
            outcomes.push(viewer.session.complete_request(request, result).unwrap());
        }

        assert_eq!(
            outcomes.iter().filter(|o| **o == LoadOutcome::Superseded).count(),
            1
        );
        assert_eq!(viewer.session().status(), SessionStatus::Loaded);
    }

    #[tokio::test]
    async fn test_navigation_and_completion() {
        let mut viewer = viewer();
        load(&mut viewer).await;

        viewer.handle_line("next").unwrap();
        viewer.handle_line("done").unwrap();
        assert_eq!(viewer.session().aggregate_progress(), 50.0);

        viewer.handle_line("select 4").unwrap();
        viewer.handle_line("next").unwrap();
        assert!(output(&viewer).contains("Already at the last video."));
        assert!(output(&viewer).contains("Marked as completed. Overall progress 50%"));
    }

    #[tokio::test]
    async fn test_select_past_end_reports_position() {
        let mut viewer = viewer();
        load(&mut viewer).await;

        viewer.handle_line("select 9").unwrap();
        assert!(
            output(&viewer).contains("Video 9 is out of range for a playlist of 4 videos")
        );
        assert_eq!(viewer.session().current_index(), Some(0));
    }

    #[tokio::test]
    async fn test_navigation_before_load_is_rejected() {
        let mut viewer = viewer();
        viewer.handle_line("next").unwrap();
        assert!(output(&viewer).contains("Not available right now"));
    }

    #[tokio::test]
    async fn test_export_prints_records() {
        let mut viewer = viewer();
        viewer.handle_line("toggle abc").unwrap();
        viewer.handle_line("export").unwrap();

        let text = output(&viewer);
        assert!(text.contains("\"videoId\": \"abc\""));
        assert!(text.contains("\"completed\": true"));
    }

    #[tokio::test]
    async fn test_quit() {
        let mut viewer = viewer();
        assert_eq!(viewer.handle_line("quit").unwrap(), Flow::Quit);
        assert_eq!(viewer.handle_line("help").unwrap(), Flow::Continue);
    }
}
