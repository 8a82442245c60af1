//! Playview - watch a YouTube playlist and keep track of what you have seen.
//!
//! This is the entry point of the terminal viewer.

mod app;
mod commands;
mod error;
mod logging;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use playview_core::{
    ConfigManager, ConfiguredFetcher, JsonFileBackend, PlaylistSession, PlaylistSource,
    ProgressStore,
};
use tracing::{error, info};

use crate::app::Viewer;
use crate::error::AppError;
use crate::logging::LoggingConfig;

/// Watch a YouTube playlist with persistent progress tracking.
#[derive(Debug, Parser)]
#[command(name = "playview", version, about)]
struct Cli {
    /// Playlist URL to load on start.
    url: Option<String>,

    /// Use the built-in sample playlist instead of the playlist service.
    #[arg(long)]
    sample: bool,

    /// Config file to use instead of the default location.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Progress file to use instead of the configured one.
    #[arg(long, value_name = "PATH")]
    progress_file: Option<PathBuf>,

    /// Directory for log files.
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Increase console log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::auto().with_verbosity(cli.verbose);
    if let Some(dir) = cli.log_dir.clone() {
        logging = logging.with_log_directory(dir);
    }
    // The viewer works without log files
    let _guard = match logging::init(&logging) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: {e}");
            None
        }
    };

    info!("Starting Playview v{}", env!("CARGO_PKG_VERSION"));

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Viewer stopped: {}", e);
            eprintln!("{}: {e}", e.title());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let manager = match cli.config {
        Some(path) => ConfigManager::with_path(path)?,
        None => ConfigManager::new()?,
    };
    info!("Config file: {}", manager.path().display());

    let mut config = manager.config().clone();
    if cli.sample {
        config.source = PlaylistSource::Sample;
    }
    if let Some(path) = cli.progress_file {
        config.progress_file = path;
    }
    config.validate()?;

    info!(
        "Playlist source: {}, progress file: {}",
        config.source,
        config.progress_file.display()
    );

    let fetcher = ConfiguredFetcher::from_config(&config)?;
    let store = ProgressStore::open(JsonFileBackend::new(&config.progress_file));
    let session = PlaylistSession::new(store).with_advance_policy(config.advance_policy());

    Viewer::new(session, fetcher, config.autoplay, std::io::stdout())
        .run(cli.url)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::parse_from([
            "playview",
            "--sample",
            "-vv",
            "--progress-file",
            "/tmp/progress.json",
            "https://www.youtube.com/playlist?list=PL1",
        ]);
        assert!(cli.sample);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.progress_file, Some(PathBuf::from("/tmp/progress.json")));
        assert_eq!(
            cli.url.as_deref(),
            Some("https://www.youtube.com/playlist?list=PL1")
        );
    }
}
