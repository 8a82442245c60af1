//! Interactive command parsing.

/// A command typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fetch a playlist by URL.
    Load(String),
    /// Show every video with its progress.
    List,
    /// Select a video by 1-based position.
    Select(usize),
    /// Advance to the next video.
    Next,
    /// Go back to the previous video.
    Previous,
    /// Toggle completion of the selected video.
    Done,
    /// Toggle completion of a video by id.
    Toggle(String),
    /// Show the current video and overall progress.
    Status,
    /// Print stored progress as JSON.
    Export,
    /// Show available commands.
    Help,
    /// Leave the viewer.
    Quit,
}

/// Help text listing every command.
pub const HELP: &str = "\
Commands:
  load <url>      load a playlist (any URL with a list= parameter)
  list            show all videos and their progress
  select <n>      play video number n
  next            next video (marks the current one as watched)
  prev            previous video
  done            toggle completion of the current video
  toggle <id>     toggle completion of a video by id
  status          show the current video and overall progress
  export          print stored progress as JSON
  help            show this help
  quit            exit";

impl Command {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns a message describing the problem for unknown commands or bad
    /// arguments.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(w, r)| (w, r.trim()));

        let command = match word.to_lowercase().as_str() {
            // The URL is validated by the session so blank input reports the same way
            "load" | "open" | "l" => Self::Load(rest.to_string()),
            "list" | "ls" => Self::List,
            "select" | "s" | "play" => Self::Select(parse_position(rest)?),
            "next" | "n" => Self::Next,
            "prev" | "previous" | "p" => Self::Previous,
            "done" | "d" => Self::Done,
            "toggle" | "t" => {
                if rest.is_empty() {
                    return Err("toggle needs a video id".to_string());
                }
                Self::Toggle(rest.to_string())
            }
            "status" | "st" => Self::Status,
            "export" => Self::Export,
            "help" | "h" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            // A pasted URL loads directly
            _ if line.contains("list=") => Self::Load(line.to_string()),
            other => return Err(format!("Unknown command '{other}' (type 'help')")),
        };
        Ok(Some(command))
    }
}

/// Parse a 1-based position into a 0-based index.
fn parse_position(arg: &str) -> Result<usize, String> {
    match arg.parse::<usize>() {
        Ok(0) | Err(_) => Err(format!("'{arg}' is not a video number (1, 2, ...)")),
        Ok(n) => Ok(n - 1),
    }
}
