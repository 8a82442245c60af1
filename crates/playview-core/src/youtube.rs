//! `YouTube` URL handling.
//!
//! Extracts playlist identifiers from user-supplied URLs and builds the URLs
//! the presentation layer hands to the embedded player.

use regex::Regex;

use crate::error::{Result, UrlError};

/// Base URL of the embeddable player.
pub const EMBED_BASE_URL: &str = "https://www.youtube.com/embed";

/// `list=` preceded by `?` or `&`, value running up to `#`, `&` or `?`.
const LIST_PARAM_PATTERN: &str = r"[?&]list=([^#&?]*)";

/// Extract the playlist identifier from a `YouTube` URL.
///
/// The identifier is the value of the first `list` query parameter. Anything
/// before it is ignored, so watch URLs, short URLs and bare playlist URLs all
/// work:
///
/// ```
/// use playview_core::youtube::extract_playlist_id;
///
/// let id = extract_playlist_id("https://www.youtube.com/watch?v=abc&list=PL123&index=2");
/// assert_eq!(id.unwrap(), "PL123");
/// ```
///
/// # Errors
///
/// Returns [`UrlError::Blank`] for blank input and
/// [`UrlError::MissingListParameter`] when no non-empty `list` value is present.
pub fn extract_playlist_id(url: &str) -> Result<String> {
    if url.trim().is_empty() {
        return Err(UrlError::Blank.into());
    }

    Regex::new(LIST_PARAM_PATTERN)
        .ok()
        .and_then(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            UrlError::MissingListParameter {
                url: url.to_string(),
            }
            .into()
        })
}

/// URL of the embeddable player for a video.
#[must_use]
pub fn embed_url(video_id: &str, autoplay: bool) -> String {
    let autoplay = u8::from(autoplay);
    format!("{EMBED_BASE_URL}/{video_id}?autoplay={autoplay}&rel=0")
}

/// Canonical playlist page URL for an identifier.
#[must_use]
pub fn playlist_url(playlist_id: &str) -> String {
    format!("https://www.youtube.com/playlist?list={playlist_id}")
}
