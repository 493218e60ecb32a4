// UI layer: the read-only and control commands (now playing, playlist,
// skip, clear) and the small formatting helpers they share with `submit`.
// Everything is written to the given output sink so the binary can pass
// stdout and tests can pass a buffer.

use crate::api::ApiClient;
use crate::error::Result;
use serde::Deserialize;
use serde_json::Value;
use std::io::{self, Write};

/// One entry of the now-playing or queue listing. Every field is
/// optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Track {
    pub artist: Option<String>,
    pub title: Option<String>,
    pub file: Option<String>,
    pub time: Option<f64>,
}

impl Track {
    /// `artist - title` when both are known, else the file name, else
    /// `unknown`.
    pub fn display_name(&self) -> String {
        match (&self.artist, &self.title, &self.file) {
            (Some(artist), Some(title), _) => format!("{} - {}", artist, title),
            (_, _, Some(file)) => file.clone(),
            _ => "unknown".to_string(),
        }
    }
}

/// `text` of a listing response: the entries, or a message when the
/// server has something else to say (e.g. an error envelope).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListingText {
    Tracks(Vec<Track>),
    Message(Value),
}

impl Default for ListingText {
    fn default() -> Self {
        ListingText::Tracks(Vec::new())
    }
}

#[derive(Debug, Deserialize)]
struct Listing {
    #[serde(default)]
    text: ListingText,
}

/// Fetch a listing. A non-list `text` is printed and yields `None`.
fn fetch_tracks(api: &ApiClient, path: &str, out: &mut dyn Write) -> Result<Option<Vec<Track>>> {
    let Some(listing) = api.get::<Listing>(out, path)? else {
        return Ok(None);
    };
    match listing.text {
        ListingText::Tracks(tracks) => Ok(Some(tracks)),
        ListingText::Message(text) => {
            write_text(out, &text)?;
            Ok(None)
        }
    }
}

/// Render whole seconds as `1h 2m 5s`, dropping leading zero units.
pub fn format_time(secs: u64) -> String {
    let mut parts = Vec::with_capacity(3);
    let mut rest = secs;
    if rest >= 3600 {
        parts.push(format!("{}h", rest / 3600));
        rest %= 3600;
    }
    if rest >= 60 || !parts.is_empty() {
        parts.push(format!("{}m", rest / 60));
        rest %= 60;
    }
    parts.push(format!("{}s", rest));
    parts.join(" ")
}

/// Print a server `text` field: strings as-is, other JSON compactly,
/// nothing for null.
pub fn write_text(out: &mut dyn Write, text: &Value) -> io::Result<()> {
    match text {
        Value::Null => Ok(()),
        Value::String(s) => writeln!(out, "{}", s),
        other => writeln!(out, "{}", other),
    }
}

/// `np`: show the song currently playing.
pub fn now_playing(api: &ApiClient, out: &mut dyn Write) -> Result<()> {
    let Some(tracks) = fetch_tracks(api, "/song", out)? else {
        return Ok(());
    };
    match tracks.first() {
        Some(track) => writeln!(
            out,
            "Now playing: {} - {} ({} seconds)",
            track.artist.as_deref().unwrap_or("unknown"),
            track.title.as_deref().unwrap_or("unknown"),
            track.time.map(|t| t as u64).unwrap_or(0)
        )?,
        None => writeln!(out, "Nothing is playing")?,
    }
    Ok(())
}

/// `playlist`: list the next `count` queue entries.
pub fn playlist(api: &ApiClient, count: u32, out: &mut dyn Write) -> Result<()> {
    let path = format!("/queue/{}", count);
    let Some(tracks) = fetch_tracks(api, &path, out)? else {
        return Ok(());
    };
    for (i, track) in tracks.iter().enumerate() {
        let time_part = track
            .time
            .map(|t| format!(" ({})", format_time(t as u64)))
            .unwrap_or_default();
        writeln!(out, "Queue #{}: {}{}", i, track.display_name(), time_part)?;
    }
    Ok(())
}

/// `skip`: drop the current song.
pub fn skip(api: &ApiClient, out: &mut dyn Write) -> Result<()> {
    delete_and_print(api, "/song", out)
}

/// `clear`: empty the queue.
pub fn clear(api: &ApiClient, out: &mut dyn Write) -> Result<()> {
    delete_and_print(api, "/queue", out)
}

fn delete_and_print(api: &ApiClient, path: &str, out: &mut dyn Write) -> Result<()> {
    if let Some(response) = api.delete::<Value>(out, path)? {
        writeln!(out, "{}", response)?;
    }
    Ok(())
}
