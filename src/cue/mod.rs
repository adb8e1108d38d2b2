use crate::cue::error::{CueError, CueResult};
use crate::cue::models::{Disc, Track};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

pub mod encoding;
pub mod error;
pub mod models;

/// Container extensions the encoder is expected to read.
pub const SUPPORTED_CONTAINER_EXTENSIONS: [&str; 9] = [
    "flac", "wav", "wave", "ape", "wv", "tta", "aiff", "aif", "m4a",
];

lazy_static! {
    static ref REM: Regex = Regex::new(r"(?i)^REM\s+(\S+)(?:\s+(.*))?$").unwrap();
    static ref PERFORMER: Regex = Regex::new(r"(?i)^PERFORMER\s+(.+)$").unwrap();
    static ref TITLE: Regex = Regex::new(r"(?i)^TITLE\s+(.+)$").unwrap();
    static ref FILE: Regex =
        Regex::new(r#"(?i)^FILE\s+(?:"(.+)"|(\S+))\s+(\S+)$"#).unwrap();
    static ref TRACK: Regex = Regex::new(r"(?i)^TRACK\s+(\d+)\s+(\S+)$").unwrap();
    static ref INDEX: Regex = Regex::new(r"(?i)^INDEX\s+(\d+)\s+(\S+)$").unwrap();
}

/// Line-oriented track-list parser. Unknown or malformed lines are ignored, so
/// parsing itself never fails; usability is checked afterwards by [`container_of`].
#[derive(Debug, Default)]
pub struct CueParser {
    disc: Disc,
    current_track: Option<usize>,
}

impl CueParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse<I, S>(lines: I) -> Disc
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parser = Self::new();
        for line in lines {
            parser.feed_line(line.as_ref());
        }
        parser.finish()
    }

    pub fn feed_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        if let Some(caps) = REM.captures(line) {
            let value = caps.get(2).map_or("", |m| m.as_str().trim());
            self.disc
                .remarks
                .insert(caps[1].to_uppercase(), unquote(value).to_string());
        } else if let Some(caps) = PERFORMER.captures(line) {
            let performer = Some(unquote(&caps[1]).to_string());
            match self.current_track_mut() {
                Some(track) => track.performer = performer,
                None => self.disc.performer = performer,
            }
        } else if let Some(caps) = TITLE.captures(line) {
            let title = Some(unquote(&caps[1]).to_string());
            match self.current_track_mut() {
                Some(track) => track.title = title,
                None => self.disc.title = title,
            }
        } else if let Some(caps) = FILE.captures(line) {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map_or("", |m| m.as_str())
                .to_string();
            if !self.disc.container_references_seen.contains(&name) {
                self.disc.container_references_seen.push(name.clone());
            }
            self.disc.container_reference = Some(name);
            self.disc.container_kind = Some(caps[3].to_uppercase());
        } else if let Some(caps) = TRACK.captures(line) {
            let Ok(number) = caps[1].parse::<u32>() else {
                return;
            };
            self.disc.tracks.push(Track {
                number,
                kind: caps[2].to_uppercase(),
                ..Track::default()
            });
            self.current_track = Some(self.disc.tracks.len() - 1);
        } else if let Some(caps) = INDEX.captures(line) {
            let Ok(label) = caps[1].parse::<u32>() else {
                return;
            };
            let timestamp = caps[2].to_string();
            if let Some(track) = self.current_track_mut() {
                track.indices.insert(format!("{label:02}"), timestamp);
            }
        }
    }

    pub fn finish(self) -> Disc {
        self.disc
    }

    fn current_track_mut(&mut self) -> Option<&mut Track> {
        self.current_track
            .and_then(|index| self.disc.tracks.get_mut(index))
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Returns the single container this disc can be split from.
pub fn container_of(disc: &Disc) -> CueResult<&str> {
    if disc.container_references_seen.len() > 1 {
        return Err(CueError::MultipleContainers(
            disc.container_references_seen.clone(),
        ));
    }

    let container = disc
        .container_reference
        .as_deref()
        .filter(|name| !name.is_empty())
        .ok_or(CueError::NoContainerReference)?;

    if disc.tracks.is_empty() {
        return Err(CueError::NoTracks);
    }

    let normalized = container.replace('\\', "/");
    let extension = Path::new(&normalized)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if !SUPPORTED_CONTAINER_EXTENSIONS.contains(&extension.as_str()) {
        return Err(CueError::UnsupportedContainerType(container.to_string()));
    }

    Ok(container)
}
