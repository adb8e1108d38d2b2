// src/cue/models
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

pub const FRAMES_PER_SECOND: u64 = 75;

lazy_static! {
    static ref TIMESTAMP: Regex = Regex::new(r"^(\d+):(\d+):(\d+)$").unwrap();
}

/// One track-list file. Built fresh per album and dropped after the split.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Disc {
    pub performer: Option<String>,
    pub title: Option<String>,
    pub remarks: BTreeMap<String, String>,
    pub container_reference: Option<String>,
    pub container_kind: Option<String>,
    /// Distinct container names seen across every FILE directive, in appearance order.
    pub container_references_seen: Vec<String>,
    pub tracks: Vec<Track>,
}

impl Disc {
    pub fn remark(&self, key: &str) -> Option<&str> {
        self.remarks.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Track {
    pub number: u32,
    pub kind: String,
    /// Zero-padded index label ("00", "01", ...) to the raw `MM:SS:FF` token.
    pub indices: BTreeMap<String, String>,
    pub performer: Option<String>,
    pub title: Option<String>,
}

impl Track {
    /// INDEX 01 when declared, otherwise the pre-gap INDEX 00.
    pub fn start_token(&self) -> Option<&str> {
        self.indices
            .get("01")
            .or_else(|| self.indices.get("00"))
            .map(String::as_str)
    }

    pub fn start(&self) -> Option<Timestamp> {
        self.start_token().and_then(Timestamp::parse)
    }
}

/// `MM:SS:FF` position, frames at 75 per second, held as whole milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    millis: u64,
}

impl Timestamp {
    pub fn parse(token: &str) -> Option<Self> {
        let caps = TIMESTAMP.captures(token.trim())?;
        let minutes: u64 = caps[1].parse().ok()?;
        let seconds: u64 = caps[2].parse().ok()?;
        let frames: u64 = caps[3].parse().ok()?;

        let whole = minutes.checked_mul(60)?.checked_add(seconds)?;
        let frame_millis =
            (frames.checked_mul(1000)? + FRAMES_PER_SECOND / 2) / FRAMES_PER_SECOND;

        Some(Self {
            millis: whole.checked_mul(1000)?.checked_add(frame_millis)?,
        })
    }

    pub fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    /// Rounds to the nearest millisecond; negative or non-finite input is rejected.
    pub fn from_seconds(seconds: f64) -> Option<Self> {
        if !seconds.is_finite() || seconds < 0.0 {
            return None;
        }
        Some(Self {
            millis: (seconds * 1000.0).round() as u64,
        })
    }

    pub fn as_millis(&self) -> u64 {
        self.millis
    }
}

/// Renders seconds with exactly three decimals, the form handed to the codec.
pub fn format_seconds(millis: u64) -> String {
    format!("{}.{:03}", millis / 1000, millis % 1000)
}
