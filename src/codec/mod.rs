use crate::codec::error::{CodecError, CodecResult};
use crate::cue::models::{Timestamp, format_seconds};
use crate::error::{CueSplitError, CueSplitResult};
use log::debug;
use serde::Deserialize;
use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

pub mod error;

pub const DEFAULT_COMPRESSION_LEVEL: u8 = 8;

/// How the encoder produces each track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeMode {
    Reencode { compression_level: u8 },
    StreamCopy,
}

impl Default for EncodeMode {
    fn default() -> Self {
        Self::Reencode {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

/// Tags written to a produced track; any pre-existing metadata is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: String,
    pub track: u32,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
    pub date: Option<String>,
    pub genre: Option<String>,
}

impl TrackMetadata {
    pub fn tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![
            ("TITLE", self.title.clone()),
            ("TRACK", self.track.to_string()),
        ];

        let optional = [
            ("ARTIST", &self.artist),
            ("ALBUM", &self.album),
            ("ALBUM_ARTIST", &self.album_artist),
            ("DATE", &self.date),
            ("GENRE", &self.genre),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                tags.push((key, value.clone()));
            }
        }

        tags
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeRequest {
    pub input: PathBuf,
    pub start: Timestamp,
    pub duration: Timestamp,
    pub metadata: TrackMetadata,
    pub output: PathBuf,
    pub mode: EncodeMode,
}

/// The external audio service. Production uses [`FfmpegCodec`]; tests swap in fakes.
pub trait AudioCodec {
    fn probe_duration(&self, input: &Path) -> impl Future<Output = CodecResult<Timestamp>>;

    fn encode_segment(&self, request: &EncodeRequest) -> impl Future<Output = CodecResult<()>>;
}

#[derive(Debug, Clone)]
pub struct FfmpegCodec {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

impl FfmpegCodec {
    /// Verifies both tools can be spawned. Missing tools abort the run.
    pub async fn locate(ffmpeg: PathBuf, ffprobe: PathBuf) -> CueSplitResult<Self> {
        check_tool(&ffmpeg).await?;
        check_tool(&ffprobe).await?;

        Ok(Self::new(ffmpeg, ffprobe))
    }

    pub fn new(ffmpeg: PathBuf, ffprobe: PathBuf) -> Self {
        Self { ffmpeg, ffprobe }
    }
}

pub async fn check_tool(tool: &Path) -> CueSplitResult<()> {
    let status = Command::new(tool)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|_| CueSplitError::MissingTool(tool.to_path_buf()))?;

    if !status.success() {
        return Err(CueSplitError::MissingTool(tool.to_path_buf()));
    }

    debug!("Found external tool: {tool:?}");
    Ok(())
}

impl AudioCodec for FfmpegCodec {
    async fn probe_duration(&self, input: &Path) -> CodecResult<Timestamp> {
        let output = Command::new(&self.ffprobe)
            .arg("-v")
            .arg("quiet")
            .arg("-print_format")
            .arg("json")
            .arg("-show_format")
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(CodecError::ToolFailed {
                tool: self.ffprobe.display().to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_probe_duration(&output.stdout)
            .ok_or_else(|| CodecError::MissingDuration(input.to_path_buf()))
    }

    async fn encode_segment(&self, request: &EncodeRequest) -> CodecResult<()> {
        debug!("Running {:?} {:?}", self.ffmpeg, encode_args(request));

        let output = Command::new(&self.ffmpeg)
            .args(encode_args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(CodecError::ToolFailed {
                tool: self.ffmpeg.display().to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

fn parse_probe_duration(stdout: &[u8]) -> Option<Timestamp> {
    let probe: ProbeOutput = serde_json::from_slice(stdout).ok()?;
    let seconds = probe.format?.duration?.trim().parse::<f64>().ok()?;
    Timestamp::from_seconds(seconds).filter(|duration| duration.as_millis() > 0)
}

pub fn encode_args(request: &EncodeRequest) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-hide_banner",
        "-nostdin",
        "-loglevel",
        "error",
        "-y",
        "-ss",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();

    args.push(format_seconds(request.start.as_millis()).into());
    args.push("-t".into());
    args.push(format_seconds(request.duration.as_millis()).into());
    args.push("-i".into());
    args.push(request.input.clone().into_os_string());
    args.extend(["-map", "0:a", "-map_metadata", "-1"].map(OsString::from));

    for (key, value) in request.metadata.tags() {
        args.push("-metadata".into());
        args.push(format!("{key}={value}").into());
    }

    match request.mode {
        EncodeMode::Reencode { compression_level } => {
            args.extend(["-c:a", "flac", "-compression_level"].map(OsString::from));
            args.push(compression_level.to_string().into());
        }
        EncodeMode::StreamCopy => {
            args.extend(["-c", "copy"].map(OsString::from));
        }
    }

    args.push(request.output.clone().into_os_string());
    args
}
