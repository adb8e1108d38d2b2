use crate::codec::{DEFAULT_COMPRESSION_LEVEL, EncodeMode};
use crate::split::config::SplitConfig;
use clap::Parser;
use std::path::PathBuf;

/// Splits every CUE + audio album found below ROOT into one FLAC file per track.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
#[command(
    long_about = "Splits every CUE + audio album found below ROOT into one FLAC file per track\n\nNote: sources are only deleted (with --delete-originals) once every track of the album was produced"
)]
pub struct SplitCommand {
    /// Directory tree to scan for .cue files
    #[arg(value_name = "ROOT", default_value = ".")]
    pub root: PathBuf,

    #[arg(
        long,
        short = 'd',
        help = "deletes the audio container and the .cue file once every track was produced",
        default_value_t = false
    )]
    pub delete_originals: bool,

    #[arg(
        long,
        short = 'n',
        help = "logs every move and delete decision without renaming or deleting anything",
        default_value_t = false
    )]
    pub dry_run: bool,

    #[arg(
        long,
        short = 'r',
        help = "moves the produced tracks into the album directory instead of a split/ subdirectory",
        default_value_t = false
    )]
    pub finalize_to_root: bool,

    /// Force overwrite of existing tracks in the album directory when finalizing
    #[arg(long = "overwrite", short = 'f', default_value_t = false)]
    pub overwrite_final: bool,

    /// Stream-copy the audio instead of re-encoding it (expects a FLAC container)
    #[arg(long, default_value_t = false, conflicts_with = "compression_level")]
    pub copy: bool,

    /// FLAC compression level used when re-encoding
    #[arg(
        long,
        short = 'c',
        value_name = "LEVEL",
        value_parser = clap::value_parser!(u8).range(0..=12)
    )]
    pub compression_level: Option<u8>,

    /// Path or name of the ffmpeg executable
    #[arg(long, value_name = "FFMPEG", default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,

    /// Path or name of the ffprobe executable
    #[arg(long, value_name = "FFPROBE", default_value = "ffprobe")]
    pub ffprobe: PathBuf,
}

impl SplitCommand {
    pub fn config(&self) -> SplitConfig {
        let encode_mode = if self.copy {
            EncodeMode::StreamCopy
        } else {
            EncodeMode::Reencode {
                compression_level: self
                    .compression_level
                    .unwrap_or(DEFAULT_COMPRESSION_LEVEL),
            }
        };

        SplitConfig {
            delete_originals: self.delete_originals,
            dry_run: self.dry_run,
            finalize_to_root: self.finalize_to_root,
            overwrite_final: self.overwrite_final,
            encode_mode,
        }
    }
}
