use clap::Parser;
use std::path::PathBuf;

/// Prints how a single .cue file would be split, without encoding anything.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
pub struct PlanCommand {
    /// Input .cue file
    #[arg(value_name = "INPUT_CUE")]
    pub input_cue: PathBuf,

    /// Path or name of the ffprobe executable
    #[arg(long, value_name = "FFPROBE", default_value = "ffprobe")]
    pub ffprobe: PathBuf,
}
