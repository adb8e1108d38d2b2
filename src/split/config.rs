use crate::codec::EncodeMode;

/// Subdirectory of the album that receives tracks in direct mode.
pub const DIRECT_OUTPUT_DIR: &str = "split";
pub const OUTPUT_EXTENSION: &str = "flac";

/// Flags that drive the commit protocol. Built once at startup and only ever borrowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitConfig {
    pub delete_originals: bool,
    pub dry_run: bool,
    pub finalize_to_root: bool,
    pub overwrite_final: bool,
    pub encode_mode: EncodeMode,
}
