use crate::codec::{AudioCodec, EncodeRequest, FfmpegCodec, TrackMetadata, check_tool};
use crate::commands::plan::PlanCommand;
use crate::commands::split::SplitCommand;
use crate::cue::encoding::decode_lines;
use crate::cue::models::{Disc, Timestamp, format_seconds};
use crate::cue::{CueParser, container_of};
use crate::error::CueSplitError;
use crate::split::commit::{CommitReport, CommitState, StagedCommit};
use crate::split::config::{OUTPUT_EXTENSION, SplitConfig};
use crate::split::error::{SplitError, SplitResult};
use crate::split::plan::{PlanEntry, SplitPlan, resolve_plan};
use crate::split::sanitize::sanitize_file_name;
use crate::split::status::Status;
use crate::util::fs::{find_track_lists, native_path, resolve_relative};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::debug;
use std::path::{Path, PathBuf};
use tokio::fs;

pub mod commit;
pub mod config;
pub mod error;
pub mod plan;
pub mod sanitize;
pub mod status;

/// Everything known about an album before any output is written.
#[derive(Debug, Clone)]
pub struct PreparedAlbum {
    pub album_dir: PathBuf,
    pub track_list: PathBuf,
    pub container: PathBuf,
    pub disc: Disc,
    pub total: Timestamp,
    pub plan: SplitPlan,
}

/// Reads, parses and validates a track-list, resolves its container and computes the
/// split plan. Per-track timing problems are logged and left out of the plan.
pub async fn prepare_album<C: AudioCodec>(
    track_list: &Path,
    codec: &C,
) -> SplitResult<PreparedAlbum> {
    let album_dir = track_list
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let data = fs::read(track_list)
        .await
        .map_err(|source| SplitError::TrackListUnreadable {
            path: track_list.to_path_buf(),
            source,
        })?;

    let disc = CueParser::parse(decode_lines(&data));
    let container_name = container_of(&disc).map_err(|source| SplitError::InvalidTrackList {
        path: track_list.to_path_buf(),
        source,
    })?;

    let container = resolve_relative(&album_dir, container_name).await;
    if !fs::try_exists(&container).await.unwrap_or(false) {
        return Err(SplitError::ContainerNotFound(container));
    }
    debug!(
        "Resolved container {container_name:?} ({}) to {container:?}",
        disc.container_kind.as_deref().unwrap_or("unknown type")
    );

    let total = codec
        .probe_duration(&container)
        .await
        .map_err(|source| SplitError::DurationProbeFailure {
            path: container.clone(),
            source,
        })?;

    let plan = resolve_plan(&disc, total);
    for warning in &plan.warnings {
        Status::Skip.log(format!("{track_list:?}: {warning}"));
    }

    Ok(PreparedAlbum {
        album_dir,
        track_list: track_list.to_path_buf(),
        container,
        disc,
        total,
        plan,
    })
}

/// Splits one album end to end: prepare, encode every planned track, then let the
/// commit protocol decide what to finalize and delete.
pub async fn split_album<C: AudioCodec>(
    track_list: &Path,
    config: &SplitConfig,
    codec: &C,
    progress: &ProgressBar,
) -> SplitResult<CommitReport> {
    let album = prepare_album(track_list, codec).await?;
    Status::Info.log(format!(
        "{:?}: {} track(s) planned from {:?}",
        album.track_list,
        album.plan.planned_count(),
        album.container
    ));

    let mut commit = StagedCommit::new(
        config,
        &album.album_dir,
        &album.container,
        &album.track_list,
    );

    let requests: Vec<EncodeRequest> = album
        .plan
        .entries
        .iter()
        .map(|entry| EncodeRequest {
            input: album.container.clone(),
            start: entry.start,
            duration: entry.duration,
            metadata: track_metadata(&album.disc, entry),
            output: commit.output_path(&entry.output_base_name),
            mode: config.encode_mode,
        })
        .collect();

    let state = commit.stage(codec, &requests, progress).await?;
    debug!(
        "{:?} reached {state:?} in {:?}",
        album.track_list,
        commit.staging_dir()
    );

    Ok(commit.finish().await)
}

/// Walks `cmd.root` and splits every album found, one after the other. Only a missing
/// external tool or an unusable root aborts; album failures are logged and skipped.
pub async fn split_tree(progress: MultiProgress, cmd: SplitCommand) -> anyhow::Result<()> {
    let config = cmd.config();
    let codec = FfmpegCodec::locate(cmd.ffmpeg.clone(), cmd.ffprobe.clone()).await?;

    let root = native_path(&cmd.root);
    let is_dir = fs::metadata(&root)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return Err(CueSplitError::RootNotADirectory(root).into());
    }

    let track_lists = find_track_lists(&root).await?;
    Status::Info.log(format!(
        "found {} track-list(s) below {root:?}",
        track_lists.len()
    ));
    if config.dry_run {
        Status::Dry.log("no file will be moved or deleted");
    }

    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar());

    let (mut complete, mut partial, mut skipped) = (0usize, 0usize, 0usize);
    for track_list in &track_lists {
        let bar = progress.add(ProgressBar::new(0));
        bar.set_style(style.clone());

        match split_album(track_list, &config, &codec, &bar).await {
            Ok(report) => {
                debug!(
                    "{track_list:?}: {}/{} track(s), {:?}, deleted: {}, {} decision(s), outputs: {:?}",
                    report.succeeded,
                    report.planned,
                    report.state,
                    report.deleted,
                    report.decisions.len(),
                    report.outputs
                );
                match report.state {
                    CommitState::Complete | CommitState::Finalized => complete += 1,
                    _ => partial += 1,
                }
            }
            Err(err) => {
                Status::Skip.log(err);
                skipped += 1;
            }
        }

        bar.finish_and_clear();
        progress.remove(&bar);
    }

    Status::Info.log(format!(
        "{complete} album(s) complete, {partial} partial, {skipped} skipped"
    ));

    Ok(())
}

/// Prints the split plan of one track-list without producing anything.
pub async fn print_plan(cmd: PlanCommand) -> anyhow::Result<()> {
    check_tool(&cmd.ffprobe).await?;
    let codec = FfmpegCodec::new(PathBuf::from("ffmpeg"), cmd.ffprobe);

    let album = prepare_album(&native_path(&cmd.input_cue), &codec).await?;

    println!("Container: {}", album.container.display());
    println!("Duration:  {}s", format_seconds(album.total.as_millis()));
    for entry in &album.plan.entries {
        println!(
            "  {:>10}s  +{:>10}s  {}.{OUTPUT_EXTENSION}",
            format_seconds(entry.start.as_millis()),
            format_seconds(entry.duration.as_millis()),
            sanitize_file_name(&entry.output_base_name)
        );
    }
    println!(
        "{} of {} track(s) planned",
        album.plan.planned_count(),
        album.disc.tracks.len()
    );

    Ok(())
}

pub fn track_metadata(disc: &Disc, entry: &PlanEntry) -> TrackMetadata {
    let performer = disc
        .tracks
        .get(entry.position)
        .and_then(|track| track.performer.clone());

    TrackMetadata {
        title: entry.title.clone(),
        track: entry.number,
        artist: performer.or_else(|| disc.performer.clone()),
        album: disc.title.clone(),
        album_artist: disc.performer.clone(),
        date: disc.remark("DATE").map(str::to_string),
        genre: disc.remark("GENRE").map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::error::{CodecError, CodecResult};
    use std::sync::Mutex;

    struct FakeCodec {
        duration: Option<Timestamp>,
        requests: Mutex<Vec<EncodeRequest>>,
    }

    impl FakeCodec {
        fn with_duration(millis: u64) -> Self {
            Self {
                duration: Some(Timestamp::from_millis(millis)),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl AudioCodec for FakeCodec {
        async fn probe_duration(&self, input: &Path) -> CodecResult<Timestamp> {
            self.duration
                .ok_or_else(|| CodecError::MissingDuration(input.to_path_buf()))
        }

        async fn encode_segment(&self, request: &EncodeRequest) -> CodecResult<()> {
            self.requests.lock().unwrap().push(request.clone());
            std::fs::write(&request.output, b"fLaC")?;
            Ok(())
        }
    }

    const SHEET: &str = "\
PERFORMER \"Artist\"
TITLE \"Album\"
REM DATE 2001
REM GENRE Jazz
FILE \"Caf\u{e9}.flac\" WAVE
TRACK 01 AUDIO
  TITLE \"Intro: Part 1/2\"
  INDEX 01 00:00:00
TRACK 02 AUDIO
  PERFORMER \"Guest\"
  INDEX 01 03:00:00
";

    fn album(container_name: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("album.cue"), SHEET).unwrap();
        std::fs::write(dir.path().join(container_name), b"audio").unwrap();
        dir
    }

    #[tokio::test]
    async fn splits_album_with_decomposed_container_name() {
        let dir = album("Cafe\u{301}.flac");
        let codec = FakeCodec::with_duration(300_000);
        let config = SplitConfig {
            delete_originals: true,
            ..SplitConfig::default()
        };

        let report = split_album(
            &dir.path().join("album.cue"),
            &config,
            &codec,
            &ProgressBar::hidden(),
        )
        .await
        .unwrap();

        assert_eq!(report.state, CommitState::Complete);
        assert!(report.deleted);
        assert!(!dir.path().join("Cafe\u{301}.flac").exists());
        assert!(!dir.path().join("album.cue").exists());

        let requests = codec.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].input, dir.path().join("Cafe\u{301}.flac"));
        assert_eq!(requests[0].duration.as_millis(), 180_000);
        assert_eq!(requests[1].duration.as_millis(), 120_000);
        assert_eq!(
            requests[0].output,
            dir.path().join("split").join("01 - Intro_ Part 1_2.flac")
        );
        assert_eq!(requests[1].metadata.title, "Track 02");
        assert_eq!(requests[1].metadata.artist.as_deref(), Some("Guest"));
        assert_eq!(requests[1].metadata.album_artist.as_deref(), Some("Artist"));
        assert_eq!(requests[0].metadata.artist.as_deref(), Some("Artist"));
        assert_eq!(requests[0].metadata.date.as_deref(), Some("2001"));
        assert_eq!(requests[0].metadata.genre.as_deref(), Some("Jazz"));
        assert_eq!(requests[0].metadata.album.as_deref(), Some("Album"));
    }

    #[tokio::test]
    async fn missing_container_skips_album() {
        let dir = album("other.flac");
        let codec = FakeCodec::with_duration(300_000);

        let result = split_album(
            &dir.path().join("album.cue"),
            &SplitConfig::default(),
            &codec,
            &ProgressBar::hidden(),
        )
        .await;

        assert!(matches!(result, Err(SplitError::ContainerNotFound(_))));
        assert!(codec.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_probe_skips_album() {
        let dir = album("Caf\u{e9}.flac");
        let codec = FakeCodec {
            duration: None,
            requests: Mutex::new(Vec::new()),
        };

        let result = prepare_album(&dir.path().join("album.cue"), &codec).await;

        assert!(matches!(
            result,
            Err(SplitError::DurationProbeFailure { .. })
        ));
        assert!(!dir.path().join("split").exists());
    }

    #[tokio::test]
    async fn structurally_invalid_sheet_skips_album() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("album.cue"), "TITLE \"Nothing here\"").unwrap();

        let result = prepare_album(
            &dir.path().join("album.cue"),
            &FakeCodec::with_duration(1_000),
        )
        .await;

        assert!(matches!(result, Err(SplitError::InvalidTrackList { .. })));
    }

    #[tokio::test]
    async fn unreadable_sheet_skips_album() {
        let dir = tempfile::tempdir().unwrap();

        let result = prepare_album(
            &dir.path().join("missing.cue"),
            &FakeCodec::with_duration(1_000),
        )
        .await;

        assert!(matches!(
            result,
            Err(SplitError::TrackListUnreadable { .. })
        ));
    }

    #[tokio::test]
    async fn repeated_track_numbers_produce_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = "\
FILE \"album.flac\" WAVE
TRACK 01 AUDIO
  INDEX 01 00:00:00
TRACK 01 AUDIO
  INDEX 01 02:00:00
";
        std::fs::write(dir.path().join("album.cue"), sheet).unwrap();
        std::fs::write(dir.path().join("album.flac"), b"audio").unwrap();
        let codec = FakeCodec::with_duration(300_000);
        let config = SplitConfig {
            delete_originals: true,
            ..SplitConfig::default()
        };

        let report = split_album(
            &dir.path().join("album.cue"),
            &config,
            &codec,
            &ProgressBar::hidden(),
        )
        .await
        .unwrap();

        let split = dir.path().join("split");
        assert_eq!(report.state, CommitState::Complete);
        assert_eq!((report.planned, report.succeeded), (2, 2));
        assert!(split.join("01 - Track 01.flac").is_file());
        assert!(split.join("01 - Track 01 (1).flac").is_file());

        let requests = codec.requests.lock().unwrap();
        assert_ne!(requests[0].output, requests[1].output);
        assert_eq!(requests[1].start.as_millis(), 120_000);
    }
}
