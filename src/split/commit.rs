use crate::codec::{AudioCodec, EncodeRequest};
use crate::split::config::{DIRECT_OUTPUT_DIR, OUTPUT_EXTENSION, SplitConfig};
use crate::split::error::{SplitError, SplitResult};
use crate::split::sanitize::sanitize_file_name;
use crate::split::status::Status;
use crate::util::fs::{STAGING_DIR_PREFIX, entry_exists, folded, native_join, resolve_entry};
use indicatif::ProgressBar;
use log::debug;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Where an album is in the commit protocol. `DELETED` is tracked separately on
/// [`CommitReport::deleted`] since it can accompany either `Complete` or `Finalized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitState {
    Planned,
    Staging,
    Partial,
    Complete,
    Finalized,
}

/// A destructive step the protocol decided on. Recorded identically in live and
/// dry runs; only live runs carry it out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Move { from: PathBuf, to: PathBuf },
    RemoveStaging(PathBuf),
    Delete(PathBuf),
    Keep(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    pub state: CommitState,
    pub deleted: bool,
    pub planned: usize,
    pub succeeded: usize,
    pub decisions: Vec<Decision>,
    /// Where the produced tracks ended up.
    pub outputs: Vec<PathBuf>,
}

#[derive(Debug)]
struct StagedOutput {
    path: PathBuf,
    file_name: String,
}

/// Drives one album from plan to finalized output. Sources are only ever touched
/// once every planned track has been produced.
#[derive(Debug)]
pub struct StagedCommit<'a> {
    config: &'a SplitConfig,
    album_dir: PathBuf,
    staging_dir: PathBuf,
    container: PathBuf,
    track_list: PathBuf,
    state: CommitState,
    planned: usize,
    staged_names: HashSet<String>,
    succeeded: Vec<StagedOutput>,
    decisions: Vec<Decision>,
}

impl<'a> StagedCommit<'a> {
    pub fn new(
        config: &'a SplitConfig,
        album_dir: impl AsRef<Path>,
        container: impl AsRef<Path>,
        track_list: impl AsRef<Path>,
    ) -> Self {
        let album_dir = album_dir.as_ref().to_path_buf();
        let staging_dir = if config.finalize_to_root {
            album_dir.join(format!("{STAGING_DIR_PREFIX}{}", std::process::id()))
        } else {
            album_dir.join(DIRECT_OUTPUT_DIR)
        };

        Self {
            config,
            album_dir,
            staging_dir,
            container: container.as_ref().to_path_buf(),
            track_list: track_list.as_ref().to_path_buf(),
            state: CommitState::Planned,
            planned: 0,
            staged_names: HashSet::new(),
            succeeded: Vec::new(),
            decisions: Vec::new(),
        }
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Staging location for a plan entry's `"<NN> - <title>"` base name. A name already
    /// handed out for this album gets a `" (n)"` suffix, so no two tracks share a file.
    pub fn output_path(&mut self, base_name: &str) -> PathBuf {
        let file_name = format!("{}.{OUTPUT_EXTENSION}", sanitize_file_name(base_name));

        let mut candidate = file_name.clone();
        let mut suffix = 0u32;
        while self.staged_names.contains(&folded(&candidate)) {
            suffix += 1;
            candidate = suffixed(&file_name, suffix);
        }
        self.staged_names.insert(folded(&candidate));

        native_join(&self.staging_dir, &candidate)
    }

    /// Runs the encoder once per request, in order. A track counts only if the encoder
    /// succeeded and left a non-empty file behind; failures never stop the album.
    pub async fn stage<C: AudioCodec>(
        &mut self,
        codec: &C,
        requests: &[EncodeRequest],
        progress: &ProgressBar,
    ) -> SplitResult<CommitState> {
        self.planned = requests.len();
        if requests.is_empty() {
            self.state = CommitState::Partial;
            return Ok(self.state);
        }

        fs::create_dir_all(&self.staging_dir)
            .await
            .map_err(|source| SplitError::StagingDirectory {
                path: self.staging_dir.clone(),
                source,
            })?;
        debug!("Staging into {:?}", self.staging_dir);

        self.state = CommitState::Staging;
        progress.set_length(requests.len() as u64);

        let mut produced = HashSet::new();
        for request in requests {
            let file_name = request
                .output
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            progress.set_message(file_name.clone());

            if !produced.insert(folded(&file_name)) {
                Status::Error.log(format!(
                    "{:?} is already the output of an earlier track",
                    request.output
                ));
                progress.inc(1);
                continue;
            }

            match codec.encode_segment(request).await {
                Ok(()) if has_content(&request.output).await => {
                    Status::Cut.log(format!("{:?}", request.output));
                    self.succeeded.push(StagedOutput {
                        path: request.output.clone(),
                        file_name,
                    });
                }
                Ok(()) => {
                    Status::Error.log(format!(
                        "encoder reported success but {:?} is missing or empty",
                        request.output
                    ));
                }
                Err(err) => {
                    Status::Error.log(format!("failed to cut {:?}: {err}", request.output));
                }
            }

            progress.inc(1);
        }

        self.state = if self.planned > 0 && self.succeeded.len() == self.planned {
            CommitState::Complete
        } else {
            CommitState::Partial
        };

        Ok(self.state)
    }

    /// Applies the finalize and delete steps the reached state allows and reports
    /// every decision taken along the way.
    pub async fn finish(mut self) -> CommitReport {
        let complete = self.state == CommitState::Complete;
        let mut outputs: Vec<PathBuf> = self.succeeded.iter().map(|o| o.path.clone()).collect();
        let mut deleted = false;

        if complete {
            if self.config.finalize_to_root {
                outputs = self.finalize().await;
                self.state = CommitState::Finalized;
            }
            if self.config.delete_originals {
                self.delete_sources().await;
                deleted = true;
            }
        } else {
            Status::Warn.log(format!(
                "{:?}: {} of {} track(s) produced, sources left untouched",
                self.album_dir,
                self.succeeded.len(),
                self.planned
            ));
            if self.config.finalize_to_root && self.planned > 0 {
                self.keep(self.staging_dir.clone());
            }
            if self.config.delete_originals {
                self.keep(self.container.clone());
                self.keep(self.track_list.clone());
            }
        }

        CommitReport {
            state: self.state,
            deleted,
            planned: self.planned,
            succeeded: self.succeeded.len(),
            decisions: self.decisions,
            outputs,
        }
    }

    async fn finalize(&mut self) -> Vec<PathBuf> {
        let mut claimed = HashSet::new();
        let mut finals = Vec::with_capacity(self.succeeded.len());
        let mut rename_failed = false;

        let staged = std::mem::take(&mut self.succeeded);
        for output in &staged {
            let name = collision_free_name(
                &self.album_dir,
                &output.file_name,
                self.config.overwrite_final,
                &claimed,
            )
            .await;
            claimed.insert(folded(&name));

            let destination = if self.config.overwrite_final {
                resolve_entry(&self.album_dir, &name).await
            } else {
                native_join(&self.album_dir, &name)
            };
            self.decisions.push(Decision::Move {
                from: output.path.clone(),
                to: destination.clone(),
            });

            if self.config.dry_run {
                Status::Dry.log(format!("move {:?} -> {:?}", output.path, destination));
                finals.push(destination);
                continue;
            }

            match fs::rename(&output.path, &destination).await {
                Ok(()) => {
                    Status::Move.log(format!("{:?} -> {:?}", output.path, destination));
                    finals.push(destination);
                }
                Err(err) => {
                    Status::Error.log(format!(
                        "failed to move {:?} -> {:?}: {err}",
                        output.path, destination
                    ));
                    rename_failed = true;
                    finals.push(output.path.clone());
                }
            }
        }
        self.succeeded = staged;

        if rename_failed {
            Status::Warn.log(format!(
                "staging directory {:?} is not empty, leaving it in place",
                self.staging_dir
            ));
            return finals;
        }

        self.decisions
            .push(Decision::RemoveStaging(self.staging_dir.clone()));
        if self.config.dry_run {
            Status::Dry.log(format!("remove staging directory {:?}", self.staging_dir));
        } else if let Err(err) = fs::remove_dir(&self.staging_dir).await {
            Status::Warn.log(format!(
                "could not remove staging directory {:?}: {err}",
                self.staging_dir
            ));
        } else {
            debug!("Removed staging directory {:?}", self.staging_dir);
        }

        finals
    }

    async fn delete_sources(&mut self) {
        for source in [self.container.clone(), self.track_list.clone()] {
            self.decisions.push(Decision::Delete(source.clone()));

            if self.config.dry_run {
                Status::Dry.log(format!("delete {source:?}"));
                continue;
            }

            match fs::remove_file(&source).await {
                Ok(()) => Status::Delete.log(format!("{source:?}")),
                Err(err) => Status::Error.log(format!("failed to delete {source:?}: {err}")),
            }
        }
    }

    fn keep(&mut self, path: PathBuf) {
        Status::Keep.log(format!("{path:?}"));
        self.decisions.push(Decision::Keep(path));
    }
}

async fn has_content(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|meta| meta.is_file() && meta.len() > 0)
        .unwrap_or(false)
}

/// Picks the name a file gets in `dir`. Without overwrite, a taken name (on disk, in
/// any normalization form or case, or in `claimed`) gets `" (1)"`, `" (2)"`, ...
/// inserted before the extension.
pub async fn collision_free_name(
    dir: &Path,
    file_name: &str,
    overwrite: bool,
    claimed: &HashSet<String>,
) -> String {
    if overwrite {
        return file_name.to_string();
    }

    let mut candidate = file_name.to_string();
    let mut suffix = 0u32;
    while claimed.contains(&folded(&candidate)) || entry_exists(dir, &candidate).await {
        suffix += 1;
        candidate = suffixed(file_name, suffix);
    }

    candidate
}

/// `"name (n).ext"`, or `"name (n)"` without an extension.
fn suffixed(file_name: &str, suffix: u32) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => format!("{stem} ({suffix}).{extension}"),
        _ => format!("{file_name} ({suffix})"),
    }
}
