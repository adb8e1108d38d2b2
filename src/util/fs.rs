use crate::error::CueSplitResult;
use crate::split::status::Status;
use async_recursion::async_recursion;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::fs::ReadDir;
use unicode_normalization::UnicodeNormalization;

/// Prefix of the per-process staging directories created in finalize-to-root mode.
pub const STAGING_DIR_PREFIX: &str = ".split.tmp-";

/// Brings a text path into the form the host filesystem stores natively: decomposed
/// on macOS, composed everywhere else. Text paths go through here (or [`native_join`])
/// before any filesystem call. Non-UTF-8 paths are passed through untouched.
pub fn native_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    match path.to_str() {
        Some(text) => PathBuf::from(native_text(text)),
        None => path.to_path_buf(),
    }
}

/// Joins a text file name onto an existing on-disk directory, normalizing only the
/// new component so already-resolved parts keep their stored form.
pub fn native_join(dir: &Path, name: &str) -> PathBuf {
    dir.join(native_text(name))
}

fn native_text(text: &str) -> String {
    if cfg!(target_os = "macos") {
        text.nfd().collect()
    } else {
        text.nfc().collect()
    }
}

fn composed(text: &str) -> String {
    text.nfc().collect()
}

/// Key under which two names count as the same entry: composed and lower-cased.
pub fn folded(text: &str) -> String {
    composed(&composed(text).to_lowercase())
}

/// Finds the directory entry matching `name` regardless of normalization form or case.
/// Falls back to the literal (natively normalized) path when nothing matches, so
/// callers must still check existence.
pub async fn resolve_entry(dir: &Path, name: &str) -> PathBuf {
    let requested_nfc = composed(name);
    let requested_folded = folded(name);

    if let Ok(mut entries) = fs::read_dir(dir).await {
        let mut case_match = None;

        while let Ok(Some(entry)) = entries.next_entry().await {
            let raw = entry.file_name();
            let text = entry_text(&raw);

            if composed(&text) == requested_nfc {
                return dir.join(raw);
            }
            if case_match.is_none() && folded(&text) == requested_folded {
                case_match = Some(raw);
            }
        }

        if let Some(raw) = case_match {
            return dir.join(raw);
        }
    }

    native_join(dir, name)
}

/// Resolves a logical relative path (as written in a track-list, `\` or `/`
/// separated) one component at a time.
pub async fn resolve_relative(dir: &Path, logical: &str) -> PathBuf {
    let normalized = logical.replace('\\', "/");
    let mut current = dir.to_path_buf();

    for component in normalized.split('/').filter(|c| !c.is_empty() && *c != ".") {
        current = if component == ".." {
            current.join(component)
        } else {
            resolve_entry(&current, component).await
        };
    }

    current
}

fn entry_text(raw: &OsStr) -> String {
    match raw.to_str() {
        Some(text) => text.to_string(),
        None => raw.to_string_lossy().into_owned(),
    }
}

/// Whether some entry in `dir` already answers to `name` under normalization- and
/// case-insensitive matching.
pub async fn entry_exists(dir: &Path, name: &str) -> bool {
    let resolved = resolve_entry(dir, name).await;
    fs::try_exists(&resolved).await.unwrap_or(false)
}

/// Recursively collects every `*.cue` file below `root`, sorted, skipping staging
/// directories left behind by earlier runs. `root` must already be in native form.
/// Only an unreadable `root` is an error; anything below it that cannot be listed is
/// logged and left out.
pub async fn find_track_lists(root: &Path) -> CueSplitResult<Vec<PathBuf>> {
    let entries = fs::read_dir(root).await?;
    let mut found = Vec::new();

    walk_entries(root, entries, &mut found).await;

    found.sort();
    Ok(found)
}

#[async_recursion]
async fn walk_dir(dir: &Path, found: &mut Vec<PathBuf>) {
    match fs::read_dir(dir).await {
        Ok(entries) => walk_entries(dir, entries, found).await,
        Err(err) => Status::Skip.log(format!("cannot read directory {dir:?}: {err}")),
    }
}

async fn walk_entries(dir: &Path, mut entries: ReadDir, found: &mut Vec<PathBuf>) {
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(err) => {
                Status::Skip.log(format!("stopped listing {dir:?}: {err}"));
                break;
            }
        };

        let path = entry.path();
        let file_type = match entry.file_type().await {
            Ok(file_type) => file_type,
            Err(err) => {
                Status::Skip.log(format!("cannot stat {path:?}: {err}"));
                continue;
            }
        };

        if file_type.is_dir() {
            let is_staging = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(STAGING_DIR_PREFIX));
            if !is_staging {
                walk_dir(&path, found).await;
            }
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("cue"))
        {
            found.push(path);
        }
    }
}
