//! Persisting the race list: backups and atomic replacement

use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::app::models::Race;
use crate::app::services::evt::render_evt;
use crate::config::OutputEncoding;
use crate::constants::BACKUP_TIMESTAMP_FORMAT;
use crate::{Error, Result};

/// First free `<file_name>.<stamp>[.N]` path in `backup_dir`
pub fn unique_backup_path(backup_dir: &Path, file_name: &str, stamp: &str) -> PathBuf {
    let base = backup_dir.join(format!("{}.{}", file_name, stamp));
    if !base.exists() {
        return base;
    }

    (1u32..)
        .map(|n| backup_dir.join(format!("{}.{}.{}", file_name, stamp, n)))
        .find(|candidate| !candidate.exists())
        .unwrap_or(base)
}

/// Copy `path` into `backup_dir` with a local-time stamp
///
/// Returns `None` when there is nothing to back up.
pub async fn backup_file(path: &Path, backup_dir: &Path) -> Result<Option<PathBuf>> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Ok(None);
    }

    tokio::fs::create_dir_all(backup_dir).await.map_err(|e| {
        Error::io(
            format!("Failed to create backup directory {}", backup_dir.display()),
            e,
        )
    })?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stamp = Local::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
    let target = unique_backup_path(backup_dir, &file_name, &stamp);

    tokio::fs::copy(path, &target).await.map_err(|e| {
        Error::io(
            format!("Failed to back up {} to {}", path.display(), target.display()),
            e,
        )
    })?;

    debug!("Backed up {} to {}", path.display(), target.display());
    Ok(Some(target))
}

/// Replace `path` with `contents` via a temporary sibling and a rename
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(".{}.tmp", file_name));

    tokio::fs::write(&temp_path, contents).await.map_err(|e| {
        Error::io(format!("Failed to write {}", temp_path.display()), e)
    })?;

    tokio::fs::rename(&temp_path, path).await.map_err(|e| {
        Error::io(
            format!("Failed to replace {} with {}", path.display(), temp_path.display()),
            e,
        )
    })
}

/// Back up the current race list, then write `races` in its place
pub async fn write_race_list(
    path: &Path,
    backup_dir: &Path,
    encoding: OutputEncoding,
    races: &[Race],
) -> Result<()> {
    let text = render_evt(races)?;
    let bytes = encoding.encode(&text);

    backup_file(path, backup_dir).await?;
    write_atomic(path, &bytes).await?;

    info!(
        "Updated {} with {} races ({})",
        path.display(),
        races.len(),
        encoding.name()
    );
    Ok(())
}
