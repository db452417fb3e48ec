//! Whole-document snapshots taken before every change.
//!
//! Backups are append-only: `<stem>_<YYYYMMDD_HHMMSS>.<ext>` in the backup
//! directory, never overwritten. Two snapshots in the same second collide;
//! the second one fails with [`BackupError::AlreadyExists`] and the caller's
//! [`BackupPolicy`] decides whether that blocks the change.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Backup already exists: {0}")]
    AlreadyExists(PathBuf),
}

/// What a mutation does when its snapshot fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupPolicy {
    /// Report the failure and write the change anyway.
    #[default]
    Continue,
    /// Refuse to write the change.
    Abort,
}

/// A snapshot found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub path: PathBuf,
    pub taken_at: NaiveDateTime,
}

/// Backup file name for `document` at `at`.
pub fn backup_name(document: &Path, at: NaiveDateTime) -> String {
    let stem = document
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let stamp = at.format(TIMESTAMP_FORMAT);
    match document.extension() {
        Some(ext) => format!("{stem}_{stamp}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{stamp}"),
    }
}

/// Copy `document` into `backup_dir` under a timestamped name.
pub fn snapshot(document: &Path, backup_dir: &Path) -> Result<PathBuf, BackupError> {
    snapshot_at(document, backup_dir, Local::now().naive_local())
}

/// [`snapshot`] with an explicit timestamp.
pub fn snapshot_at(
    document: &Path,
    backup_dir: &Path,
    at: NaiveDateTime,
) -> Result<PathBuf, BackupError> {
    fs::create_dir_all(backup_dir)?;
    let target = backup_dir.join(backup_name(document, at));

    let mut source = File::open(document)?;
    copy_to_new(&mut source, &target)?;

    tracing::debug!("Backed up {} to {}", document.display(), target.display());
    Ok(target)
}

/// Copy `source` into a file that must not exist yet.
///
/// A partially written target is removed again so a failed copy never
/// shows up as a backup.
fn copy_to_new(source: &mut impl Read, target: &Path) -> Result<(), BackupError> {
    let mut dest = match OpenOptions::new().write(true).create_new(true).open(target) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(BackupError::AlreadyExists(target.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    let written = io::copy(source, &mut dest).and_then(|_| dest.sync_all());
    if let Err(e) = written {
        drop(dest);
        if let Err(cleanup) = fs::remove_file(target) {
            tracing::warn!("Could not remove partial backup {}: {cleanup}", target.display());
        }
        return Err(e.into());
    }
    Ok(())
}

/// Snapshots of `document` in `backup_dir`, newest first.
///
/// A missing directory means no backups. Files that don't follow the naming
/// scheme are ignored.
pub fn list_backups(document: &Path, backup_dir: &Path) -> Result<Vec<BackupEntry>, BackupError> {
    if !backup_dir.exists() {
        return Ok(Vec::new());
    }
    let stem = document
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let prefix = format!("{stem}_");

    let mut entries = Vec::new();
    for entry in fs::read_dir(backup_dir)? {
        let path = entry?.path();
        let Some(file_stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let Some(stamp) = file_stem.strip_prefix(&prefix) else {
            continue;
        };
        if let Ok(taken_at) = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT) {
            entries.push(BackupEntry { path, taken_at });
        }
    }
    entries.sort_by(|a, b| b.taken_at.cmp(&a.taken_at));
    Ok(entries)
}
