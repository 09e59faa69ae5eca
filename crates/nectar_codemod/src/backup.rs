//! Timestamped backup sets under `.nectar/backups/` and restoring from them.
//!
//! A backup set is one directory per apply invocation named by a zero-padded
//! UTC timestamp, so the lexicographically greatest name is the newest set.
//! Each file inside is the pre-image of one edited source file, named by its
//! encoded project-relative path.
//!
//! Backups are only ever added. Neither rollback nor restore removes them.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use path_clean::PathClean;
use std::{
    collections::{HashMap, HashSet},
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Component, Path, PathBuf},
};

use crate::types::ApplyResult;

/// `YYYYMMDD-HHMMSSmmm` in UTC.
pub fn timestamp_key() -> String {
    key_at(Utc::now())
}

// UTC never repeats an hour, so later instants always sort later.
fn key_at(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d-%H%M%S%3f").to_string()
}

/// Flatten a relative path into a single file name.
///
/// `%` and `_` are escaped first so that `__` can only mean a separator.
pub fn encode_backup_path(rel: &str) -> String {
    let mut out = String::with_capacity(rel.len() + 8);
    for c in rel.chars() {
        match c {
            '%' => out.push_str("%25"),
            '_' => out.push_str("%5F"),
            '/' | '\\' => out.push_str("__"),
            c => out.push(c),
        }
    }
    out
}

/// Inverse of [`encode_backup_path`]. Always yields `/` separators.
pub fn decode_backup_path(encoded: &str) -> String {
    let mut out = String::with_capacity(encoded.len());
    let mut rest = encoded;
    while let Some(c) = rest.chars().next() {
        if let Some(tail) = rest.strip_prefix("__") {
            out.push('/');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("%25") {
            out.push('%');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("%5F") {
            out.push('_');
            rest = tail;
        } else {
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
    }
    out
}

/// The backup set of one apply invocation. The directory is created on the first store.
#[derive(Debug)]
pub struct BackupSet {
    backups_root: PathBuf,
    key: String,
    dir: Option<PathBuf>,
    stored: HashMap<String, PathBuf>,
}

impl BackupSet {
    pub fn new(backups_root: &Path) -> Self {
        Self::with_key(backups_root, timestamp_key())
    }

    pub fn with_key(backups_root: &Path, key: impl Into<String>) -> Self {
        Self { backups_root: backups_root.to_path_buf(), key: key.into(), dir: None, stored: HashMap::new() }
    }

    /// The set's directory, once something has been stored.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Durably write the pre-image of `rel` and return the backup path.
    ///
    /// Only the first pre-image of a file is kept; later calls for the same
    /// file return the existing backup so rollback reaches the original content.
    pub fn store(&mut self, rel: &str, content: &str) -> Result<PathBuf> {
        if let Some(existing) = self.stored.get(rel) {
            debug!("Backup of {} already in set, keeping first pre-image", rel);
            return Ok(existing.clone());
        }

        let dir = match &self.dir {
            Some(d) => d.clone(),
            None => {
                let d = self.backups_root.join(&self.key);
                fs::create_dir_all(&d)
                    .with_context(|| format!("Failed to create backup directory {}", d.display()))?;
                info!("Created backup set {}", d.display());
                self.dir = Some(d.clone());
                d
            }
        };

        let path = dir.join(encode_backup_path(rel));
        // never truncate a pre-image written by a concurrent invocation
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                anyhow::bail!("Backup {} already exists", path.display())
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to create backup {}", path.display()));
            }
        };
        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write backup {}", path.display()))?;
        file.sync_all().with_context(|| format!("Failed to flush backup {}", path.display()))?;

        debug!("Backed up {} to {}", rel, path.display());
        self.stored.insert(rel.to_string(), path.clone());
        Ok(path)
    }
}

/// Outcome of restoring from the rollback records of one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollbackReport {
    pub restored: usize,
    /// `(file, error)` for every file that could not be restored
    pub failures: Vec<(String, String)>,
}

/// Copy every recorded backup back over its source file.
///
/// Each backup is restored once, however many results share it. One failed
/// restore never stops the others.
pub fn rollback(root: &Path, results: &[ApplyResult]) -> RollbackReport {
    let mut report = RollbackReport::default();
    let mut seen: HashSet<&Path> = HashSet::new();
    for r in results {
        let Some(backup) = &r.backups_path else {
            continue;
        };
        if !seen.insert(backup.as_path()) {
            continue;
        }
        let target = root.join(&r.file);
        let restored = fs::read_to_string(backup)
            .with_context(|| format!("Failed to read backup {}", backup.display()))
            .and_then(|content| {
                fs::write(&target, content)
                    .with_context(|| format!("Failed to restore {}", target.display()))
            });
        match restored {
            Ok(()) => {
                debug!("Restored {} from {}", r.file, backup.display());
                report.restored += 1;
            }
            Err(e) => {
                warn!("Rollback of {} failed: {:#}", r.file, e);
                report.failures.push((r.file.clone(), format!("{:#}", e)));
            }
        }
    }
    report
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    NoBackupsDir,
    NoBackupSets,
    Restored { restored: usize, folder: PathBuf },
}

/// Restore every file of the newest backup set under `backups_root` into `root`.
///
/// Only the newest set is used. Entries whose decoded path is absolute or
/// climbs out of `root` are skipped.
pub fn restore_latest(root: &Path, backups_root: &Path) -> Result<RestoreOutcome> {
    let entries = match fs::read_dir(backups_root) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("No backups at {}: {}", backups_root.display(), e);
            return Ok(RestoreOutcome::NoBackupsDir);
        }
    };

    let latest = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| !name.starts_with('.'))
        .max();
    let Some(latest) = latest else {
        return Ok(RestoreOutcome::NoBackupSets);
    };
    let folder = backups_root.join(&latest);
    info!("Restoring from backup set {}", folder.display());

    let mut restored = 0;
    let files = fs::read_dir(&folder)
        .with_context(|| format!("Failed to read backup set {}", folder.display()))?;
    for entry in files.filter_map(|e| e.ok()) {
        let name = entry.file_name().to_string_lossy().to_string();
        let Some(rel) = safe_relative(&decode_backup_path(&name)) else {
            warn!("Skipping backup {} outside the project root", name);
            continue;
        };
        let dest = root.join(&rel);
        let copied = fs::read_to_string(entry.path())
            .with_context(|| format!("Failed to read backup {}", name))
            .and_then(|content| {
                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create {}", parent.display()))?;
                }
                fs::write(&dest, content).with_context(|| format!("Failed to write {}", dest.display()))
            });
        match copied {
            Ok(()) => restored += 1,
            Err(e) => warn!("{:#}", e),
        }
    }
    Ok(RestoreOutcome::Restored { restored, folder })
}

fn safe_relative(decoded: &str) -> Option<PathBuf> {
    let cleaned = PathBuf::from(decoded).clean();
    let escapes = cleaned.components().any(|c| {
        matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_))
    });
    (!escapes && !cleaned.as_os_str().is_empty()).then_some(cleaned)
}
