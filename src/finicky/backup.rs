//! Rotating backups of the Finicky config file
//!
//! Backups live in a single shared directory (`~/finicky/backups`) and are
//! named deterministically:
//!
//! ```text
//! cfg-<hex6>.<name>.<reason>.<yyyymmddhhmmss><ext>
//! ```
//!
//! where `<hex6>` is the first six bytes of SHA-1 over the source path. The
//! prefix partitions the directory per source path, so listing, pruning and
//! lookup for one config never touch another config's history.
//!
//! Taking a backup *moves* the source into the backup directory. Callers that
//! need the file back in place must restore it themselves.

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use sha1::{Digest, Sha1};
use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

use super::error::{Error, Result};

/// Number of backups kept per source path
pub const MAX_BACKUPS_PER_CONFIG: usize = 10;

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// A backup that could not be evicted during pruning
///
/// Pruning is best-effort: these never fail the operation that triggered
/// them, but are handed back so callers can report them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PruneWarning {
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for PruneWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed pruning {}: {}", self.path.display(), self.message)
    }
}

/// Result of [`BackupStore::create_backup`]
#[derive(Debug, Default)]
pub struct BackupOutcome {
    /// Where the source was moved to; `None` when there was nothing to back up
    pub backup_path: Option<PathBuf>,
    pub warnings: Vec<PruneWarning>,
}

/// A backup file as reported by [`BackupStore::list`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupEntry {
    pub path: PathBuf,
    pub reason: Option<String>,
    /// Timestamp embedded in the file name
    pub created: Option<NaiveDateTime>,
    pub size: u64,
    pub modified: Option<chrono::DateTime<Local>>,
}

/// Backup directory plus retention policy
#[derive(Debug, Clone)]
pub struct BackupStore {
    dir: PathBuf,
    keep: usize,
}

impl BackupStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dir: dir.into(),
            keep: MAX_BACKUPS_PER_CONFIG,
        }
    }

    /// Override the per-path retention cap (0 disables pruning)
    pub fn with_keep(mut self, keep: usize) -> Self {
        self.keep = keep;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Move `path` into the backup directory
    ///
    /// A missing source is not an error: there is nothing to protect, so the
    /// outcome carries no backup path. Symlinks are moved as links.
    pub fn create_backup(&self, path: &Path, reason: &str) -> Result<BackupOutcome> {
        match fs::symlink_metadata(path) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "nothing to back up");
                return Ok(BackupOutcome::default());
            }
            Err(e) => return Err(Error::io("checking config", path, e)),
        }

        fs::create_dir_all(&self.dir)
            .map_err(|e| Error::io("creating backup directory", &self.dir, e))?;

        let backup_path = self.next_backup_path(path, reason);
        fs::rename(path, &backup_path).map_err(|e| Error::io("backing up config", path, e))?;
        info!(
            source = %path.display(),
            backup = %backup_path.display(),
            reason,
            "config backed up"
        );

        // rename keeps the source's mtime; the new backup must still rank newest
        if let Err(e) = stamp_mtime(&backup_path, self.fresh_mtime(path, &backup_path)) {
            debug!(backup = %backup_path.display(), error = %e, "could not refresh backup mtime");
        }

        let warnings = self.prune_keeping(path, Some(&backup_path));
        Ok(BackupOutcome {
            backup_path: Some(backup_path),
            warnings,
        })
    }

    /// Newest backup for `path` under the deterministic naming scheme
    pub fn latest(&self, path: &Path) -> Option<PathBuf> {
        let mut matches = self.matching_paths(path).ok()?;
        sort_newest_first(&mut matches);
        matches.into_iter().next()
    }

    /// Newest `<path>.backup-*` sibling left by older releases
    pub fn latest_legacy(&self, path: &Path) -> Option<PathBuf> {
        let file_name = path.file_name()?.to_string_lossy().into_owned();
        let legacy_prefix = format!("{}.backup-", file_name);
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut matches: Vec<PathBuf> = fs::read_dir(parent)
            .ok()?
            .flatten()
            .filter(|entry| !entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(&legacy_prefix))
            .map(|entry| entry.path())
            .collect();

        sort_newest_first(&mut matches);
        matches.into_iter().next()
    }

    /// Newest backup of either scheme, deterministic first
    pub fn latest_backup(&self, path: &Path) -> Option<PathBuf> {
        self.latest(path).or_else(|| self.latest_legacy(path))
    }

    /// All deterministic backups for `path`, newest first
    pub fn list(&self, path: &Path) -> Result<Vec<BackupEntry>> {
        let mut matches = match self.matching_paths(path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io("reading backup directory", &self.dir, e)),
        };
        sort_newest_first(&mut matches);

        let (name, ext) = split_name(path);
        let name_prefix = format!("{}.{}.", backup_prefix(path), sanitize_backup_name(&name));

        Ok(matches
            .into_iter()
            .map(|backup| {
                let metadata = fs::symlink_metadata(&backup).ok();
                let (reason, created) = backup
                    .file_name()
                    .map(|n| parse_reason_and_time(&n.to_string_lossy(), &name_prefix, &ext))
                    .unwrap_or((None, None));
                BackupEntry {
                    reason,
                    created,
                    size: metadata.as_ref().map(|m| m.len()).unwrap_or(0),
                    modified: metadata
                        .and_then(|m| m.modified().ok())
                        .map(chrono::DateTime::<Local>::from),
                    path: backup,
                }
            })
            .collect())
    }

    /// Evict backups for `path` beyond the retention cap
    pub fn prune(&self, path: &Path) -> Vec<PruneWarning> {
        self.prune_keeping(path, None)
    }

    /// Prune, never evicting `fresh`; it still counts toward the cap
    fn prune_keeping(&self, path: &Path, fresh: Option<&Path>) -> Vec<PruneWarning> {
        if self.keep == 0 {
            return Vec::new();
        }

        let mut paths = match self.matching_paths(path) {
            Ok(p) => p,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "failed listing backups for pruning");
                return vec![PruneWarning {
                    path: self.dir.clone(),
                    message: e.to_string(),
                }];
            }
        };

        let mut keep = self.keep;
        if let Some(fresh) = fresh {
            let before = paths.len();
            paths.retain(|p| p != fresh);
            if paths.len() < before {
                keep -= 1;
            }
        }

        if paths.len() <= keep {
            return Vec::new();
        }

        sort_newest_first(&mut paths);

        let mut warnings = Vec::new();
        for stale in &paths[keep..] {
            match fs::remove_file(stale) {
                Ok(()) => debug!(backup = %stale.display(), "pruned backup"),
                Err(e) => {
                    warn!(backup = %stale.display(), error = %e, "failed pruning backup");
                    warnings.push(PruneWarning {
                        path: stale.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }
        warnings
    }

    fn matching_paths(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let prefix = format!("{}.", backup_prefix(path));
        let mut matches = Vec::new();
        for entry in fs::read_dir(&self.dir)?.flatten() {
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            if entry.file_name().to_string_lossy().starts_with(&prefix) {
                matches.push(entry.path());
            }
        }
        Ok(matches)
    }

    /// Now, or just past the newest existing backup if that is later
    fn fresh_mtime(&self, path: &Path, fresh: &Path) -> SystemTime {
        let now = SystemTime::now();
        let newest = self
            .matching_paths(path)
            .unwrap_or_default()
            .into_iter()
            .filter(|p| p != fresh)
            .filter_map(|p| fs::symlink_metadata(p).and_then(|m| m.modified()).ok())
            .max();
        match newest {
            // Whole seconds, for filesystems with coarse timestamps
            Some(t) if t >= now => t + Duration::from_secs(1),
            _ => now,
        }
    }

    fn next_backup_path(&self, path: &Path, reason: &str) -> PathBuf {
        let (name, ext) = split_name(path);
        let stem = format!(
            "{}.{}.{}.{}",
            backup_prefix(path),
            sanitize_backup_name(&name),
            sanitize_backup_name(reason),
            Local::now().format(TIMESTAMP_FORMAT)
        );

        let mut candidate = self.dir.join(format!("{}{}", stem, ext));
        let mut counter = 1;
        // Same-second backups would otherwise overwrite each other
        while fs::symlink_metadata(&candidate).is_ok() {
            candidate = self.dir.join(format!("{}_{:03}{}", stem, counter, ext));
            counter += 1;
        }
        candidate
    }
}

/// Set a regular file's mtime; symlinks are left alone
fn stamp_mtime(path: &Path, mtime: SystemTime) -> io::Result<()> {
    if fs::symlink_metadata(path)?.file_type().is_symlink() {
        return Ok(());
    }
    let file = File::options()
        .write(true)
        .open(path)
        .or_else(|_| File::open(path))?;
    file.set_modified(mtime)
}

/// `cfg-` plus the first six bytes of SHA-1 over the raw path, hex encoded
pub fn backup_prefix(path: &Path) -> String {
    let digest = Sha1::digest(path.as_os_str().as_encoded_bytes());
    format!("cfg-{}", hex::encode(&digest[..6]))
}

/// Make a string safe to embed as one dot-separated segment of a file name
pub fn sanitize_backup_name(input: &str) -> String {
    if input.is_empty() {
        return "config".to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(c) = rest.chars().next() {
        if rest.starts_with("..") {
            out.push('.');
            rest = &rest[2..];
            continue;
        }
        match c {
            '/' | '\\' => out.push('_'),
            ' ' | ':' => out.push('-'),
            _ => out.push(c),
        }
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Split a file name at its last dot: `.finicky.js` -> (`.finicky`, `.js`)
fn split_name(path: &Path) -> (String, String) {
    let base = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match base.rfind('.') {
        Some(i) => (base[..i].to_string(), base[i..].to_string()),
        None => (base, String::new()),
    }
}

fn parse_reason_and_time(
    file_name: &str,
    name_prefix: &str,
    ext: &str,
) -> (Option<String>, Option<NaiveDateTime>) {
    let Some(rest) = file_name
        .strip_prefix(name_prefix)
        .and_then(|r| r.strip_suffix(ext))
    else {
        return (None, None);
    };
    let Some((reason, stamp)) = rest.rsplit_once('.') else {
        return (None, None);
    };
    let created = stamp
        .get(..14)
        .and_then(|s| NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok());
    (Some(reason.to_string()), created)
}

/// Order backups newest first by modification time
///
/// If any entry's metadata cannot be read, the whole list falls back to
/// reverse lexical path order. Deterministic names embed the timestamp so this
/// is usually chronological too, but it is not guaranteed (legacy names, or
/// mixed sanitized base names). Equal mtimes are broken by reverse path order.
fn sort_newest_first(paths: &mut [PathBuf]) {
    let times: Option<Vec<SystemTime>> = paths
        .iter()
        .map(|p| fs::symlink_metadata(p).and_then(|m| m.modified()).ok())
        .collect();

    match times {
        Some(times) => {
            let mut keyed: Vec<(SystemTime, PathBuf)> =
                times.into_iter().zip(paths.iter().cloned()).collect();
            keyed.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
            for (slot, (_, path)) in paths.iter_mut().zip(keyed) {
                *slot = path;
            }
        }
        None => {
            debug!("backup metadata unreadable, ordering by name");
            paths.sort_by(|a, b| b.cmp(a));
        }
    }
}
