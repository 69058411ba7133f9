//! iCloud sync for the Finicky config
//!
//! Sync works by moving the config's canonical copy into iCloud Drive and
//! leaving a symlink at the local path. Whether sync is on is never stored:
//! it is read back from the filesystem each time. The local path counts as
//! synced iff it is a symlink resolving inside the synced root.
//!
//! Every mutating step has an explicit undo so the local path is never left
//! empty:
//!
//! - enable: back up local content, link; if linking fails, move the backup back
//! - disable: unlink, restore backup (or copy the cloud file); if restoring
//!   fails, put the link back

use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::backup::{BackupOutcome, BackupStore, PruneWarning};
use super::error::{Error, Result};
use super::locator::ConfigContext;

pub const ICLOUD_PROVIDER: &str = "iCloud";

/// Reason tag recorded on backups taken when enabling sync
pub const SYNC_BACKUP_REASON: &str = "icloud";

/// Written when enabling sync with neither a cloud nor a local config
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"export default {
  defaultBrowser: "Safari",
  handlers: [],
};
"#;

/// Creates a symlink at `link` pointing to `target`
pub type SymlinkFn = fn(target: &Path, link: &Path) -> io::Result<()>;

/// Observable sync state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    Disabled,
    Enabled { target: PathBuf },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudSyncStatus {
    pub enabled: bool,
    pub provider: String,
    pub config_path: PathBuf,
    /// Resolved symlink target, also reported for symlinks outside iCloud
    pub cloud_path: Option<PathBuf>,
}

impl CloudSyncStatus {
    pub fn state(&self) -> SyncState {
        match (&self.cloud_path, self.enabled) {
            (Some(target), true) => SyncState::Enabled {
                target: target.clone(),
            },
            _ => SyncState::Disabled,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudSyncResult {
    pub provider: String,
    pub config_path: PathBuf,
    pub cloud_path: PathBuf,
    pub backup_path: Option<PathBuf>,
    pub message: String,
    pub warnings: Vec<PruneWarning>,
}

/// Drives enable/disable/status for iCloud sync
///
/// Operations are not synchronised with each other. Callers must serialise
/// requests for the same config path: two concurrent `disable` calls can both
/// see the symlink before either removes it.
#[derive(Debug, Clone)]
pub struct CloudSyncManager {
    ctx: ConfigContext,
    store: BackupStore,
    cloud_root: PathBuf,
    symlink: SymlinkFn,
}

impl CloudSyncManager {
    pub fn new<P: Into<PathBuf>>(ctx: ConfigContext, store: BackupStore, cloud_root: P) -> Self {
        Self {
            ctx,
            store,
            cloud_root: cloud_root.into(),
            symlink: create_symlink,
        }
    }

    /// Replace the symlink primitive
    pub fn with_symlink_fn(mut self, symlink: SymlinkFn) -> Self {
        self.symlink = symlink;
        self
    }

    pub fn cloud_root(&self) -> &Path {
        &self.cloud_root
    }

    /// Where the synced copy of `config_path` lives
    pub fn cloud_config_path(&self, config_path: &Path) -> PathBuf {
        let ext = match config_path.extension().and_then(|e| e.to_str()) {
            Some("ts") => "ts",
            _ => "js",
        };
        self.cloud_root.join(format!(".finicky.{}", ext))
    }

    pub fn status(&self) -> Result<CloudSyncStatus> {
        let config_path = self.ctx.config_path()?;
        let disabled = |config_path: PathBuf| CloudSyncStatus {
            enabled: false,
            provider: ICLOUD_PROVIDER.to_string(),
            config_path,
            cloud_path: None,
        };

        let metadata = match fs::symlink_metadata(&config_path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(disabled(config_path)),
            Err(e) => return Err(Error::io("checking config path", config_path, e)),
        };

        if !metadata.file_type().is_symlink() {
            return Ok(disabled(config_path));
        }

        let target = resolve_symlink(&config_path)?;
        Ok(CloudSyncStatus {
            enabled: self.is_in_cloud_root(&target),
            provider: ICLOUD_PROVIDER.to_string(),
            config_path,
            cloud_path: Some(target),
        })
    }

    pub fn enable(&self) -> Result<CloudSyncResult> {
        let config_path = self.ctx.config_path()?;
        let cloud_path = self.cloud_config_path(&config_path);

        fs::create_dir_all(&self.cloud_root)
            .map_err(|e| Error::io("creating iCloud config directory", &self.cloud_root, e))?;

        if links_to(&config_path, &cloud_path) {
            debug!(config = %config_path.display(), "iCloud sync already enabled");
            return Ok(CloudSyncResult {
                provider: ICLOUD_PROVIDER.to_string(),
                config_path,
                cloud_path,
                backup_path: None,
                message: "iCloud sync already enabled".to_string(),
                warnings: Vec::new(),
            });
        }

        ensure_cloud_config(&cloud_path, &config_path)?;
        let outcome = self.replace_with_symlink(&config_path, &cloud_path)?;

        self.ctx.config_changed();
        info!(
            config = %config_path.display(),
            cloud = %cloud_path.display(),
            "iCloud sync enabled"
        );

        let message = if outcome.backup_path.is_some() {
            "iCloud sync enabled, local config backed up"
        } else {
            "iCloud sync enabled"
        };

        Ok(CloudSyncResult {
            provider: ICLOUD_PROVIDER.to_string(),
            config_path,
            cloud_path,
            backup_path: outcome.backup_path,
            message: message.to_string(),
            warnings: outcome.warnings,
        })
    }

    pub fn disable(&self) -> Result<CloudSyncResult> {
        let config_path = self.ctx.config_path()?;

        let metadata = match fs::symlink_metadata(&config_path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::SyncNotEnabled { path: config_path })
            }
            Err(e) => return Err(Error::io("checking config path", config_path, e)),
        };

        if !metadata.file_type().is_symlink() {
            return Err(Error::SyncNotEnabled { path: config_path });
        }

        let target = resolve_symlink(&config_path)?;
        if !self.is_in_cloud_root(&target) {
            return Err(Error::UnmanagedSymlink {
                path: config_path,
                target,
            });
        }

        let link_target = fs::read_link(&config_path)
            .map_err(|e| Error::io("reading config symlink", &config_path, e))?;
        fs::remove_file(&config_path)
            .map_err(|e| Error::io("removing config symlink", &config_path, e))?;

        let backup_path = match self.restore_local_config(&config_path, &target) {
            Ok(restored) => restored,
            Err(err) => {
                warn!(config = %config_path.display(), error = %err, "restore failed, relinking");
                // A failed copy can leave a partial file behind
                let _ = fs::remove_file(&config_path);
                if let Err(relink) = (self.symlink)(&link_target, &config_path) {
                    return Err(match err {
                        Error::Io {
                            action,
                            path,
                            source,
                        } => Error::RollbackFailed {
                            action,
                            path,
                            source,
                            restore: config_path,
                            rollback: relink,
                        },
                        other => other,
                    });
                }
                return Err(err);
            }
        };

        self.ctx.config_changed();
        info!(config = %config_path.display(), "iCloud sync disabled");

        Ok(CloudSyncResult {
            provider: ICLOUD_PROVIDER.to_string(),
            config_path,
            cloud_path: target,
            backup_path,
            message: "iCloud sync disabled".to_string(),
            warnings: Vec::new(),
        })
    }

    fn is_in_cloud_root(&self, resolved: &Path) -> bool {
        let root = fs::canonicalize(&self.cloud_root).unwrap_or_else(|_| self.cloud_root.clone());
        resolved.starts_with(root)
    }

    /// Back up whatever is at `config_path`, then link it to `cloud_path`
    fn replace_with_symlink(&self, config_path: &Path, cloud_path: &Path) -> Result<BackupOutcome> {
        if config_path == cloud_path {
            return Ok(BackupOutcome::default());
        }

        match fs::symlink_metadata(config_path) {
            Ok(_) => {
                let outcome = self.store.create_backup(config_path, SYNC_BACKUP_REASON)?;
                if let Err(source) = (self.symlink)(cloud_path, config_path) {
                    if let Some(backup) = &outcome.backup_path {
                        if let Err(rollback) = fs::rename(backup, config_path) {
                            warn!(
                                backup = %backup.display(),
                                error = %rollback,
                                "failed restoring backup after symlink error"
                            );
                            return Err(Error::RollbackFailed {
                                action: "creating config symlink",
                                path: config_path.to_path_buf(),
                                source,
                                restore: backup.clone(),
                                rollback,
                            });
                        }
                        info!(config = %config_path.display(), "symlink failed, original config restored");
                    }
                    return Err(Error::io("creating config symlink", config_path, source));
                }
                Ok(outcome)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if let Some(parent) = config_path.parent() {
                    fs::create_dir_all(parent)
                        .map_err(|e| Error::io("creating config directory", parent, e))?;
                }
                (self.symlink)(cloud_path, config_path)
                    .map_err(|e| Error::io("creating config symlink", config_path, e))?;
                Ok(BackupOutcome::default())
            }
            Err(e) => Err(Error::io("checking config path", config_path, e)),
        }
    }

    /// Put a regular config back at `config_path` after the link is gone
    fn restore_local_config(&self, config_path: &Path, cloud_path: &Path) -> Result<Option<PathBuf>> {
        if let Some(backup) = self.store.latest_backup(config_path) {
            fs::rename(&backup, config_path)
                .map_err(|e| Error::io("restoring config backup", &backup, e))?;
            debug!(backup = %backup.display(), "restored config backup");
            return Ok(Some(backup));
        }

        debug!(cloud = %cloud_path.display(), "no backup found, copying iCloud config");
        let data =
            fs::read(cloud_path).map_err(|e| Error::io("reading iCloud config", cloud_path, e))?;
        fs::write(config_path, data)
            .map_err(|e| Error::io("restoring local config", config_path, e))?;
        Ok(None)
    }
}

/// Seed the cloud file unless it already exists
///
/// An existing cloud file may be the synced copy from another machine, so it
/// is never overwritten.
fn ensure_cloud_config(cloud_path: &Path, source_path: &Path) -> Result<()> {
    if fs::metadata(cloud_path).is_ok() {
        debug!(cloud = %cloud_path.display(), "keeping existing iCloud config");
        return Ok(());
    }

    if fs::symlink_metadata(source_path).is_ok() {
        match fs::read(source_path) {
            Ok(data) => {
                fs::write(cloud_path, data)
                    .map_err(|e| Error::io("writing iCloud config", cloud_path, e))?;
                info!(cloud = %cloud_path.display(), "seeded iCloud config from local config");
                return Ok(());
            }
            // Dangling link, e.g. a previous sync whose cloud file is gone
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(config = %source_path.display(), "local config is a dangling symlink");
            }
            Err(e) => return Err(Error::io("reading existing config", source_path, e)),
        }
    }

    fs::write(cloud_path, DEFAULT_CONFIG_TEMPLATE)
        .map_err(|e| Error::io("creating iCloud config", cloud_path, e))?;
    info!(cloud = %cloud_path.display(), "created default iCloud config");
    Ok(())
}

/// True when `link` is a symlink resolving to the same file as `target`
fn links_to(link: &Path, target: &Path) -> bool {
    let is_symlink = fs::symlink_metadata(link)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false);
    if !is_symlink {
        return false;
    }
    match (fs::canonicalize(link), fs::canonicalize(target)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn resolve_symlink(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).map_err(|source| Error::UnresolvableSymlink {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::finicky::backup::MAX_BACKUPS_PER_CONFIG;
    use crate::finicky::locator::{CandidateList, ChangeListener};
    use std::os::unix::fs::symlink;
    use std::sync::Arc;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        dir: TempDir,
        manager: CloudSyncManager,
        store: BackupStore,
        listener: ChangeListener,
    }

    impl Fixture {
        fn new(config_name: &str) -> Self {
            let dir = tempdir().unwrap();
            let home = dir.path().join("home");
            fs::create_dir_all(&home).unwrap();
            let locator = Arc::new(CandidateList::new(vec![home.join(config_name)]));
            let (ctx, listener) = ConfigContext::with_listener(locator);
            let store = BackupStore::new(dir.path().join("backups"));
            let manager = CloudSyncManager::new(ctx, store.clone(), dir.path().join("iCloud"));
            Self {
                dir,
                manager,
                store,
                listener,
            }
        }

        fn config(&self) -> PathBuf {
            self.manager.ctx.config_path().unwrap()
        }

        fn backup_count(&self) -> usize {
            self.store.list(&self.config()).unwrap().len()
        }
    }

    fn is_symlink(path: &Path) -> bool {
        fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }

    #[test]
    fn test_status_disabled_without_config() {
        let fx = Fixture::new(".finicky.js");
        let status = fx.manager.status().unwrap();
        assert!(!status.enabled);
        assert_eq!(status.state(), SyncState::Disabled);
        assert_eq!(status.cloud_path, None);
    }

    #[test]
    fn test_status_disabled_for_regular_file() {
        let fx = Fixture::new(".finicky.js");
        fs::write(fx.config(), "local").unwrap();
        assert_eq!(fx.manager.status().unwrap().state(), SyncState::Disabled);
    }

    #[test]
    fn test_enable_without_local_config_seeds_template() {
        let fx = Fixture::new(".finicky.js");

        let result = fx.manager.enable().unwrap();

        assert_eq!(result.backup_path, None);
        assert_eq!(result.message, "iCloud sync enabled");
        assert_eq!(result.cloud_path, fx.dir.path().join("iCloud/.finicky.js"));
        assert_eq!(
            fs::read_to_string(&result.cloud_path).unwrap(),
            DEFAULT_CONFIG_TEMPLATE
        );
        assert!(is_symlink(&fx.config()));
        assert!(fx.manager.status().unwrap().enabled);
        assert!(fx.listener.take());
    }

    #[test]
    fn test_enable_is_idempotent() {
        let fx = Fixture::new(".finicky.js");
        fs::write(fx.config(), "local").unwrap();

        let first = fx.manager.enable().unwrap();
        assert!(first.backup_path.is_some());
        assert!(fx.listener.take());

        let second = fx.manager.enable().unwrap();
        assert_eq!(second.backup_path, None);
        assert_eq!(fx.backup_count(), 1);
        assert!(!fx.listener.take());
        assert!(matches!(
            fx.manager.status().unwrap().state(),
            SyncState::Enabled { .. }
        ));
    }

    #[test]
    fn test_enable_seeds_cloud_from_local_and_backs_up() {
        let fx = Fixture::new(".finicky.js");
        fs::write(fx.config(), "local config").unwrap();

        let result = fx.manager.enable().unwrap();

        assert_eq!(
            fs::read_to_string(&result.cloud_path).unwrap(),
            "local config"
        );
        let backup = result.backup_path.unwrap();
        assert_eq!(fs::read_to_string(backup).unwrap(), "local config");
        assert_eq!(fs::read_to_string(fx.config()).unwrap(), "local config");
        assert_eq!(result.message, "iCloud sync enabled, local config backed up");
    }

    #[test]
    fn test_enable_keeps_existing_cloud_config() {
        let fx = Fixture::new(".finicky.js");
        fs::write(fx.config(), "local").unwrap();
        let cloud = fx.manager.cloud_config_path(&fx.config());
        fs::create_dir_all(cloud.parent().unwrap()).unwrap();
        fs::write(&cloud, "from another mac").unwrap();

        fx.manager.enable().unwrap();

        assert_eq!(fs::read_to_string(&cloud).unwrap(), "from another mac");
        assert_eq!(fs::read_to_string(fx.config()).unwrap(), "from another mac");
    }

    #[test]
    fn test_enable_keeps_typescript_extension() {
        let fx = Fixture::new(".finicky.ts");
        let result = fx.manager.enable().unwrap();
        assert!(result.cloud_path.ends_with(".finicky.ts"));
    }

    #[test]
    fn test_enable_then_disable_restores_content() {
        let fx = Fixture::new(".finicky.js");
        let original = b"export default { defaultBrowser: \"Firefox\" };\n\x00\xff";
        fs::write(fx.config(), original).unwrap();

        fx.manager.enable().unwrap();
        let result = fx.manager.disable().unwrap();

        assert!(result.backup_path.is_some());
        assert!(!is_symlink(&fx.config()));
        assert_eq!(fs::read(fx.config()).unwrap(), original);
        assert!(!fx.manager.status().unwrap().enabled);
        assert_eq!(fx.backup_count(), 0);
    }

    #[test]
    fn test_disable_without_backup_copies_cloud_config() {
        let fx = Fixture::new(".finicky.js");
        fx.manager.enable().unwrap();

        let result = fx.manager.disable().unwrap();

        assert_eq!(result.backup_path, None);
        assert!(!is_symlink(&fx.config()));
        assert_eq!(
            fs::read_to_string(fx.config()).unwrap(),
            DEFAULT_CONFIG_TEMPLATE
        );
    }

    #[test]
    fn test_disable_falls_back_to_legacy_backup() {
        let fx = Fixture::new(".finicky.js");
        fx.manager.enable().unwrap();
        let legacy = PathBuf::from(format!("{}.backup-1700000000", fx.config().display()));
        fs::write(&legacy, "legacy").unwrap();

        let result = fx.manager.disable().unwrap();

        assert_eq!(result.backup_path, Some(legacy.clone()));
        assert_eq!(fs::read_to_string(fx.config()).unwrap(), "legacy");
        assert!(!legacy.exists());
    }

    #[test]
    fn test_disable_without_enable_fails() {
        let fx = Fixture::new(".finicky.js");
        assert!(matches!(
            fx.manager.disable(),
            Err(Error::SyncNotEnabled { .. })
        ));

        fs::write(fx.config(), "local").unwrap();
        let err = fx.manager.disable().unwrap_err();
        assert!(matches!(err, Error::SyncNotEnabled { .. }));
        assert_eq!(fs::read_to_string(fx.config()).unwrap(), "local");
        assert_eq!(fx.backup_count(), 0);
    }

    #[test]
    fn test_disable_refuses_unmanaged_symlink() {
        let fx = Fixture::new(".finicky.js");
        let elsewhere = fx.dir.path().join("dotfiles.js");
        fs::write(&elsewhere, "dotfiles").unwrap();
        symlink(&elsewhere, fx.config()).unwrap();

        let status = fx.manager.status().unwrap();
        assert!(!status.enabled);
        assert_eq!(status.cloud_path, Some(fs::canonicalize(&elsewhere).unwrap()));

        let err = fx.manager.disable().unwrap_err();
        assert!(matches!(err, Error::UnmanagedSymlink { .. }));
        assert_eq!(fs::read_link(fx.config()).unwrap(), elsewhere);
    }

    #[test]
    fn test_enable_backs_up_unmanaged_symlink() {
        let fx = Fixture::new(".finicky.js");
        let elsewhere = fx.dir.path().join("dotfiles.js");
        fs::write(&elsewhere, "dotfiles").unwrap();
        symlink(&elsewhere, fx.config()).unwrap();

        let result = fx.manager.enable().unwrap();
        assert_eq!(fs::read_to_string(&result.cloud_path).unwrap(), "dotfiles");

        fx.manager.disable().unwrap();
        assert_eq!(fs::read_link(fx.config()).unwrap(), elsewhere);
    }

    #[test]
    fn test_dangling_symlink_is_inconsistent() {
        let fx = Fixture::new(".finicky.js");
        symlink(fx.dir.path().join("gone.js"), fx.config()).unwrap();

        let err = fx.manager.status().unwrap_err();
        assert!(matches!(err, Error::UnresolvableSymlink { .. }));
        assert!(matches!(
            fx.manager.disable(),
            Err(Error::UnresolvableSymlink { .. })
        ));
    }

    #[test]
    fn test_failed_symlink_restores_original_config() {
        let mut fx = Fixture::new(".finicky.js");
        fx.manager = fx
            .manager
            .clone()
            .with_symlink_fn(|_, _| Err(io::Error::new(io::ErrorKind::PermissionDenied, "nope")));
        fs::write(fx.config(), "precious").unwrap();

        let err = fx.manager.enable().unwrap_err();

        assert!(matches!(err, Error::Io { .. }));
        assert!(!is_symlink(&fx.config()));
        assert_eq!(fs::read_to_string(fx.config()).unwrap(), "precious");
        assert_eq!(fx.backup_count(), 0);
        assert!(!fx.listener.take());
    }

    fn set_mtime(path: &Path, secs: u64) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    /// Fill the backup history, dated `base` onward, then write an older local config
    fn with_full_history(fx: &Fixture, base: u64) {
        for i in 0..MAX_BACKUPS_PER_CONFIG as u64 {
            fs::write(fx.config(), format!("old{}", i)).unwrap();
            let backup = fx
                .store
                .create_backup(&fx.config(), SYNC_BACKUP_REASON)
                .unwrap()
                .backup_path
                .unwrap();
            set_mtime(&backup, base + i);
        }
        fs::write(fx.config(), "precious").unwrap();
        set_mtime(&fx.config(), 1_500_000_000);
    }

    #[test]
    fn test_round_trip_with_old_local_mtime() {
        for base in [1_700_000_000, 2_000_000_000] {
            let fx = Fixture::new(".finicky.js");
            with_full_history(&fx, base);

            let enabled = fx.manager.enable().unwrap();
            assert!(enabled.backup_path.as_ref().unwrap().exists());

            fx.manager.disable().unwrap();
            assert_eq!(fs::read_to_string(fx.config()).unwrap(), "precious");
        }
    }

    #[test]
    fn test_failed_symlink_with_full_history_keeps_config() {
        let mut fx = Fixture::new(".finicky.js");
        with_full_history(&fx, 2_000_000_000);
        fx.manager = fx
            .manager
            .clone()
            .with_symlink_fn(|_, _| Err(io::Error::new(io::ErrorKind::PermissionDenied, "nope")));

        let err = fx.manager.enable().unwrap_err();

        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(fs::read_to_string(fx.config()).unwrap(), "precious");
    }

    /// Link the config to a cloud "file" that is really a directory, so it
    /// resolves inside iCloud but cannot be copied back
    fn link_to_unreadable_cloud_config(fx: &Fixture) -> PathBuf {
        let cloud = fx.manager.cloud_config_path(&fx.config());
        fs::create_dir_all(&cloud).unwrap();
        symlink(&cloud, fx.config()).unwrap();
        cloud
    }

    #[test]
    fn test_failed_restore_relinks() {
        let fx = Fixture::new(".finicky.js");
        let cloud = link_to_unreadable_cloud_config(&fx);

        let err = fx.manager.disable().unwrap_err();

        assert!(matches!(err, Error::Io { .. }));
        assert!(is_symlink(&fx.config()));
        assert_eq!(fs::read_link(fx.config()).unwrap(), cloud);
        assert!(fx.manager.status().unwrap().enabled);
        assert!(!fx.listener.take());
    }

    #[test]
    fn test_failed_restore_and_relink_reports_both() {
        let mut fx = Fixture::new(".finicky.js");
        link_to_unreadable_cloud_config(&fx);
        fx.manager = fx
            .manager
            .clone()
            .with_symlink_fn(|_, _| Err(io::Error::new(io::ErrorKind::PermissionDenied, "nope")));

        let err = fx.manager.disable().unwrap_err();

        match &err {
            Error::RollbackFailed { restore, .. } => assert_eq!(restore, &fx.config()),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("nope"));
    }
}
