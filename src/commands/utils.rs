//! Shared utilities for commands

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use finicky_helper::config;
use finicky_helper::finicky::{
    self, BackupStore, CandidateList, CloudSyncManager, ConfigContext, GeneratedConfigWriter,
    PruneWarning, Response,
};

/// Path overrides and output mode shared by every command
#[derive(Debug, Default, Clone)]
pub struct GlobalOptions {
    /// Replaces the default candidate list when non-empty
    pub config_paths: Vec<PathBuf>,
    pub backup_dir: Option<PathBuf>,
    pub cloud_root: Option<PathBuf>,
    pub json: bool,
}

/// Everything a command needs to talk to the engine
pub struct Session {
    pub ctx: ConfigContext,
    pub store: BackupStore,
    pub cloud_root: PathBuf,
    pub json: bool,
}

impl Session {
    pub fn open(options: &GlobalOptions) -> Result<Self> {
        let candidates = if options.config_paths.is_empty() {
            config::default_config_paths()?
        } else {
            options.config_paths.clone()
        };
        let backup_dir = match &options.backup_dir {
            Some(dir) => dir.clone(),
            None => config::backup_dir()?,
        };
        let cloud_root = match &options.cloud_root {
            Some(dir) => dir.clone(),
            None => config::icloud_root()?,
        };

        // The CLI runs one request and exits, so nobody listens for changes.
        let (ctx, _listener) = ConfigContext::with_listener(Arc::new(CandidateList::new(candidates)));

        Ok(Self {
            ctx,
            store: BackupStore::new(backup_dir),
            cloud_root,
            json: options.json,
        })
    }

    pub fn sync_manager(&self) -> CloudSyncManager {
        CloudSyncManager::new(self.ctx.clone(), self.store.clone(), &self.cloud_root)
    }

    pub fn config_writer(&self) -> GeneratedConfigWriter {
        GeneratedConfigWriter::new(self.ctx.clone(), self.store.clone())
    }

    /// Print an engine result either as the JSON envelope or via `render`
    pub fn finish<T: Serialize>(
        &self,
        result: finicky::Result<T>,
        render: impl FnOnce(&T),
    ) -> Result<()> {
        if self.json {
            let failure = result.as_ref().err().map(|e| e.to_string());
            let response = Response::from(result);
            println!("{}", response.to_json().context("Failed to encode response")?);
            return match failure {
                Some(message) => Err(anyhow::anyhow!(message)),
                None => Ok(()),
            };
        }

        let value = result?;
        render(&value);
        Ok(())
    }
}

/// Print advisory warnings left behind by backup pruning
pub fn print_warnings(warnings: &[PruneWarning]) {
    for warning in warnings {
        eprintln!("{} {}", "Warning:".yellow(), warning);
    }
}

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.0 GB");
    }

    #[test]
    fn test_session_uses_overrides() {
        let dir = tempdir().unwrap();
        let config = dir.path().join(".finicky.js");
        let options = GlobalOptions {
            config_paths: vec![config.clone()],
            backup_dir: Some(dir.path().join("backups")),
            cloud_root: Some(dir.path().join("iCloud")),
            json: true,
        };

        let session = Session::open(&options).unwrap();

        assert_eq!(session.ctx.config_path().unwrap(), config);
        assert_eq!(session.store.dir(), dir.path().join("backups"));
        assert_eq!(session.sync_manager().cloud_root(), dir.path().join("iCloud"));
    }

    #[test]
    fn test_finish_json_failure_is_an_error() {
        let dir = tempdir().unwrap();
        let options = GlobalOptions {
            config_paths: vec![dir.path().join(".finicky.js")],
            backup_dir: Some(dir.path().join("backups")),
            cloud_root: Some(dir.path().join("iCloud")),
            json: true,
        };
        let session = Session::open(&options).unwrap();

        let result = session.sync_manager().disable();
        assert!(session.finish(result, |_| {}).is_err());

        let status = session.sync_manager().status();
        assert!(session.finish(status, |_| {}).is_ok());
    }
}
