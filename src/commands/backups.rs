//! Backups command - List the retained backups of the active config

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, ContentArrangement, Table};
use serde::Serialize;
use std::path::PathBuf;

use super::utils::{self, Session};
use finicky_helper::finicky::backup::BackupEntry;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupList {
    pub config_path: PathBuf,
    pub backup_dir: PathBuf,
    pub backups: Vec<BackupEntry>,
    /// Newest `<config>.backup-*` file from older releases, if any
    pub legacy_backup: Option<PathBuf>,
}

/// Collect backups for the active config
pub fn list(session: &Session) -> finicky_helper::finicky::Result<BackupList> {
    let config_path = session.ctx.config_path()?;
    let backups = session.store.list(&config_path)?;
    let legacy_backup = session.store.latest_legacy(&config_path);
    Ok(BackupList {
        backup_dir: session.store.dir().to_path_buf(),
        config_path,
        backups,
        legacy_backup,
    })
}

/// Execute the backups command
pub fn execute(session: &Session) -> Result<()> {
    session.finish(list(session), |list| println!("{}", format_list(list)))
}

/// Render the backup list as a table
pub fn format_list(list: &BackupList) -> String {
    if list.backups.is_empty() && list.legacy_backup.is_none() {
        return format!("No backups found for {}", list.config_path.display());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Created"),
            Cell::new("Reason"),
            Cell::new("Size"),
            Cell::new("File"),
        ]);

    for entry in &list.backups {
        let created = entry
            .created
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        let file = entry
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(created),
            Cell::new(entry.reason.as_deref().unwrap_or("-")),
            Cell::new(utils::format_size(entry.size)),
            Cell::new(file),
        ]);
    }

    let mut output = format!(
        "Backups for {}\nin {}\n\n{}",
        list.config_path.display(),
        list.backup_dir.display(),
        table
    );
    if let Some(legacy) = &list.legacy_backup {
        output.push_str(&format!("\n\nLegacy backup: {}", legacy.display()));
    }
    output.push_str(&format!("\n\n{} backups found", list.backups.len()));
    output
}
