//! Sync commands - Move the config into iCloud Drive and back

use anyhow::Result;
use owo_colors::OwoColorize;

use super::utils::{self, Session};
use finicky_helper::finicky::cloud_sync::{CloudSyncResult, CloudSyncStatus};

/// Show whether the config is currently synced
pub fn status(session: &Session) -> Result<()> {
    let status = session.sync_manager().status();
    session.finish(status, print_status)
}

/// Execute the enable command
pub fn enable(session: &Session) -> Result<()> {
    let result = session.sync_manager().enable();
    session.finish(result, print_result)
}

/// Execute the disable command
pub fn disable(session: &Session) -> Result<()> {
    let result = session.sync_manager().disable();
    session.finish(result, print_result)
}

fn print_status(status: &CloudSyncStatus) {
    let state = if status.enabled {
        "enabled".green().to_string()
    } else {
        "disabled".yellow().to_string()
    };
    println!("{} sync: {}", status.provider, state);
    println!("  Config: {}", status.config_path.display());
    if let Some(cloud) = &status.cloud_path {
        let label = if status.enabled { "Cloud" } else { "Links to" };
        println!("  {}: {}", label, cloud.display());
    }
}

fn print_result(result: &CloudSyncResult) {
    println!("{}", result.message.green());
    println!("  Config: {}", result.config_path.display());
    println!("  Cloud: {}", result.cloud_path.display());
    if let Some(backup) = &result.backup_path {
        println!("  Backup: {}", backup.display().dimmed());
    }
    utils::print_warnings(&result.warnings);
}
