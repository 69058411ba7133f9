//! Platform-specific configuration and paths

use anyhow::{Context, Result};
use std::path::PathBuf;

/// iCloud Drive documents folder, relative to the home directory
const ICLOUD_DOCS_DIR: &str = "Library/Mobile Documents/com~apple~CloudDocs";

fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("Could not determine home directory")
}

/// Get the shared backup directory (~/finicky/backups/)
pub fn backup_dir() -> Result<PathBuf> {
    Ok(home_dir()?.join("finicky").join("backups"))
}

/// Get the iCloud Drive root the config is synced into
pub fn icloud_root() -> Result<PathBuf> {
    Ok(home_dir()?.join(ICLOUD_DOCS_DIR))
}

/// Default config locations, highest priority first
pub fn default_config_paths() -> Result<Vec<PathBuf>> {
    let home = home_dir()?;
    let config = home.join(".config");
    Ok(vec![
        home.join(".finicky.js"),
        home.join(".finicky.ts"),
        config.join("finicky.js"),
        config.join("finicky.ts"),
        config.join("finicky").join("finicky.js"),
        config.join("finicky").join("finicky.ts"),
    ])
}

/// Get the directory Chromium browsers keep their data under
/// - macOS: ~/Library/Application Support/
/// - Linux: ~/.config/
/// - Windows: %LOCALAPPDATA%/
pub fn application_support_dir() -> Result<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        Ok(home_dir()?.join("Library").join("Application Support"))
    }

    #[cfg(target_os = "linux")]
    {
        dirs::config_dir().context("Could not determine config directory")
    }

    #[cfg(target_os = "windows")]
    {
        dirs::data_local_dir().context("Could not determine LocalAppData directory")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_exist() {
        // These should not panic
        let _ = backup_dir();
        let _ = icloud_root();
        let _ = application_support_dir();
    }

    #[test]
    fn test_default_config_paths_order() {
        let Ok(paths) = default_config_paths() else {
            return;
        };
        assert_eq!(paths.len(), 6);
        assert!(paths[0].ends_with(".finicky.js"));
        assert!(paths[1].ends_with(".finicky.ts"));
        assert!(paths[5].ends_with("finicky/finicky.ts"));
    }
}
