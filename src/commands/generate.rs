//! Generate commands - Write a config from a JSON route description
//!
//! The request file looks like:
//!
//! ```json
//! {
//!   "defaultBrowser": "Safari",
//!   "routes": [
//!     { "patterns": ["github.com"], "browser": "Google Chrome", "profile": "Work" }
//!   ]
//! }
//! ```

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::fs;
use std::io::{self, Read};

use super::utils::{self, Session};
use finicky_helper::finicky::GeneratedConfigRequest;

/// Read a request from a file, or stdin when `source` is `-`
pub fn read_request(source: &str) -> Result<GeneratedConfigRequest> {
    let content = if source == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read request from stdin")?;
        buf
    } else {
        fs::read_to_string(source).with_context(|| format!("Failed to read: {}", source))?
    };

    serde_json::from_str(&content).context("Failed to parse config request")
}

/// Execute the save command
pub fn save(session: &Session, source: &str) -> Result<()> {
    let request = read_request(source)?;
    let result = session.config_writer().save(&request);
    session.finish(result, |saved| {
        println!("{} {}", "Saved:".green(), saved.config_path.display());
        if let Some(backup) = &saved.backup_path {
            println!("  Backup: {}", backup.display().dimmed());
        }
        utils::print_warnings(&saved.warnings);
    })
}

/// Execute the preview command
pub fn preview(session: &Session, source: &str) -> Result<()> {
    let request = read_request(source)?;
    let result = session.config_writer().preview(&request);
    session.finish(result, |preview| print!("{}", preview.content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_request_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"defaultBrowser": "Safari", "routes": [{{"patterns": ["a.com"], "browser": "Firefox"}}]}}"#
        )
        .unwrap();

        let request = read_request(file.path().to_str().unwrap()).unwrap();
        assert_eq!(request.default_browser, "Safari");
        assert_eq!(request.routes.len(), 1);
        assert_eq!(request.routes[0].browser, "Firefox");
    }

    #[test]
    fn test_read_request_rejects_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(read_request(file.path().to_str().unwrap()).is_err());
    }
}
