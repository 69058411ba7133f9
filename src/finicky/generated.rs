//! Config generation from structured routes
//!
//! Turns a `{defaultBrowser, routes[]}` request into a Finicky config and
//! writes it with the same backup-first discipline as every other change.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::backup::{BackupStore, PruneWarning};
use super::error::{Error, Result};
use super::locator::ConfigContext;

/// Reason tag recorded on backups taken before writing a generated config
pub const BUILDER_BACKUP_REASON: &str = "builder";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedRoute {
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub browser: String,
    #[serde(default)]
    pub profile: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedConfigRequest {
    #[serde(default)]
    pub default_browser: String,
    #[serde(default)]
    pub routes: Vec<GeneratedRoute>,
}

impl GeneratedConfigRequest {
    fn validate(&self) -> Result<()> {
        if self.default_browser.trim().is_empty() {
            return Err(Error::MissingField {
                field: "default browser",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveGeneratedConfigResult {
    pub config_path: PathBuf,
    pub backup_path: Option<PathBuf>,
    pub message: String,
    pub warnings: Vec<PruneWarning>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewGeneratedConfigResult {
    pub content: String,
}

/// Writes `contents` to `path`
pub type WriteFn = fn(path: &Path, contents: &[u8]) -> io::Result<()>;

fn write_file(path: &Path, contents: &[u8]) -> io::Result<()> {
    fs::write(path, contents)
}

/// Writes generated configs to the canonical config path
#[derive(Debug, Clone)]
pub struct GeneratedConfigWriter {
    ctx: ConfigContext,
    store: BackupStore,
    write: WriteFn,
}

impl GeneratedConfigWriter {
    pub fn new(ctx: ConfigContext, store: BackupStore) -> Self {
        Self {
            ctx,
            store,
            write: write_file,
        }
    }

    /// Replace the file write primitive
    pub fn with_write_fn(mut self, write: WriteFn) -> Self {
        self.write = write;
        self
    }

    pub fn preview(&self, request: &GeneratedConfigRequest) -> Result<PreviewGeneratedConfigResult> {
        request.validate()?;
        Ok(PreviewGeneratedConfigResult {
            content: build_config_content(request),
        })
    }

    /// Back up the current config, then write the generated one in its place
    ///
    /// If sync is enabled the symlink itself is what gets backed up, so the
    /// saved config replaces the link with a regular file.
    pub fn save(&self, request: &GeneratedConfigRequest) -> Result<SaveGeneratedConfigResult> {
        request.validate()?;

        let config_path = self.ctx.config_path()?;
        let content = build_config_content(request);
        let outcome = self.store.create_backup(&config_path, BUILDER_BACKUP_REASON)?;

        let written = config_path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| (self.write)(&config_path, content.as_bytes()));

        if let Err(source) = written {
            if let Some(backup) = &outcome.backup_path {
                let _ = fs::remove_file(&config_path);
                if let Err(rollback) = fs::rename(backup, &config_path) {
                    warn!(backup = %backup.display(), error = %rollback, "failed restoring backup after write error");
                    return Err(Error::RollbackFailed {
                        action: "writing config",
                        path: config_path,
                        source,
                        restore: backup.clone(),
                        rollback,
                    });
                }
            }
            return Err(Error::io("writing config", config_path, source));
        }

        self.ctx.config_changed();
        info!(config = %config_path.display(), "generated config saved");

        Ok(SaveGeneratedConfigResult {
            config_path,
            backup_path: outcome.backup_path,
            message: "Config generated successfully".to_string(),
            warnings: outcome.warnings,
        })
    }
}

/// Render a request as a Finicky config module
pub fn build_config_content(request: &GeneratedConfigRequest) -> String {
    let mut out = String::new();
    out.push_str("export default {\n");
    // Validation trims, but the value is written exactly as given
    let _ = writeln!(out, "  defaultBrowser: {},", quote(&request.default_browser));
    out.push_str("  handlers: [\n");

    for route in &request.routes {
        let patterns = normalize_patterns(&route.patterns);
        let browser = route.browser.trim();
        if patterns.is_empty() || browser.is_empty() {
            continue;
        }
        let profile = route.profile.trim();

        out.push_str("    {\n");
        out.push_str("      match: [\n");
        for pattern in &patterns {
            let _ = writeln!(out, "        {},", quote(pattern));
        }
        out.push_str("      ],\n");
        if profile.is_empty() {
            let _ = writeln!(out, "      browser: {},", quote(browser));
        } else {
            out.push_str("      browser: {\n");
            let _ = writeln!(out, "        name: {},", quote(browser));
            let _ = writeln!(out, "        profile: {},", quote(profile));
            out.push_str("      },\n");
        }
        out.push_str("    },\n");
    }

    out.push_str("  ],\n");
    out.push_str("};\n");
    out
}

/// Clean, dedupe and sort match patterns
pub fn normalize_patterns(patterns: &[String]) -> Vec<String> {
    patterns
        .iter()
        .map(|p| sanitize_pattern(p))
        .filter(|p| !p.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Undo common copy/paste noise: whitespace, a trailing comma, one layer of quotes
fn sanitize_pattern(value: &str) -> String {
    let mut trimmed = value.trim();
    trimmed = trimmed.strip_suffix(',').unwrap_or(trimmed);
    if trimmed.len() >= 2 {
        for q in ['"', '\''] {
            if trimmed.len() >= 2 && trimmed.starts_with(q) && trimmed.ends_with(q) {
                trimmed = &trimmed[1..trimmed.len() - 1];
            }
        }
    }
    trimmed.trim().to_string()
}

/// JavaScript string literal
fn quote(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}
