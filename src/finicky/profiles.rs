//! Chromium profile discovery
//!
//! Chromium-based browsers keep their profile list in a JSON file called
//! `Local State`:
//!
//! ```json
//! { "profile": { "info_cache": { "Profile 1": { "name": "Work", ... } } } }
//! ```
//!
//! Only the fields needed here are decoded; everything else is ignored. A
//! file that lacks the profile section, or holds a record without a name or
//! with an empty one, is reported as malformed rather than partially read.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::error::{Error, Result};

/// A Chromium browser whose profiles can be scanned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChromiumBrowser {
    pub id: &'static str,
    pub app_name: &'static str,
    /// Directory under the platform application-support dir
    pub config_dir: &'static str,
}

pub const CHROMIUM_BROWSERS: &[ChromiumBrowser] = &[
    ChromiumBrowser {
        id: "company.thebrowser.Browser",
        app_name: "Arc",
        config_dir: "Arc/User Data",
    },
    ChromiumBrowser {
        id: "com.brave.Browser",
        app_name: "Brave Browser",
        config_dir: "BraveSoftware/Brave-Browser",
    },
    ChromiumBrowser {
        id: "org.chromium.Chromium",
        app_name: "Chromium",
        config_dir: "Chromium",
    },
    ChromiumBrowser {
        id: "com.google.Chrome",
        app_name: "Google Chrome",
        config_dir: "Google/Chrome",
    },
    ChromiumBrowser {
        id: "com.google.Chrome.canary",
        app_name: "Google Chrome Canary",
        config_dir: "Google/Chrome Canary",
    },
    ChromiumBrowser {
        id: "com.microsoft.edgemac",
        app_name: "Microsoft Edge",
        config_dir: "Microsoft Edge",
    },
    ChromiumBrowser {
        id: "com.vivaldi.Vivaldi",
        app_name: "Vivaldi",
        config_dir: "Vivaldi",
    },
];

/// Non-Chromium browsers offered to the config builder: (bundle id, app name)
const DEFAULT_BROWSERS: &[(&str, &str)] = &[
    ("com.apple.Safari", "Safari"),
    ("org.mozilla.firefox", "Firefox"),
    ("com.apple.SafariTechnologyPreview", "Safari Technology Preview"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BrowserKind {
    Chromium,
    Default,
}

/// A browser the config builder can route to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserOption {
    pub id: String,
    pub app_name: String,
    #[serde(rename = "type")]
    pub kind: BrowserKind,
    pub supports_profiles: bool,
}

#[derive(Debug, Deserialize)]
struct LocalState {
    profile: Option<ProfileSection>,
}

#[derive(Debug, Deserialize)]
struct ProfileSection {
    info_cache: Option<BTreeMap<String, ProfileInfo>>,
}

#[derive(Debug, Deserialize)]
struct ProfileInfo {
    name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrowserProfile {
    /// Display name shown in the browser
    pub name: String,
    /// Profile folder, e.g. `Default` or `Profile 1`
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserProfileGroup {
    pub id: String,
    pub app_name: String,
    pub profiles: Vec<BrowserProfile>,
}

/// Result of scanning every known browser
#[derive(Debug, Default, Serialize)]
pub struct ProfileScan {
    pub groups: Vec<BrowserProfileGroup>,
    /// Browsers whose profile store exists but could not be read
    pub issues: Vec<String>,
}

fn read_info_cache(local_state: &Path) -> Result<BTreeMap<String, ProfileInfo>> {
    let content = fs::read_to_string(local_state).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            Error::NotFound {
                path: local_state.to_path_buf(),
            }
        } else {
            Error::io("reading profile store", local_state, e)
        }
    })?;

    let malformed = |reason: String| Error::MalformedProfileStore {
        path: local_state.to_path_buf(),
        reason,
    };

    let state: LocalState = serde_json::from_str(&content).map_err(|e| malformed(e.to_string()))?;
    let cache = state
        .profile
        .ok_or_else(|| malformed("missing profile section".to_string()))?
        .info_cache
        .ok_or_else(|| malformed("missing profile info_cache".to_string()))?;

    if let Some((dir, _)) = cache.iter().find(|(_, info)| info.name.is_empty()) {
        return Err(malformed(format!("profile {} has an empty name", dir)));
    }
    Ok(cache)
}

/// Profiles listed in a `Local State` file, sorted by display name
pub fn read_profiles(local_state: &Path) -> Result<Vec<BrowserProfile>> {
    let mut profiles: Vec<BrowserProfile> = read_info_cache(local_state)?
        .into_iter()
        .map(|(path, info)| BrowserProfile {
            name: info.name,
            path,
        })
        .collect();
    profiles.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
    Ok(profiles)
}

/// Map a configured profile to its folder name
///
/// An exact folder match wins over a display-name match.
pub fn resolve_profile(local_state: &Path, wanted: &str) -> Result<Option<String>> {
    let cache = read_info_cache(local_state)?;

    if cache.contains_key(wanted) {
        return Ok(Some(wanted.to_string()));
    }

    let by_name = cache
        .iter()
        .find(|(_, info)| info.name == wanted)
        .map(|(path, _)| path.clone());

    match &by_name {
        Some(path) => warn!(
            profile = wanted,
            path = %path,
            "found profile by name, prefer the profile folder name"
        ),
        None => {
            let available: Vec<&str> = cache.values().map(|i| i.name.as_str()).collect();
            warn!(
                expected = wanted,
                available = %available.join(", "),
                "profile not found"
            );
        }
    }
    Ok(by_name)
}

/// Path of a browser's `Local State` under the application-support dir
pub fn local_state_path(app_support: &Path, browser: &ChromiumBrowser) -> PathBuf {
    app_support.join(browser.config_dir).join("Local State")
}

/// Collect profiles for every installed Chromium browser
pub fn scan_chromium_profiles(app_support: &Path, browsers: &[ChromiumBrowser]) -> ProfileScan {
    let mut scan = ProfileScan::default();

    for browser in browsers {
        let local_state = local_state_path(app_support, browser);
        match read_profiles(&local_state) {
            Ok(profiles) if profiles.is_empty() => {}
            Ok(profiles) => scan.groups.push(BrowserProfileGroup {
                id: browser.id.to_string(),
                app_name: browser.app_name.to_string(),
                profiles,
            }),
            Err(Error::NotFound { .. }) => {
                debug!(browser = browser.app_name, "no profile store");
            }
            Err(e) => {
                warn!(browser = browser.app_name, error = %e, "skipping browser");
                scan.issues.push(format!("{}: {}", browser.app_name, e));
            }
        }
    }

    scan.groups.sort_by(|a, b| a.app_name.cmp(&b.app_name));
    scan
}

/// Browsers offered to the config builder, sorted and unique by app name
///
/// Catalog entries come first, so they win over a default of the same name.
pub fn list_browser_options(browsers: &[ChromiumBrowser]) -> Vec<BrowserOption> {
    let chromium = browsers.iter().map(|b| BrowserOption {
        id: b.id.to_string(),
        app_name: b.app_name.to_string(),
        kind: BrowserKind::Chromium,
        supports_profiles: true,
    });
    let defaults = DEFAULT_BROWSERS.iter().map(|(id, app_name)| BrowserOption {
        id: id.to_string(),
        app_name: app_name.to_string(),
        kind: BrowserKind::Default,
        supports_profiles: false,
    });

    let mut options: Vec<BrowserOption> = chromium.chain(defaults).collect();
    options.sort_by(|a, b| a.app_name.cmp(&b.app_name));
    options.dedup_by(|later, kept| later.app_name == kept.app_name);
    options
}
