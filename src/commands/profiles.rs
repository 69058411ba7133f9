//! Profiles and browsers commands - What generated routes can target

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, ContentArrangement, Table};
use owo_colors::OwoColorize;
use serde::Serialize;

use super::utils::Session;
use finicky_helper::config;
use finicky_helper::finicky::profiles::{self, BrowserOption, ProfileScan, CHROMIUM_BROWSERS};

#[derive(Debug, Serialize)]
pub struct BrowserList {
    pub browsers: Vec<BrowserOption>,
}

/// Execute the browsers command
pub fn browsers(session: &Session) -> Result<()> {
    let list = BrowserList {
        browsers: profiles::list_browser_options(CHROMIUM_BROWSERS),
    };
    session.finish(Ok(list), |list| println!("{}", format_browsers(list)))
}

/// Render browser options as a table
pub fn format_browsers(list: &BrowserList) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Browser"),
            Cell::new("Bundle ID"),
            Cell::new("Profiles"),
        ]);

    for option in &list.browsers {
        table.add_row(vec![
            Cell::new(&option.app_name),
            Cell::new(&option.id),
            Cell::new(if option.supports_profiles { "yes" } else { "-" }),
        ]);
    }
    table.to_string()
}

/// Execute the profiles command
pub fn execute(session: &Session) -> Result<()> {
    let app_support = config::application_support_dir()?;
    let scan = profiles::scan_chromium_profiles(&app_support, CHROMIUM_BROWSERS);
    session.finish(Ok(scan), |scan| println!("{}", format_scan(scan)))
}

/// Render scanned profiles as a table
pub fn format_scan(scan: &ProfileScan) -> String {
    let mut output = String::new();

    if scan.groups.is_empty() {
        output.push_str("No Chromium profiles found.");
    } else {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Browser"),
                Cell::new("Profile"),
                Cell::new("Folder"),
            ]);

        for group in &scan.groups {
            for profile in &group.profiles {
                table.add_row(vec![
                    Cell::new(&group.app_name),
                    Cell::new(&profile.name),
                    Cell::new(&profile.path),
                ]);
            }
        }
        output.push_str(&table.to_string());
    }

    for issue in &scan.issues {
        output.push_str(&format!("\n{} {}", "Warning:".yellow(), issue));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use finicky_helper::finicky::profiles::{BrowserProfile, BrowserProfileGroup};
    use finicky_helper::finicky::Response;

    #[test]
    fn test_format_scan_empty() {
        let output = format_scan(&ProfileScan::default());
        assert_eq!(output, "No Chromium profiles found.");
    }

    #[test]
    fn test_format_scan_lists_profiles_and_issues() {
        let scan = ProfileScan {
            groups: vec![BrowserProfileGroup {
                id: "com.google.Chrome".to_string(),
                app_name: "Google Chrome".to_string(),
                profiles: vec![BrowserProfile {
                    name: "Work".to_string(),
                    path: "Profile 1".to_string(),
                }],
            }],
            issues: vec!["Vivaldi: malformed".to_string()],
        };

        let output = format_scan(&scan);
        assert!(output.contains("Google Chrome"));
        assert!(output.contains("Profile 1"));
        assert!(output.contains("Vivaldi: malformed"));
    }

    #[test]
    fn test_format_browsers() {
        let list = BrowserList {
            browsers: profiles::list_browser_options(CHROMIUM_BROWSERS),
        };

        let output = format_browsers(&list);
        assert!(output.contains("Safari Technology Preview"));
        assert!(output.contains("com.brave.Browser"));
    }

    #[test]
    fn test_browser_list_envelope() {
        let list = BrowserList {
            browsers: profiles::list_browser_options(&[]),
        };

        let json = Response::success(list).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(value["browsers"].as_array().unwrap().len(), 3);
        assert_eq!(value["browsers"][0]["appName"], "Firefox");
    }
}
