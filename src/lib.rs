//! finicky-helper library
//!
//! Core functionality for Finicky config persistence: rotating backups,
//! config generation, and iCloud sync via symlinks.
//!
//! # Disclaimer
//!
//! This tool is not affiliated with or endorsed by the Finicky project.
//! It only reads and writes the config file and its backups on your machine.

pub mod config;
pub mod finicky;
