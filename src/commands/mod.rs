//! CLI commands

pub mod backups;
pub mod generate;
pub mod profiles;
pub mod sync;
pub mod utils;
