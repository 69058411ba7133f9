//! Core Finicky config operations

pub mod backup;
pub mod cloud_sync;
pub mod error;
pub mod generated;
pub mod locator;
pub mod profiles;
pub mod response;

pub use backup::{BackupStore, PruneWarning};
pub use cloud_sync::{CloudSyncManager, SyncState};
pub use error::{Error, ErrorKind, Result};
pub use generated::{GeneratedConfigRequest, GeneratedConfigWriter};
pub use locator::{CandidateList, ConfigContext, ConfigLocator};
pub use response::Response;
