//! Error type shared by the config engine
//!
//! Every failure carries enough context to be shown to the user verbatim;
//! none of them require a restart to recover from.

use serde::Serialize;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse classification used by the response envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    NotFound,
    PermissionOrIo,
    InvalidState,
    Inconsistent,
    Malformed,
}

#[derive(Debug, Error)]
pub enum Error {
    /// A filesystem step failed; `action` names the step
    #[error("failed {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A step failed and undoing its earlier half failed as well
    #[error("failed {action} {}: {source}; restoring {} also failed: {rollback}", path.display(), restore.display())]
    RollbackFailed {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
        restore: PathBuf,
        rollback: io::Error,
    },

    #[error("no candidate config paths configured")]
    NoCandidatePaths,

    #[error("icloud sync is not enabled for {}", path.display())]
    SyncNotEnabled { path: PathBuf },

    #[error("config symlink {} does not target iCloud (points to {})", path.display(), target.display())]
    UnmanagedSymlink { path: PathBuf, target: PathBuf },

    #[error("failed resolving config symlink {}: {source}", path.display())]
    UnresolvableSymlink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("malformed profile store {}: {reason}", path.display())]
    MalformedProfileStore { path: PathBuf, reason: String },

    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },
}

impl Error {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io { .. } | Error::RollbackFailed { .. } => ErrorKind::PermissionOrIo,
            Error::NoCandidatePaths
            | Error::SyncNotEnabled { .. }
            | Error::UnmanagedSymlink { .. }
            | Error::MissingField { .. } => ErrorKind::InvalidState,
            Error::UnresolvableSymlink { .. } => ErrorKind::Inconsistent,
            Error::MalformedProfileStore { .. } => ErrorKind::Malformed,
            Error::NotFound { .. } => ErrorKind::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_message_names_step_and_path() {
        let err = Error::io(
            "backing up config",
            "/tmp/.finicky.js",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(
            err.to_string(),
            "failed backing up config /tmp/.finicky.js: denied"
        );
        assert_eq!(err.kind(), ErrorKind::PermissionOrIo);
    }

    #[test]
    fn test_kinds() {
        let not_enabled = Error::SyncNotEnabled {
            path: PathBuf::from("/a"),
        };
        assert_eq!(not_enabled.kind(), ErrorKind::InvalidState);

        let dangling = Error::UnresolvableSymlink {
            path: PathBuf::from("/a"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(dangling.kind(), ErrorKind::Inconsistent);

        let missing = Error::MissingField {
            field: "default browser",
        };
        assert_eq!(missing.to_string(), "default browser is required");
    }
}
