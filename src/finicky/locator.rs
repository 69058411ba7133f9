//! Config path discovery and change signalling
//!
//! Which files count as "the config" is decided outside this crate; the
//! engine only consumes an ordered candidate list through [`ConfigLocator`].
//! [`ConfigContext`] bundles the locator with the change notifier so both are
//! threaded explicitly into the operations that mutate the config.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};
use std::sync::Arc;
use tracing::debug;

use super::error::{Error, Result};

/// Source of candidate config paths
pub trait ConfigLocator: Send + Sync {
    /// Candidate paths in priority order
    fn candidate_paths(&self) -> Vec<PathBuf>;

    /// Drop any cached view of the config after it changed on disk
    fn clear_cache(&self) {}
}

/// Fixed list of candidates
#[derive(Debug, Default)]
pub struct CandidateList {
    paths: Vec<PathBuf>,
    invalidations: AtomicUsize,
}

impl CandidateList {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            invalidations: AtomicUsize::new(0),
        }
    }

    /// How many times `clear_cache` has been called
    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }
}

impl ConfigLocator for CandidateList {
    fn candidate_paths(&self) -> Vec<PathBuf> {
        self.paths.clone()
    }

    fn clear_cache(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }
}

/// Sending half of the single-slot change signal
///
/// Backed by a channel of capacity one: a signal sent while another is still
/// pending is dropped, so any number of saves before the listener drains
/// produce exactly one wake-up.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    tx: SyncSender<()>,
}

impl ChangeNotifier {
    /// Signal a change without blocking
    pub fn notify(&self) {
        // Full means a wake-up is already pending; Disconnected means nobody listens.
        let _ = self.tx.try_send(());
    }
}

/// Receiving half of the single-slot change signal
#[derive(Debug)]
pub struct ChangeListener {
    rx: Receiver<()>,
}

impl ChangeListener {
    /// Consume a pending signal, if any
    pub fn take(&self) -> bool {
        match self.rx.try_recv() {
            Ok(()) => true,
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => false,
        }
    }

    /// Block until the next signal; false once every notifier is gone
    pub fn wait(&self) -> bool {
        self.rx.recv().is_ok()
    }
}

/// Create a connected notifier/listener pair
pub fn change_channel() -> (ChangeNotifier, ChangeListener) {
    let (tx, rx) = mpsc::sync_channel(1);
    (ChangeNotifier { tx }, ChangeListener { rx })
}

/// Locator plus change notifier, constructed once per process
#[derive(Clone)]
pub struct ConfigContext {
    locator: Arc<dyn ConfigLocator>,
    notifier: ChangeNotifier,
}

impl ConfigContext {
    pub fn new(locator: Arc<dyn ConfigLocator>, notifier: ChangeNotifier) -> Self {
        Self { locator, notifier }
    }

    /// Context with a fresh change channel; the listener is returned alongside
    pub fn with_listener(locator: Arc<dyn ConfigLocator>) -> (Self, ChangeListener) {
        let (notifier, listener) = change_channel();
        (Self::new(locator, notifier), listener)
    }

    pub fn candidate_paths(&self) -> Vec<PathBuf> {
        self.locator.candidate_paths()
    }

    /// First candidate present on disk, dangling symlinks included
    pub fn existing_config_path(&self) -> Option<PathBuf> {
        self.locator
            .candidate_paths()
            .into_iter()
            .find(|p| fs::symlink_metadata(p).is_ok())
    }

    /// The config path operations act on: the first existing candidate, or
    /// the first candidate as the place to create one
    pub fn config_path(&self) -> Result<PathBuf> {
        if let Some(existing) = self.existing_config_path() {
            return Ok(existing);
        }
        self.locator
            .candidate_paths()
            .into_iter()
            .next()
            .ok_or(Error::NoCandidatePaths)
    }

    /// Clear the locator cache and wake any listener
    pub fn config_changed(&self) {
        debug!("config changed, invalidating cache");
        self.locator.clear_cache();
        self.notifier.notify();
    }
}

impl std::fmt::Debug for ConfigContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigContext")
            .field("candidates", &self.locator.candidate_paths())
            .finish()
    }
}
