// Application state module
// Holds the live configuration snapshot and the staged reload

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Notify, RwLock};

use super::types::MockConfig;
use crate::error::MockError;
use crate::routing::RouteTable;

/// A decoded configuration together with the route table built from it.
///
/// Requests always resolve against one snapshot, so a reload never mixes
/// routes from two config versions.
#[derive(Debug)]
pub struct Snapshot {
    pub config: Arc<MockConfig>,
    pub routes: Arc<RouteTable>,
}

impl Snapshot {
    pub fn build(config: MockConfig) -> Result<Self, MockError> {
        let routes = RouteTable::build(&config)?;
        Ok(Self {
            config: Arc::new(config),
            routes: Arc::new(routes),
        })
    }
}

/// Application state
pub struct AppState {
    pub config_path: PathBuf,
    current: RwLock<Arc<Snapshot>>,
    pending: RwLock<Option<Arc<Snapshot>>>,
    pub restart_signal: Arc<Notify>,

    // Cached config values for fast access without locks
    pub cached_access_log: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(snapshot: Snapshot, config_path: impl Into<PathBuf>) -> Self {
        let cached_access_log = Arc::new(AtomicBool::new(snapshot.config.logging.access_log));

        Self {
            config_path: config_path.into(),
            current: RwLock::new(Arc::new(snapshot)),
            pending: RwLock::new(None),
            restart_signal: Arc::new(Notify::new()),
            cached_access_log,
        }
    }

    /// Snapshot currently being served
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.current.read().await)
    }

    /// Stage a reloaded snapshot and wake the server loop
    ///
    /// A newer staged snapshot replaces one that has not been picked up yet.
    pub async fn stage(&self, snapshot: Snapshot) {
        *self.pending.write().await = Some(Arc::new(snapshot));
        self.restart_signal.notify_one();
    }

    pub async fn take_pending(&self) -> Option<Arc<Snapshot>> {
        self.pending.write().await.take()
    }

    /// Make a snapshot the live one
    pub async fn publish(&self, snapshot: Arc<Snapshot>) {
        self.update_cache(&snapshot.config);
        *self.current.write().await = snapshot;
    }

    /// Update cached configuration values
    pub fn update_cache(&self, config: &MockConfig) {
        self.cached_access_log
            .store(config.logging.access_log, Ordering::Relaxed);
    }
}
