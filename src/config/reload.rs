// Config reload module
// Polls the config file and stages a new snapshot when it settles

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::fs;

use super::state::{AppState, Snapshot};
use super::types::MockConfig;
use crate::error::MockError;
use crate::logger;

/// What a poll sees of the config file
///
/// Permission changes leave both fields alone, so they never trigger a reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    modified: Option<SystemTime>,
    len: u64,
}

async fn fingerprint(path: &Path) -> Option<Fingerprint> {
    let meta = fs::metadata(path).await.ok()?;
    Some(Fingerprint {
        modified: meta.modified().ok(),
        len: meta.len(),
    })
}

/// Decode the config file and hand the result to the server loop
///
/// On error nothing is staged and the running server keeps its routes.
pub async fn reload_now(state: &AppState) -> Result<(), MockError> {
    let path = state.config_path.to_string_lossy();
    let config = MockConfig::load_from(&path)?;
    let snapshot = Snapshot::build(config)?;
    state.stage(snapshot).await;
    Ok(())
}

/// Watch the config file forever
///
/// Poll interval and debounce are taken from the live snapshot on every
/// round, so they can be tuned by the file being watched.
pub async fn watch_config(state: Arc<AppState>) {
    let path = state.config_path.clone();
    let mut last = fingerprint(&path).await;

    'watch: loop {
        let watch = state.snapshot().await.config.watch.clone();
        tokio::time::sleep(Duration::from_millis(watch.poll_interval_ms.max(1))).await;
        if !watch.enabled {
            // Edits made while disabled are not replayed when re-enabled
            last = fingerprint(&path).await;
            continue;
        }

        let current = fingerprint(&path).await;
        if current == last {
            continue;
        }
        let Some(mut seen) = current else {
            logger::log_config_removed(&path);
            last = None;
            continue;
        };

        // Wait for the file to stay unchanged for a full debounce period
        loop {
            tokio::time::sleep(Duration::from_millis(watch.debounce_ms)).await;
            match fingerprint(&path).await {
                Some(fp) if fp == seen => break,
                Some(fp) => seen = fp,
                None => {
                    logger::log_config_removed(&path);
                    last = None;
                    continue 'watch;
                }
            }
        }
        last = Some(seen);

        logger::log_reload_detected(&path);
        if let Err(e) = reload_now(&state).await {
            logger::log_reload_failed(&e);
        }
    }
}
