// Hot restart module
// Retires the listener replaced by a config reload

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config::{AppState, Snapshot};
use crate::logger;

const DRAIN_PERIOD: Duration = Duration::from_millis(100);

/// Drain old listener's backlog queue for 100ms then close it.
///
/// Connections already queued on the old socket are still served. They
/// get the connection limits of `old_snapshot` but resolve routes against
/// the freshly published one. Connections that are mid-flight finish in
/// their own tasks.
pub async fn drain_old_listener(
    old_listener: TcpListener,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
    old_snapshot: Arc<Snapshot>,
) {
    let addr = old_listener
        .local_addr()
        .map_or_else(|_| "<unknown>".to_string(), |a| a.to_string());
    logger::log_debug(&format!("[RESTART] Draining backlog of {addr} for 100ms"));

    let drain_deadline = tokio::time::Instant::now() + DRAIN_PERIOD;
    let mut drained = 0usize;

    loop {
        tokio::select! {
            accept_result = old_listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        drained += 1;
                        accept_connection(
                            stream,
                            peer_addr,
                            &state,
                            &conn_counter,
                            &old_snapshot.config.performance,
                            "OLD",
                        );
                    }
                    Err(e) => {
                        logger::log_old_listener_error(&format!("Accept error: {e}"));
                        break;
                    }
                }
            }

            () = tokio::time::sleep_until(drain_deadline) => break,
        }
    }

    drop(old_listener);
    logger::log_debug(&format!(
        "[RESTART] ✓ Old listener {addr} closed ({drained} backlog connections served)"
    ));
}
