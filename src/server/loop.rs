// Server loop module
// Accepts connections and swaps listener + routes when a reload is staged

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::accept_connection;
use super::listener::create_reusable_listener;
use super::restart::drain_old_listener;
use crate::config::AppState;
use crate::error::MockError;
use crate::logger;

/// Main server loop
///
/// Runs until `shutdown` is notified. Must be driven inside a `LocalSet`
/// because connections are served with `spawn_local`.
pub async fn start_server_loop(
    mut listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
    shutdown: Arc<Notify>,
) -> Result<(), MockError> {
    let mut current = state.snapshot().await;

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(
                            stream,
                            peer_addr,
                            &state,
                            &active_connections,
                            &current.config.performance,
                            "",
                        );
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = state.restart_signal.notified() => {
                logger::log_restart_triggered();

                let Some(next) = state.take_pending().await else {
                    logger::log_warning("Restart signalled without a staged config");
                    continue;
                };

                let old_addr = listener.local_addr()?;
                let new_addr = match next.config.socket_addr() {
                    Ok(addr) => addr,
                    Err(e) => {
                        logger::log_error(&e.to_string());
                        continue;
                    }
                };

                logger::log_binding_new_address(&new_addr);

                // Bind first so a failed bind leaves the running server untouched
                let new_listener = match create_reusable_listener(new_addr) {
                    Ok(l) => {
                        logger::log_new_listener_bound(&new_addr);
                        l
                    }
                    Err(e) => {
                        logger::log_bind_failed(&new_addr, &e);
                        continue;
                    }
                };
                let new_addr = new_listener.local_addr().unwrap_or(new_addr);

                state.publish(Arc::clone(&next)).await;
                logger::apply(&next.config.logging);
                logger::log_routes(&next.routes);

                let old_listener = std::mem::replace(&mut listener, new_listener);
                let old_snapshot = std::mem::replace(&mut current, next);
                tokio::task::spawn_local(drain_old_listener(
                    old_listener,
                    Arc::clone(&state),
                    Arc::clone(&active_connections),
                    old_snapshot,
                ));

                logger::log_restart_complete(&old_addr, &new_addr, current.routes.len());
            }

            () = shutdown.notified() => {
                logger::log_info("[SHUTDOWN] Stopping accept loop");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MockConfig, Snapshot};
    use std::future::Future;
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn snapshot(doc: serde_json::Value) -> Snapshot {
        let mut cfg: MockConfig = serde_json::from_value(doc).unwrap();
        cfg.logging.access_log = false;
        Snapshot::build(cfg).unwrap()
    }

    async fn get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request =
            format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    /// A port nothing listens on right now
    fn free_port() -> u16 {
        let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        probe.local_addr().unwrap().port()
    }

    /// Run the server loop on an ephemeral port while `body` drives it
    async fn with_server<F, Fut>(first: Snapshot, body: F)
    where
        F: FnOnce(Arc<AppState>, SocketAddr) -> Fut,
        Fut: Future<Output = ()>,
    {
        let state = Arc::new(AppState::new(first, "server.json"));
        let shutdown = Arc::new(Notify::new());
        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let server = tokio::task::spawn_local(start_server_loop(
                    listener,
                    Arc::clone(&state),
                    Arc::new(AtomicUsize::new(0)),
                    Arc::clone(&shutdown),
                ));

                body(Arc::clone(&state), addr).await;

                shutdown.notify_one();
                server.await.unwrap().unwrap();
            })
            .await;
    }

    async fn wait_for_port(state: &AppState, port: u16) -> bool {
        for _ in 0..100 {
            if state.snapshot().await.config.port == port {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_serves_and_switches_on_reload() {
        let dir = tempfile::tempdir().unwrap();
        let v1 = dir.path().join("v1.json");
        let v2 = dir.path().join("v2.json");
        std::fs::write(&v1, r#"{"version":1}"#).unwrap();
        std::fs::write(&v2, r#"{"version":2}"#).unwrap();

        let first = snapshot(serde_json::json!({
            "host": "127.0.0.1",
            "port": 0,
            "routes": [{"path": "/version", "responseFile": v1.to_str().unwrap()}]
        }));

        with_server(first, |state, addr| async move {
            let response = get(addr, "/version").await;
            assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
            assert!(response.ends_with(r#"{"version":1}"#));

            let new_port = free_port();
            state
                .stage(snapshot(serde_json::json!({
                    "host": "127.0.0.1",
                    "port": new_port,
                    "routes": [
                        {"path": "/version", "responseFile": v2.to_str().unwrap(), "httpStatus": 203}
                    ]
                })))
                .await;
            assert!(wait_for_port(&state, new_port).await, "reload was not published");

            let new_addr: SocketAddr = ([127, 0, 0, 1], new_port).into();
            let response = get(new_addr, "/version").await;
            assert!(
                response.starts_with("HTTP/1.1 203 Non-Authoritative Information"),
                "{response}"
            );
            assert!(response.ends_with(r#"{"version":2}"#));
        })
        .await;
    }

    #[tokio::test]
    async fn test_bind_failure_keeps_old_routes() {
        let dir = tempfile::tempdir().unwrap();
        let v1 = dir.path().join("v1.json");
        std::fs::write(&v1, r#"{"version":1}"#).unwrap();

        // Plain socket without SO_REUSEPORT, so the reload cannot share it
        let blocker = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let taken = blocker.local_addr().unwrap().port();

        let first = snapshot(serde_json::json!({
            "host": "127.0.0.1",
            "port": 0,
            "routes": [{"path": "/version", "responseFile": v1.to_str().unwrap()}]
        }));

        with_server(first, |state, addr| async move {
            state
                .stage(snapshot(serde_json::json!({
                    "host": "127.0.0.1",
                    "port": taken,
                    "routes": []
                })))
                .await;
            tokio::time::sleep(Duration::from_millis(100)).await;

            assert!(state.take_pending().await.is_none());
            let live = state.snapshot().await;
            assert_eq!(live.config.port, 0);
            assert_eq!(live.routes.len(), 1);

            let response = get(addr, "/version").await;
            assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
            assert!(response.ends_with(r#"{"version":1}"#));
        })
        .await;

        drop(blocker);
    }

    #[tokio::test]
    async fn test_restart_without_staged_config_keeps_running() {
        let first = snapshot(serde_json::json!({"host": "127.0.0.1", "port": 0}));

        with_server(first, |state, addr| async move {
            state.restart_signal.notify_one();
            tokio::time::sleep(Duration::from_millis(20)).await;

            let response = get(addr, "/").await;
            assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
            assert!(response.ends_with("Welcome to Mock Server"));
        })
        .await;
    }

    #[tokio::test]
    async fn test_delay_longer_than_timeouts_still_answers() {
        let dir = tempfile::tempdir().unwrap();
        let slow = dir.path().join("slow.json");
        std::fs::write(&slow, r#"{"slow":true}"#).unwrap();

        let first = snapshot(serde_json::json!({
            "host": "127.0.0.1",
            "port": 0,
            "performance": {"keep_alive_timeout": 1, "read_timeout": 1},
            "routes": [{"path": "/slow", "responseFile": slow.to_str().unwrap(), "delay": 1500}]
        }));

        with_server(first, |_, addr| async move {
            let response = get(addr, "/slow").await;
            assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
            assert!(response.ends_with(r#"{"slow":true}"#));
        })
        .await;
    }

    #[tokio::test]
    async fn test_informational_status_is_sent_as_200() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("processing.json");
        std::fs::write(&file, r#"{"state":"processing"}"#).unwrap();

        let first = snapshot(serde_json::json!({
            "host": "127.0.0.1",
            "port": 0,
            "routes": [{"path": "/jobs", "responseFile": file.to_str().unwrap(), "httpStatus": 102}]
        }));

        with_server(first, |_, addr| async move {
            let response = get(addr, "/jobs").await;
            assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
            assert!(response.ends_with(r#"{"state":"processing"}"#));
        })
        .await;
    }
}
