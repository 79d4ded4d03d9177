// Connection handling module
// Accepts a TCP connection and serves it with hyper HTTP/1

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::cell::Cell;
use std::net::SocketAddr;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{AppState, PerformanceConfig};
use crate::handler;
use crate::logger;

/// Accept and process a connection, checking limits and logging.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `conn_counter` - Active connection counter
/// * `performance` - Limits and timeouts of the snapshot that owns the listener
/// * `log_prefix` - Prefix for log messages (e.g., "OLD" for a draining listener)
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
    performance: &PerformanceConfig,
    log_prefix: &str,
) {
    // Increment counter first, then check limit
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            ));
            drop(stream);
            return;
        }
    }

    if log_prefix.is_empty() {
        logger::log_connection_accepted(&peer_addr);
    } else {
        logger::log_debug(&format!("[{log_prefix}] Accepting connection from {peer_addr}"));
    }

    handle_connection(
        stream,
        peer_addr,
        Arc::clone(state),
        Arc::clone(conn_counter),
        performance,
    );
}

/// Request activity on one connection
///
/// Lives inside a single local task, so plain cells are enough.
struct Activity {
    in_flight: Cell<usize>,
    last_done: Cell<Instant>,
}

impl Activity {
    fn new() -> Self {
        Self {
            in_flight: Cell::new(0),
            last_done: Cell::new(Instant::now()),
        }
    }

    fn begin(&self) {
        self.in_flight.set(self.in_flight.get() + 1);
    }

    fn end(&self) {
        self.in_flight.set(self.in_flight.get().saturating_sub(1));
        self.last_done.set(Instant::now());
    }

    /// Time left before the connection counts as idle; `None` once it is
    fn idle_remaining(&self, idle_timeout: Duration) -> Option<Duration> {
        if self.in_flight.get() > 0 {
            return Some(idle_timeout);
        }
        idle_timeout
            .checked_sub(self.last_done.get().elapsed())
            .filter(|left| !left.is_zero())
    }
}

/// Serve a single connection in a spawned local task.
///
/// Request headers must arrive within `read_timeout`. With keep-alive on,
/// a connection with no request in flight for `keep_alive_timeout` is shut
/// down gracefully. A request being answered is never cut off, however
/// long its route delay.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
    performance: &PerformanceConfig,
) {
    let keep_alive = performance.keep_alive_timeout > 0;
    let idle_timeout = Duration::from_secs(performance.keep_alive_timeout);
    let header_timeout = Duration::from_secs(performance.read_timeout);

    tokio::task::spawn_local(async move {
        let io = TokioIo::new(stream);
        let activity = Rc::new(Activity::new());

        let mut builder = http1::Builder::new();
        builder.keep_alive(keep_alive);
        if !header_timeout.is_zero() {
            builder.timer(TokioTimer::new());
            builder.header_read_timeout(header_timeout);
        }

        let service_activity = Rc::clone(&activity);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let activity = Rc::clone(&service_activity);
                let state = Arc::clone(&state);
                activity.begin();
                async move {
                    let response = handler::handle_request(req, peer_addr, state).await;
                    activity.end();
                    response
                }
            }),
        );
        tokio::pin!(conn);

        let mut closing = !keep_alive;
        loop {
            let wait = activity.idle_remaining(idle_timeout).unwrap_or(Duration::ZERO);
            tokio::select! {
                result = conn.as_mut() => {
                    if let Err(err) = result {
                        logger::log_connection_error(&err);
                    }
                    break;
                }

                () = tokio::time::sleep(wait), if !closing => {
                    if activity.idle_remaining(idle_timeout).is_none() {
                        logger::log_debug(&format!(
                            "Connection from {peer_addr} idle for {} seconds, closing",
                            idle_timeout.as_secs()
                        ));
                        conn.as_mut().graceful_shutdown();
                        closing = true;
                    }
                }
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}
