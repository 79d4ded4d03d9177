//! Logger module
//!
//! Provides logging utilities for the mock server including:
//! - Server lifecycle and reload logging
//! - Access logging in combined, common or json format
//! - Level filtering from `logging.level`
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::config::{LoggingConfig, MockConfig};
use crate::routing::RouteTable;

const LEVEL_ERROR: u8 = 0;
const LEVEL_WARN: u8 = 1;
const LEVEL_INFO: u8 = 2;
const LEVEL_DEBUG: u8 = 3;

static LEVEL: AtomicU8 = AtomicU8::new(LEVEL_INFO);

fn parse_level(level: &str) -> u8 {
    match level.to_ascii_lowercase().as_str() {
        "error" => LEVEL_ERROR,
        "warn" | "warning" => LEVEL_WARN,
        "debug" | "trace" => LEVEL_DEBUG,
        _ => LEVEL_INFO,
    }
}

fn enabled(level: u8) -> bool {
    level <= LEVEL.load(Ordering::Relaxed)
}

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &LoggingConfig) -> std::io::Result<()> {
    LEVEL.store(parse_level(&config.level), Ordering::Relaxed);
    writer::init(
        config.access_log_file.as_deref(),
        config.error_log_file.as_deref(),
    )
}

/// Apply a reloaded logging section (level and log file targets)
pub fn apply(config: &LoggingConfig) {
    LEVEL.store(parse_level(&config.level), Ordering::Relaxed);
    if !writer::is_initialized() {
        return;
    }
    let log_writer = writer::get();
    if let Err(e) = log_writer.set_access_log_file(config.access_log_file.as_deref()) {
        log_error(&format!("Failed to reopen access log: {e}"));
    }
    if let Err(e) = log_writer.set_error_log_file(config.error_log_file.as_deref()) {
        log_error(&format!("Failed to reopen error log: {e}"));
    }
}

/// Write to info/access log
fn write_info(message: &str) {
    if writer::is_initialized() {
        writer::get().write_info(message);
    } else {
        println!("{message}");
    }
}

/// Write to error log
fn write_error(message: &str) {
    if writer::is_initialized() {
        writer::get().write_error(message);
    } else {
        eprintln!("{message}");
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    if writer::is_initialized() {
        writer::get().write_access(message);
    } else {
        println!("{message}");
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &MockConfig, routes: &RouteTable) {
    if !enabled(LEVEL_INFO) {
        return;
    }
    let (green, blue, reset) = ("\x1b[32m", "\x1b[34m", "\x1b[0m");
    write_info(&format!(
        "\n{green}Starting server on {blue}http://localhost:{}{reset}\n",
        addr.port()
    ));
    write_info(&format!("Listening on: {addr}"));
    if !config.base_url.is_empty() {
        write_info(&format!("Base URL: {}", config.base_url));
    }
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    log_routes(routes);
}

pub fn log_routes(routes: &RouteTable) {
    if !enabled(LEVEL_INFO) {
        return;
    }
    if routes.is_empty() {
        log_warning("[Routes] No routes configured, only the welcome page is served");
        return;
    }
    write_info(&format!("[Routes] {} registered", routes.len()));
    for route in routes.iter() {
        write_info(&format!(
            "  {:<6} {} -> {} ({}, {}ms)",
            route.method,
            route.pattern.as_str(),
            route.response_file.display(),
            route.status.as_u16(),
            route.delay.as_millis(),
        ));
    }
}

pub fn log_info(message: &str) {
    if enabled(LEVEL_INFO) {
        write_info(message);
    }
}

pub fn log_debug(message: &str) {
    if enabled(LEVEL_DEBUG) {
        write_info(&format!("[DEBUG] {message}"));
    }
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    log_debug(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_old_listener_error(message: &str) {
    write_error(&format!("[OLD] {message}"));
}

pub fn log_warning(message: &str) {
    if enabled(LEVEL_WARN) {
        write_error(&format!("[WARN] {message}"));
    }
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}

pub fn log_reload_detected(path: &std::path::Path) {
    log_info(&format!(
        "[RELOAD] {} modified, reloading...",
        path.display()
    ));
}

pub fn log_reload_failed(err: &dyn std::error::Error) {
    write_error(&format!("[RELOAD] Error reloading config: {err}"));
    write_error("         Continuing with current configuration");
}

pub fn log_config_removed(path: &std::path::Path) {
    log_warning(&format!(
        "[RELOAD] {} was removed; keeping current routes until it reappears",
        path.display()
    ));
}

pub fn log_restart_triggered() {
    log_info("\n[Restart] Server restart triggered");
}

pub fn log_binding_new_address(addr: &SocketAddr) {
    log_info(&format!("[Step 1] Binding new address: {addr}"));
}

pub fn log_new_listener_bound(addr: &SocketAddr) {
    log_info(&format!("[Step 1] ✓ New listener bound successfully on {addr}"));
}

pub fn log_bind_failed(addr: &SocketAddr, err: &std::io::Error) {
    log_error(&format!("[Step 1] ✗ Failed to bind {addr}: {err}"));
    write_error("         Continuing with current configuration");
}

pub fn log_restart_complete(old_addr: &SocketAddr, new_addr: &SocketAddr, routes: usize) {
    log_info(&format!(
        "[Step 2] ✓ {routes} routes live, switched {old_addr} -> {new_addr}"
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("error"), LEVEL_ERROR);
        assert_eq!(parse_level("WARN"), LEVEL_WARN);
        assert_eq!(parse_level("warning"), LEVEL_WARN);
        assert_eq!(parse_level("info"), LEVEL_INFO);
        assert_eq!(parse_level("debug"), LEVEL_DEBUG);
        assert_eq!(parse_level("verbose"), LEVEL_INFO);
    }
}
