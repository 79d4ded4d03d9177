//! Error types shared by config loading, route building and the server loop.

use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MockError {
    #[error("config file not found: {path}")]
    NotFound { path: String },

    #[error("malformed {path}: {source}")]
    Config {
        path: String,
        #[source]
        source: config::ConfigError,
    },

    #[error("invalid listen address '{addr}': {reason}")]
    InvalidAddress { addr: String, reason: String },

    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("duplicate route: {method} {pattern}")]
    DuplicateRoute { method: String, pattern: String },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
