// Configuration module entry point
// Loads the mock definition, holds runtime state and watches for edits

pub mod reload;
mod state;
mod types;

use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use crate::error::MockError;

// Re-export public types
pub use state::{AppState, Snapshot};
pub use types::{LoggingConfig, MockConfig, PerformanceConfig, RouteConfig};

/// Default config file name when none is given on the command line
pub const DEFAULT_CONFIG_FILE: &str = "server.json";

impl MockConfig {
    /// Load configuration from a JSON file
    ///
    /// Sources, lowest priority first: built-in defaults, the file,
    /// `MOCK_*` environment variables (`MOCK_PORT`, `MOCK_LOGGING__LEVEL`).
    pub fn load_from(config_path: &str) -> Result<Self, MockError> {
        if !Path::new(config_path).is_file() {
            return Err(MockError::NotFound {
                path: config_path.to_string(),
            });
        }

        let malformed = |source| MockError::Config {
            path: config_path.to_string(),
            source,
        };

        let settings = config::Config::builder()
            .set_default("port", 8080)
            .map_err(malformed)?
            .set_default("host", "0.0.0.0")
            .map_err(malformed)?
            .add_source(config::File::new(config_path, config::FileFormat::Json).required(true))
            .add_source(
                config::Environment::with_prefix("MOCK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(malformed)?;

        settings.try_deserialize().map_err(malformed)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, MockError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|e| MockError::InvalidAddress {
                addr: self.host.clone(),
                reason: format!("{e}"),
            })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
