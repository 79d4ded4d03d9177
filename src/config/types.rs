// Configuration types module
// Defines the mock server document and its ambient sections

use serde::{Deserialize, Serialize};

/// Top-level mock server configuration (`server.json`)
///
/// Route keys follow the camelCase used by existing mock definitions. The
/// lowercase aliases cover sources that fold key case.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct MockConfig {
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default, rename = "baseUrl", alias = "baseurl", alias = "base_url")]
    pub base_url: String,
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub watch: WatchConfig,
}

/// A single declared mock route
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default)]
pub struct RouteConfig {
    pub path: String,
    #[serde(default)]
    pub method: String,
    #[serde(
        rename = "responseFile",
        alias = "responsefile",
        alias = "response_file"
    )]
    pub response_file: String,
    #[serde(
        default,
        rename = "httpStatus",
        alias = "httpstatus",
        alias = "http_status"
    )]
    pub http_status: u16,
    /// Milliseconds to wait before answering
    #[serde(default)]
    pub delay: u32,
    #[serde(
        default,
        rename = "contentType",
        alias = "contenttype",
        alias = "content_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub content_type: Option<String>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common or json)
    pub access_log_format: String,
    /// Access log file path (stdout if not set)
    pub access_log_file: Option<String>,
    /// Error log file path (stderr if not set)
    pub error_log_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            access_log: true,
            access_log_format: "combined".to_string(),
            access_log_file: None,
            error_log_file: None,
        }
    }
}

/// HTTP response configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct HttpConfig {
    pub default_content_type: String,
    pub server_name: String,
    pub enable_cors: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            default_content_type: "application/json".to_string(),
            server_name: "mockserver".to_string(),
            enable_cors: true,
        }
    }
}

/// Connection handling configuration, timeouts in seconds
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Idle time before a keep-alive connection is closed, `0` disables keep-alive
    pub keep_alive_timeout: u64,
    /// Time allowed for a request head to arrive, `0` for no limit
    pub read_timeout: u64,
    pub max_connections: Option<u64>,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            keep_alive_timeout: 75,
            read_timeout: 30,
            max_connections: None,
        }
    }
}

/// Config file watcher settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct WatchConfig {
    pub enabled: bool,
    pub poll_interval_ms: u64,
    /// Quiet period a change must survive before it is reloaded
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_ms: 250,
            debounce_ms: 200,
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_host() -> String {
    "0.0.0.0".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_accepts_camel_and_lowercase_keys() {
        let camel: RouteConfig = serde_json::from_str(
            r#"{"path":"/a","method":"POST","responseFile":"a.json","httpStatus":201,"delay":5}"#,
        )
        .unwrap();
        let lower: RouteConfig = serde_json::from_str(
            r#"{"path":"/a","method":"POST","responsefile":"a.json","httpstatus":201,"delay":5}"#,
        )
        .unwrap();
        assert_eq!(camel, lower);
        assert_eq!(camel.http_status, 201);
        assert_eq!(camel.delay, 5);
    }

    #[test]
    fn test_route_optional_fields_default_to_zero() {
        let route: RouteConfig =
            serde_json::from_str(r#"{"path":"/a","responseFile":"a.json"}"#).unwrap();
        assert_eq!(route.method, "");
        assert_eq!(route.http_status, 0);
        assert_eq!(route.delay, 0);
        assert!(route.content_type.is_none());
    }

    #[test]
    fn test_ambient_sections_default() {
        let cfg: MockConfig = serde_json::from_str(r#"{"port":9000}"#).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.base_url, "");
        assert!(cfg.routes.is_empty());
        assert!(cfg.http.enable_cors);
        assert_eq!(cfg.http.default_content_type, "application/json");
        assert_eq!(cfg.watch.debounce_ms, 200);
        assert_eq!(cfg.logging.level, "info");
    }
}
