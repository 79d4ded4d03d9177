//! Route table module
//!
//! Turns the declared routes into a lookup table keyed by method and path.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use hyper::{Method, StatusCode};

use super::matcher::{join_paths, PathPattern, PatternKind};
use crate::config::{MockConfig, RouteConfig};
use crate::error::MockError;
use crate::logger;

/// Methods a mock route can be registered under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl RouteMethod {
    /// Parse the configured method; unknown names yield `None`
    pub fn parse(method: &str) -> Option<Self> {
        match method {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    /// Whether a request method is served by a route of this method.
    /// `HEAD` is answered by `GET` routes.
    pub fn accepts(self, method: &Method) -> bool {
        match self {
            Self::Get => *method == Method::GET || *method == Method::HEAD,
            Self::Post => *method == Method::POST,
            Self::Put => *method == Method::PUT,
            Self::Delete => *method == Method::DELETE,
        }
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        })
    }
}

/// A registered mock route
#[derive(Debug, Clone)]
pub struct MockRoute {
    pub method: RouteMethod,
    pub pattern: PathPattern,
    pub response_file: PathBuf,
    pub status: StatusCode,
    pub delay: Duration,
    pub content_type: Option<String>,
}

impl MockRoute {
    fn from_config(base_url: &str, route: &RouteConfig) -> Result<Self, MockError> {
        let method = RouteMethod::parse(&route.method).unwrap_or_else(|| {
            if !route.method.is_empty() {
                logger::log_warning(&format!(
                    "Unsupported method '{}' for {}, registering as GET",
                    route.method, route.path
                ));
            }
            RouteMethod::Get
        });

        Ok(Self {
            method,
            pattern: PathPattern::parse(&join_paths(base_url, &route.path))?,
            response_file: PathBuf::from(&route.response_file),
            status: normalize_status(route.http_status),
            delay: Duration::from_millis(u64::from(route.delay)),
            content_type: route.content_type.clone(),
        })
    }
}

/// Map a configured status to the one actually sent
///
/// Unset values (`<= 100`) and 1xx codes become `200 OK`; a 1xx can only be
/// an interim response, the file body still goes out under a final 200.
pub fn normalize_status(code: u16) -> StatusCode {
    if code <= 100 {
        return StatusCode::OK;
    }
    match StatusCode::from_u16(code) {
        Ok(status) if status.is_informational() => StatusCode::OK,
        Ok(status) => status,
        Err(_) => {
            logger::log_warning(&format!("Invalid HTTP status {code}, using 200"));
            StatusCode::OK
        }
    }
}

/// All routes of one configuration, in declaration order
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<MockRoute>,
}

impl RouteTable {
    /// Build the table; any invalid or duplicate route rejects the whole config
    pub fn build(config: &MockConfig) -> Result<Self, MockError> {
        let mut seen = HashSet::new();
        let mut routes = Vec::with_capacity(config.routes.len());

        for route in &config.routes {
            let route = MockRoute::from_config(&config.base_url, route)?;
            // `/items/:id` and `/items/:name` claim the same requests
            if !seen.insert((route.method, route.pattern.shape())) {
                return Err(MockError::DuplicateRoute {
                    method: route.method.to_string(),
                    pattern: route.pattern.as_str().to_string(),
                });
            }
            routes.push(route);
        }

        Ok(Self { routes })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MockRoute> {
        self.routes.iter()
    }

    /// Find the route serving a request
    ///
    /// Matching priority:
    /// 1. Static patterns
    /// 2. Patterns with `:param` segments
    /// 3. Wildcard patterns
    ///
    /// Within one class the first declared route wins.
    pub fn find(&self, method: &Method, path: &str) -> Option<&MockRoute> {
        let mut best: Option<&MockRoute> = None;
        for route in &self.routes {
            if !route.method.accepts(method) || !route.pattern.matches(path) {
                continue;
            }
            if route.pattern.kind() == PatternKind::Static {
                return Some(route);
            }
            if best.map_or(true, |b| route.pattern.kind() > b.pattern.kind()) {
                best = Some(route);
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str, routes: serde_json::Value) -> MockConfig {
        serde_json::from_value(serde_json::json!({
            "port": 8080,
            "baseUrl": base_url,
            "routes": routes,
        }))
        .unwrap()
    }

    #[test]
    fn test_method_parse() {
        assert_eq!(RouteMethod::parse("POST"), Some(RouteMethod::Post));
        assert_eq!(RouteMethod::parse("DELETE"), Some(RouteMethod::Delete));
        assert_eq!(RouteMethod::parse("PATCH"), None);
        assert_eq!(RouteMethod::parse("post"), None);
    }

    #[test]
    fn test_get_accepts_head() {
        assert!(RouteMethod::Get.accepts(&Method::HEAD));
        assert!(!RouteMethod::Post.accepts(&Method::HEAD));
        assert!(!RouteMethod::Get.accepts(&Method::POST));
    }

    #[test]
    fn test_normalize_status() {
        assert_eq!(normalize_status(0), StatusCode::OK);
        assert_eq!(normalize_status(100), StatusCode::OK);
        assert_eq!(normalize_status(101), StatusCode::OK);
        assert_eq!(normalize_status(102), StatusCode::OK);
        assert_eq!(normalize_status(199), StatusCode::OK);
        assert_eq!(normalize_status(204), StatusCode::NO_CONTENT);
        assert_eq!(normalize_status(404), StatusCode::NOT_FOUND);
        assert_eq!(normalize_status(1000), StatusCode::OK);
    }

    #[test]
    fn test_build_applies_base_url_and_defaults() {
        let cfg = config(
            "/api",
            serde_json::json!([
                {"path": "/users", "responseFile": "users.json", "delay": 250},
                {"path": "/users", "method": "PATCH", "responseFile": "x.json"},
            ]),
        );
        // PATCH falls back to GET, colliding with the first route
        assert!(matches!(
            RouteTable::build(&cfg),
            Err(MockError::DuplicateRoute { .. })
        ));

        let cfg = config(
            "/api",
            serde_json::json!([
                {"path": "/users", "responseFile": "users.json", "delay": 250},
                {"path": "/users", "method": "POST", "responseFile": "created.json", "httpStatus": 201},
            ]),
        );
        let table = RouteTable::build(&cfg).unwrap();
        assert_eq!(table.len(), 2);

        let get = table.find(&Method::GET, "/api/users").unwrap();
        assert_eq!(get.method, RouteMethod::Get);
        assert_eq!(get.status, StatusCode::OK);
        assert_eq!(get.delay, Duration::from_millis(250));
        assert_eq!(get.response_file, PathBuf::from("users.json"));

        let post = table.find(&Method::POST, "/api/users").unwrap();
        assert_eq!(post.status, StatusCode::CREATED);

        assert!(table.find(&Method::PUT, "/api/users").is_none());
        assert!(table.find(&Method::GET, "/users").is_none());
    }

    #[test]
    fn test_build_rejects_bad_pattern() {
        let cfg = config(
            "",
            serde_json::json!([{"path": "/a/*rest/b", "responseFile": "a.json"}]),
        );
        assert!(matches!(
            RouteTable::build(&cfg),
            Err(MockError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_find_prefers_static_then_param_then_wildcard() {
        let cfg = config(
            "",
            serde_json::json!([
                {"path": "/users/*rest", "responseFile": "wild.json"},
                {"path": "/users/:id", "responseFile": "param.json"},
                {"path": "/users/me", "responseFile": "static.json"},
            ]),
        );
        let table = RouteTable::build(&cfg).unwrap();

        let hit = |path| {
            table
                .find(&Method::GET, path)
                .map(|r| r.response_file.to_string_lossy().into_owned())
        };
        assert_eq!(hit("/users/me").as_deref(), Some("static.json"));
        assert_eq!(hit("/users/42").as_deref(), Some("param.json"));
        assert_eq!(hit("/users/42/orders").as_deref(), Some("wild.json"));
        assert_eq!(hit("/accounts"), None);
    }

    #[test]
    fn test_build_rejects_same_shape_with_other_names() {
        let cfg = config(
            "",
            serde_json::json!([
                {"path": "/items/:id", "responseFile": "first.json"},
                {"path": "/items/:name", "responseFile": "second.json"},
            ]),
        );
        assert!(matches!(
            RouteTable::build(&cfg),
            Err(MockError::DuplicateRoute { .. })
        ));

        let cfg = config(
            "",
            serde_json::json!([
                {"path": "/files/*rest", "responseFile": "a.json"},
                {"path": "/files/*path", "method": "GET", "responseFile": "b.json"},
            ]),
        );
        assert!(matches!(
            RouteTable::build(&cfg),
            Err(MockError::DuplicateRoute { .. })
        ));
    }

    #[test]
    fn test_find_first_declared_wins_within_class() {
        let cfg = config(
            "",
            serde_json::json!([
                {"path": "/items/:id/detail", "responseFile": "first.json"},
                {"path": "/items/:id/*rest", "responseFile": "wild.json"},
                {"path": "/:kind/:id/detail", "responseFile": "second.json"},
            ]),
        );
        let table = RouteTable::build(&cfg).unwrap();
        let route = table.find(&Method::GET, "/items/1/detail").unwrap();
        assert_eq!(route.response_file, PathBuf::from("first.json"));
        let route = table.find(&Method::GET, "/orders/1/detail").unwrap();
        assert_eq!(route.response_file, PathBuf::from("second.json"));
    }
}
