//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: preflight, route lookup,
//! welcome page and the 404 fallback.

use crate::config::{AppState, Snapshot};
use crate::handler::mock;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, SERVER, USER_AGENT};
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of dispatching one request
struct Dispatched {
    response: Response<Full<Bytes>>,
    route: Option<String>,
    delay: Duration,
}

/// Main entry point for HTTP request handling
///
/// The request body is never read, so any body type is accepted.
pub async fn handle_request<B>(
    req: Request<B>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let snapshot = state.snapshot().await;
    let http_config = &snapshot.config.http;

    let Dispatched {
        mut response,
        route,
        delay,
    } = dispatch(&req, &snapshot).await;

    if http_config.enable_cors {
        http::apply_cors_headers(response.headers_mut());
    }
    if let Ok(server) = HeaderValue::from_str(&http_config.server_name) {
        response.headers_mut().insert(SERVER, server);
    }

    if state.cached_access_log.load(Ordering::Relaxed) {
        let mut entry = AccessLogEntry::new(
            peer_addr.ip().to_string(),
            req.method().to_string(),
            req.uri().path().to_string(),
        );
        entry.query = req.uri().query().map(ToString::to_string);
        entry.http_version = version_str(req.version()).to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = usize::try_from(response.body().size_hint().exact().unwrap_or(0))
            .unwrap_or(usize::MAX);
        entry.user_agent = req
            .headers()
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        entry.route = route;
        entry.delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &snapshot.config.logging.access_log_format);
    }

    Ok(response)
}

async fn dispatch<B>(req: &Request<B>, snapshot: &Snapshot) -> Dispatched {
    let method = req.method();
    let path = req.uri().path();
    let is_head = *method == Method::HEAD;

    // 1. CORS preflight
    if *method == Method::OPTIONS && snapshot.config.http.enable_cors {
        return Dispatched {
            response: http::build_preflight_response(),
            route: None,
            delay: Duration::ZERO,
        };
    }

    // 2. Declared mock routes
    if let Some(route) = snapshot.routes.find(method, path) {
        let response = mock::serve_mock(
            route,
            is_head,
            &snapshot.config.http.default_content_type,
        )
        .await;
        return Dispatched {
            response,
            route: Some(route.pattern.as_str().to_string()),
            delay: route.delay,
        };
    }

    // 3. Welcome page when nothing claims the root
    let response = if path == "/" && (*method == Method::GET || is_head) {
        http::build_welcome_response(is_head)
    } else {
        logger::log_debug(&format!("No route for {method} {path}"));
        http::build_404_response()
    };

    Dispatched {
        response,
        route: None,
        delay: Duration::ZERO,
    }
}

fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
