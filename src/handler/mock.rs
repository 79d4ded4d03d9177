//! Mock response module
//!
//! Applies the route delay and streams the response file back.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use tokio::fs;

use crate::http;
use crate::logger;
use crate::routing::MockRoute;

/// Serve a matched mock route
///
/// The response file is read on every request so edits to it show up
/// without a config reload.
pub async fn serve_mock(
    route: &MockRoute,
    is_head: bool,
    default_content_type: &str,
) -> Response<Full<Bytes>> {
    if !route.delay.is_zero() {
        tokio::time::sleep(route.delay).await;
    }

    match fs::read(&route.response_file).await {
        Ok(data) => {
            let content_type = route
                .content_type
                .as_deref()
                .unwrap_or(default_content_type);
            http::build_mock_response(route.status, content_type, Bytes::from(data), is_head)
        }
        Err(e) => {
            logger::log_warning(&format!(
                "Cannot read response file '{}' for {} {}: {e}",
                route.response_file.display(),
                route.method,
                route.pattern.as_str()
            ));
            http::build_file_error_response()
        }
    }
}
