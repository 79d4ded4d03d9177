//! HTTP response building module
//!
//! Builders for the responses the mock server sends, decoupled from routing.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;

pub const WELCOME_TEXT: &str = "Welcome to Mock Server";
pub const FILE_NOT_FOUND_MESSAGE: &str = "JSON File Not Found";

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
}

/// Statuses that must not carry a body
fn is_bodiless(status: StatusCode) -> bool {
    status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED
}

/// Build the response for a matched mock route
///
/// `HEAD` requests get the headers of the full response and an empty body.
/// For 204 and 304 the file contents are dropped.
pub fn build_mock_response(
    status: StatusCode,
    content_type: &str,
    data: Bytes,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(status)
        .header("Content-Type", content_type);

    let body = if is_bodiless(status) {
        Bytes::new()
    } else {
        builder = builder.header("Content-Length", data.len());
        if is_head {
            Bytes::new()
        } else {
            data
        }
    };

    builder
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 500 response for a response file that cannot be read
pub fn build_file_error_response() -> Response<Full<Bytes>> {
    let body = serde_json::to_vec(&ErrorBody {
        message: FILE_NOT_FOUND_MESSAGE,
    })
    .unwrap_or_default();

    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header("Content-Type", "application/json; charset=utf-8")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|e| {
            log_build_error("500", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build the root welcome page
pub fn build_welcome_response(is_head: bool) -> Response<Full<Bytes>> {
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from_static(WELCOME_TEXT.as_bytes())
    };

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Content-Length", WELCOME_TEXT.len())
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::from_static(WELCOME_TEXT.as_bytes())))
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("404 page not found")))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(Full::new(Bytes::from("404 page not found")))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
