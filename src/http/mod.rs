//! HTTP protocol layer module
//!
//! Response builders and CORS handling, independent of the route table.

pub mod cors;
pub mod response;

// Re-export commonly used types
pub use cors::{apply_cors_headers, build_preflight_response};
pub use response::{
    build_404_response, build_file_error_response, build_mock_response, build_welcome_response,
};
