//! Request handler module
//!
//! Dispatches requests to mock routes and builds the mock responses.

pub mod mock;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
