//! Routing module
//!
//! Provides the mock route table:
//! - Path patterns with `:param` and trailing `*wildcard` segments
//! - Base URL joining
//! - Method + path lookup with static > param > wildcard priority

mod matcher;
mod table;

pub use table::{MockRoute, RouteTable};
