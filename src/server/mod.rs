// Server module entry
// Listener setup, connection handling, reload-driven restart and signals

pub mod connection;
pub mod listener;
pub mod restart;
pub mod signal;

// `loop` is a keyword, so the module is exposed as server_loop
#[path = "loop.rs"]
pub mod server_loop;

pub use listener::create_reusable_listener;
pub use server_loop::start_server_loop;
