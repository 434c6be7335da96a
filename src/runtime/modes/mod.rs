//! Execution modes
//!
//! Only the HTTP server exists today; it is gated behind the `server`
//! feature the way the other entry points would be.

#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "server")]
pub use server::run_server;
