//! HTTP API module.
//!
//! The presentation boundary: response types, the log broadcaster, and the
//! server that hands reports to a display client.

pub mod logs;
pub mod server;
pub mod types;

pub use logs::*;
pub use server::{router, start_server};
pub use types::*;
