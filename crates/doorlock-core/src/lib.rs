//! Shared domain types for the door lock daemon.
//!
//! Everything that crosses a crate boundary lives here: the door state,
//! the response codes handed back to clients, credentials and the wire
//! codes that remote apps depend on.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
