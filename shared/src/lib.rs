//! Shared types for the band combination campaign
//!
//! Plain value types (bands, combinations, attempt results, progress
//! snapshots) plus the logging helpers every crate in the workspace uses.

pub mod errors;
pub mod logging;
pub mod types;

pub use errors::*;
pub use types::*;
