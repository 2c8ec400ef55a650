//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, defaults, notification endpoint)
//! - The library `Config` and the expiry warning window
//! - CLI option types and their normalization into `Config`

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{Config, ExpiryWindow, LogFormat, LogLevel, Opt};
