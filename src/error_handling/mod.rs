//! Error handling and scan statistics.
//!
//! This module provides:
//! - Error type definitions (probe, initialization, notification)
//! - Categorization of host-level failures
//! - Thread-safe per-pass statistics
//!
//! Policy findings (expiry, sunset algorithms) are not errors: they are the
//! output of a probe and travel as plain messages.

mod stats;
mod types;

// Re-export public API
pub use stats::{print_scan_statistics, ScanStats};
pub use types::{ErrorType, InitializationError, NotifyError, ProbeError};
