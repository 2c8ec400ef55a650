//! Scan statistics tracking.
//!
//! This module provides thread-safe counters for one scan pass: hosts probed,
//! host failures by category, certificates examined and findings emitted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::info;
use strum::IntoEnumIterator;

use super::types::ErrorType;

/// Thread-safe scan statistics tracker.
///
/// Uses atomic counters so workers and the aggregator can share one instance
/// through `Arc`. All error categories are initialized to zero on creation.
pub struct ScanStats {
    errors: HashMap<ErrorType, AtomicUsize>,
    hosts_probed: AtomicUsize,
    hosts_failed: AtomicUsize,
    certificates_checked: AtomicUsize,
    findings: AtomicUsize,
}

impl Default for ScanStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanStats {
    /// Creates a tracker with every counter at zero.
    pub fn new() -> Self {
        let mut errors = HashMap::new();
        for error in ErrorType::iter() {
            errors.insert(error, AtomicUsize::new(0));
        }

        ScanStats {
            errors,
            hosts_probed: AtomicUsize::new(0),
            hosts_failed: AtomicUsize::new(0),
            certificates_checked: AtomicUsize::new(0),
            findings: AtomicUsize::new(0),
        }
    }

    /// Increment an error counter.
    pub fn increment_error(&self, error: ErrorType) {
        if let Some(counter) = self.errors.get(&error) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment error counter for {:?} which is not in the map. \
                 This indicates a bug in ScanStats initialization.",
                error
            );
        }
    }

    /// Records one host whose probe returned a result.
    pub fn record_host(&self, failed: bool) {
        self.hosts_probed.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.hosts_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records one examined certificate and the number of findings it produced.
    pub fn record_certificate(&self, findings: usize) {
        self.certificates_checked.fetch_add(1, Ordering::Relaxed);
        self.findings.fetch_add(findings, Ordering::Relaxed);
    }

    /// Get the count for an error type.
    pub fn get_error_count(&self, error: ErrorType) -> usize {
        self.errors
            .get(&error)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Get total error count across all error types.
    pub fn total_errors(&self) -> usize {
        ErrorType::iter().map(|e| self.get_error_count(e)).sum()
    }

    /// Hosts that produced a result (success or failure).
    pub fn hosts_probed(&self) -> usize {
        self.hosts_probed.load(Ordering::SeqCst)
    }

    /// Hosts whose probe failed.
    pub fn hosts_failed(&self) -> usize {
        self.hosts_failed.load(Ordering::SeqCst)
    }

    /// Unique certificates examined.
    pub fn certificates_checked(&self) -> usize {
        self.certificates_checked.load(Ordering::SeqCst)
    }

    /// Finding messages emitted.
    pub fn findings(&self) -> usize {
        self.findings.load(Ordering::SeqCst)
    }
}

/// Prints the pass summary and per-category error counts to the log.
pub fn print_scan_statistics(stats: &ScanStats, elapsed_seconds: f64) {
    let probed = stats.hosts_probed();
    info!(
        "Checked {} host{} ({} failed, {} certificate{}, {} finding{}) in {:.1}s",
        probed,
        if probed == 1 { "" } else { "s" },
        stats.hosts_failed(),
        stats.certificates_checked(),
        if stats.certificates_checked() == 1 {
            ""
        } else {
            "s"
        },
        stats.findings(),
        if stats.findings() == 1 { "" } else { "s" },
        elapsed_seconds
    );

    let total_errors = stats.total_errors();
    if total_errors > 0 {
        info!("Error Counts ({} total):", total_errors);
        for error_type in ErrorType::iter() {
            let count = stats.get_error_count(error_type);
            if count > 0 {
                info!("   {}: {}", error_type.as_str(), count);
            }
        }
    }
}
