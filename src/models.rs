//! Data structures produced by a scan pass.

use crate::error_handling::ProbeError;

/// A host to probe, written as `address:port`.
pub type Host = String;

/// Findings for one unique certificate seen while probing a host.
///
/// A certificate with no issues is still recorded with an empty `issues` list,
/// so "examined and clean" is distinguishable from "never examined".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateFinding {
    /// Subject common name (empty when the certificate has none)
    pub common_name: String,
    /// Finding messages, in evaluation order
    pub issues: Vec<String>,
}

impl CertificateFinding {
    /// Returns `true` when the certificate raised no issue.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Outcome of probing one host.
///
/// Either the probe failed at the host level (connection, handshake) or it
/// produced one `CertificateFinding` per unique certificate in the verified
/// chains.
#[derive(Debug)]
pub struct HostResult {
    /// The probed host, as read from the host list
    pub host: Host,
    /// Findings, or the host-level failure
    pub outcome: Result<Vec<CertificateFinding>, ProbeError>,
}

impl HostResult {
    /// Builds a successful result.
    pub fn success(host: impl Into<Host>, findings: Vec<CertificateFinding>) -> Self {
        Self {
            host: host.into(),
            outcome: Ok(findings),
        }
    }

    /// Builds a failed result.
    pub fn failure(host: impl Into<Host>, error: ProbeError) -> Self {
        Self {
            host: host.into(),
            outcome: Err(error),
        }
    }

    /// The host-level failure, if any.
    pub fn error(&self) -> Option<&ProbeError> {
        self.outcome.as_ref().err()
    }

    /// The certificate findings; empty for a failed host.
    pub fn findings(&self) -> &[CertificateFinding] {
        match &self.outcome {
            Ok(findings) => findings,
            Err(_) => &[],
        }
    }
}
