// Shared test helpers: a scripted prober and host file setup.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use cert_status::error_handling::ProbeError;
use cert_status::{CertificateFinding, HostResult, Probe};
use tempfile::NamedTempFile;

/// What the scripted prober answers for one host.
#[derive(Clone)]
pub enum Scripted {
    /// Connection refused
    Unreachable,
    /// Successful handshake with these `(common name, issues)` certificates
    Certificates(Vec<(&'static str, Vec<String>)>),
}

/// A `Probe` that answers from a table instead of the network.
///
/// Unknown hosts are treated as unreachable. Every probe sleeps `delay` so
/// that several workers overlap.
pub struct ScriptedProbe {
    script: HashMap<String, Scripted>,
    delay: Duration,
    calls: AtomicUsize,
}

#[allow(dead_code)] // Not every test file uses every helper
impl ScriptedProbe {
    pub fn new(script: Vec<(&str, Scripted)>) -> Self {
        Self {
            script: script
                .into_iter()
                .map(|(host, answer)| (host.to_string(), answer))
                .collect(),
            delay: Duration::from_millis(5),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    async fn probe(&self, host: &str) -> HostResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        match self.script.get(host) {
            Some(Scripted::Certificates(certs)) => HostResult::success(
                host,
                certs
                    .iter()
                    .map(|(cn, issues)| CertificateFinding {
                        common_name: cn.to_string(),
                        issues: issues.clone(),
                    })
                    .collect(),
            ),
            Some(Scripted::Unreachable) | None => HostResult::failure(
                host,
                ProbeError::Connect(std::io::Error::from(
                    std::io::ErrorKind::ConnectionRefused,
                )),
            ),
        }
    }
}

/// Writes `content` to a temporary hosts file.
#[allow(dead_code)] // Used by other test files
pub fn write_hosts_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp hosts file");
    file.write_all(content.as_bytes())
        .expect("Failed to write hosts file");
    file
}
