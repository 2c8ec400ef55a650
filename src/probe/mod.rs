//! Connection prober.
//!
//! A probe opens one TLS connection to a host, reads the verified chains and
//! evaluates each unique certificate against the expiry and sunset rules. A
//! probe never fails as a whole: host-level problems are carried inside the
//! returned `HostResult`.

mod evaluate;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use tokio_rustls::TlsConnector;

use crate::config::{Config, ExpiryWindow};
use crate::models::HostResult;
use crate::sunset::SunsetPolicy;
use crate::tls::{fetch_verified_chains, TlsTimeouts, TrustStore};

pub use evaluate::evaluate_chains;

/// Anything that can turn a host into a `HostResult`.
///
/// The dispatcher only depends on this trait, which keeps the worker pool
/// independent of the network.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Probes one host.
    async fn probe(&self, host: &str) -> HostResult;
}

/// Policy knobs for certificate evaluation.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    /// Expiry warning window
    pub window: ExpiryWindow,
    /// Apply the sunset rule to non-root certificates
    pub check_signature_algorithm: bool,
    /// Sunset table, shared read-only between workers
    pub sunset_policy: Arc<SunsetPolicy>,
}

impl ProbeSettings {
    /// Settings from the library config with the built-in sunset table.
    pub fn from_config(config: &Config) -> Self {
        Self {
            window: config.window,
            check_signature_algorithm: config.check_signature_algorithm,
            sunset_policy: Arc::new(SunsetPolicy::builtin()),
        }
    }
}

/// The production prober: a real TLS handshake per host.
#[derive(Clone)]
pub struct TlsProber {
    connector: TlsConnector,
    trust: Arc<TrustStore>,
    timeouts: TlsTimeouts,
    settings: ProbeSettings,
}

impl TlsProber {
    /// Creates a prober from a connector, the trust store it was built from,
    /// time limits and evaluation settings.
    pub fn new(
        connector: TlsConnector,
        trust: Arc<TrustStore>,
        timeouts: TlsTimeouts,
        settings: ProbeSettings,
    ) -> Self {
        Self {
            connector,
            trust,
            timeouts,
            settings,
        }
    }

    /// Creates a prober from the library config.
    pub fn from_config(connector: TlsConnector, trust: Arc<TrustStore>, config: &Config) -> Self {
        Self::new(
            connector,
            trust,
            TlsTimeouts {
                connect: config.connect_timeout,
                handshake: config.handshake_timeout,
            },
            ProbeSettings::from_config(config),
        )
    }

    /// The evaluation settings in use.
    pub fn settings(&self) -> &ProbeSettings {
        &self.settings
    }
}

#[async_trait]
impl Probe for TlsProber {
    async fn probe(&self, host: &str) -> HostResult {
        let now = Utc::now();

        match fetch_verified_chains(&self.connector, &self.trust, host, self.timeouts, now).await {
            Ok(chains) => {
                let findings = evaluate_chains(host, &chains, now, &self.settings);
                debug!(
                    "{host}: {} unique certificate(s) across {} chain(s)",
                    findings.len(),
                    chains.len()
                );
                HostResult::success(host, findings)
            }
            Err(e) => HostResult::failure(host, e),
        }
    }
}
