//! TLS connection and verified chain retrieval.
//!
//! This module dials a host, completes a TLS handshake against the configured
//! trust store and returns the certificate path the handshake verified, leaf
//! first. Chain validation itself is left entirely to `rustls`; afterwards the
//! path is rebuilt from the certificates the server sent so that strays the
//! verifier ignored are never evaluated, and the trust anchor is appended when
//! its certificate is known.
//!
//! Uses `tokio-rustls` for async TLS connections and `x509-parser` for certificate parsing.

mod extract;
mod trust;

use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use rustls::pki_types::{CertificateDer, ServerName};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use crate::config::DEFAULT_TLS_PORT;
use crate::error_handling::ProbeError;

pub use extract::{certificate_view, CertificateView};
pub use trust::{AnchorMatch, TrustStore};

/// Connect and handshake time limits for one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlsTimeouts {
    /// TCP connect limit (includes name resolution)
    pub connect: Duration,
    /// TLS handshake limit
    pub handshake: Duration,
}

/// A certificate path accepted by the handshake, leaf first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedChain {
    /// Certificates in path order
    pub certificates: Vec<CertificateView>,
    /// The last certificate is the path's trust anchor
    ///
    /// `false` when the anchor is only known by name (the bundled Mozilla
    /// roots), in which case the last certificate here is an intermediate.
    pub anchored: bool,
}

impl VerifiedChain {
    /// Wraps an already-ordered path, treating a self-issued last entry as its anchor.
    pub fn new(certificates: Vec<CertificateView>) -> Self {
        let anchored = certificates.last().is_some_and(|c| c.self_issued);
        Self {
            certificates,
            anchored,
        }
    }

    /// Rebuilds the verified path from the certificates the server sent.
    ///
    /// Starting at the leaf, each step first looks for a trust anchor named by
    /// the current issuer, then for a sent certificate with that subject,
    /// preferring one valid at `now`. Sent certificates that are not on the
    /// path are dropped. The walk stops at an anchor, at a self-issued
    /// certificate, or when no issuer can be found.
    pub fn rebuild(presented: &[CertificateView], trust: &TrustStore, now: DateTime<Utc>) -> Self {
        let Some(leaf) = presented.first() else {
            return Self {
                certificates: Vec::new(),
                anchored: false,
            };
        };

        let mut used = vec![false; presented.len()];
        used[0] = true;
        let mut path = vec![leaf.clone()];
        let mut anchored = false;

        loop {
            let Some(current) = path.last() else { break };
            if current.self_issued {
                anchored = trust.anchor_for(&current.subject).is_some();
                break;
            }

            match trust.anchor_for(&current.issuer) {
                Some(AnchorMatch::Certificate(root)) => {
                    path.push(root.clone());
                    anchored = true;
                    break;
                }
                Some(AnchorMatch::SubjectOnly) => break,
                None => {}
            }

            let issuer = &current.issuer;
            let next = presented
                .iter()
                .enumerate()
                .filter(|(i, cert)| !used[*i] && cert.subject == *issuer)
                .min_by_key(|(_, cert)| !(cert.not_before <= now && now <= cert.not_after))
                .map(|(i, _)| i);

            match next {
                Some(i) => {
                    used[i] = true;
                    path.push(presented[i].clone());
                }
                None => break,
            }
        }

        let skipped = used.iter().filter(|u| !**u).count();
        if skipped > 0 {
            debug!("Ignoring {skipped} sent certificate(s) outside the verified path");
        }

        Self {
            certificates: path,
            anchored,
        }
    }

    /// Returns `true` when `index` is the chain's trust anchor.
    pub fn is_anchor(&self, index: usize) -> bool {
        self.anchored && index + 1 == self.certificates.len()
    }
}

/// Parses the certificates a server sent; entries that fail to parse are skipped.
pub fn parse_presented(chain: &[CertificateDer<'_>]) -> Vec<CertificateView> {
    chain
        .iter()
        .enumerate()
        .filter_map(|(index, der)| match certificate_view(der) {
            Ok(view) => Some(view),
            Err(e) => {
                warn!("Skipping unparseable certificate #{index} in chain: {e}");
                None
            }
        })
        .collect()
}

/// Splits `address:port` into its parts.
///
/// Bracketed IPv6 literals (`[::1]:443`) are supported; a missing port
/// defaults to 443 and a bare IPv6 literal is taken as an address.
pub fn split_host_port(host: &str) -> Result<(String, u16), ProbeError> {
    let (address, port) = if let Some(rest) = host.strip_prefix('[') {
        let (address, tail) = rest
            .split_once(']')
            .ok_or_else(|| ProbeError::InvalidHost(format!("unterminated IPv6 literal '{host}'")))?;
        if tail.is_empty() {
            (address, None)
        } else {
            let port = tail
                .strip_prefix(':')
                .ok_or_else(|| ProbeError::InvalidHost(format!("unexpected '{tail}' in '{host}'")))?;
            (address, Some(port))
        }
    } else {
        match host.rsplit_once(':') {
            Some((address, port)) if !address.contains(':') => (address, Some(port)),
            _ => (host, None),
        }
    };

    if address.is_empty() {
        return Err(ProbeError::InvalidHost(format!("missing address in '{host}'")));
    }

    let port = match port {
        None => DEFAULT_TLS_PORT,
        Some(port) => port
            .parse::<u16>()
            .map_err(|_| ProbeError::InvalidHost(format!("invalid port '{port}' in '{host}'")))?,
    };

    Ok((address.to_string(), port))
}

/// Dials `host`, completes the handshake and returns the verified chains.
///
/// `trust` must be the store `connector` was built from, so the rebuilt path
/// ends at the same anchor the handshake used. The connection is closed before
/// returning, whatever the outcome.
///
/// # Errors
///
/// Returns a [`ProbeError`] when the host is malformed, the TCP connection or
/// TLS handshake fails or times out, or the server sent no certificates.
pub async fn fetch_verified_chains(
    connector: &TlsConnector,
    trust: &TrustStore,
    host: &str,
    timeouts: TlsTimeouts,
    now: DateTime<Utc>,
) -> Result<Vec<VerifiedChain>, ProbeError> {
    let (address, port) = split_host_port(host)?;

    let server_name = ServerName::try_from(address.clone())
        .map_err(|e| ProbeError::InvalidHost(format!("{address}: {e}")))?;

    debug!("Connecting to {address}:{port}");
    let sock = match tokio::time::timeout(
        timeouts.connect,
        TcpStream::connect((address.as_str(), port)),
    )
    .await
    {
        Ok(Ok(sock)) => sock,
        Ok(Err(e)) => return Err(ProbeError::Connect(e)),
        Err(_) => return Err(ProbeError::ConnectTimeout(timeouts.connect)),
    };

    let mut tls_stream = match tokio::time::timeout(
        timeouts.handshake,
        connector.connect(server_name, sock),
    )
    .await
    {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => return Err(ProbeError::Handshake(e)),
        Err(_) => return Err(ProbeError::HandshakeTimeout(timeouts.handshake)),
    };

    let presented = tls_stream
        .get_ref()
        .1
        .peer_certificates()
        .map(parse_presented)
        .unwrap_or_default();
    let chains = if presented.is_empty() {
        Err(ProbeError::NoPeerCertificates)
    } else {
        Ok(vec![VerifiedChain::rebuild(&presented, trust, now)])
    };

    if let Err(e) = tls_stream.shutdown().await {
        debug!("TLS shutdown for {host} failed: {e}");
    }

    chains
}
