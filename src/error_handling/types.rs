//! Error type definitions.
//!
//! This module defines the probe, initialization and notification errors, plus
//! the `ErrorType` categories used for per-pass statistics.

use std::time::Duration;

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error building the TLS client configuration.
    #[error("TLS configuration error: {0}")]
    TlsConfigError(#[from] rustls::Error),

    /// A CA certificate or bundle could not be loaded into the trust store.
    #[error("Trust store error: {0}")]
    TrustStoreError(String),

    /// Error initializing the HTTP client used for notifications.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Host-level failure while probing one host.
///
/// These are reported per host and never abort a scan pass. The host itself is
/// carried by the surrounding `HostResult`, so messages only describe the cause.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The host line is not a usable `address:port`.
    #[error("invalid host: {0}")]
    InvalidHost(String),

    /// TCP connection (including name resolution) failed.
    #[error("connection failed: {0}")]
    Connect(#[source] std::io::Error),

    /// TCP connection did not complete in time.
    #[error("connection timed out after {}s", .0.as_secs())]
    ConnectTimeout(Duration),

    /// TLS handshake failed, including chain verification failures.
    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] std::io::Error),

    /// TLS handshake did not complete in time.
    #[error("TLS handshake timed out after {}s", .0.as_secs())]
    HandshakeTimeout(Duration),

    /// The handshake completed without a peer certificate chain.
    #[error("server presented no certificates")]
    NoPeerCertificates,
}

impl ProbeError {
    /// Maps the error onto its statistics category.
    pub fn error_type(&self) -> ErrorType {
        match self {
            ProbeError::InvalidHost(_) => ErrorType::InvalidHost,
            ProbeError::Connect(_) => ErrorType::ConnectError,
            ProbeError::ConnectTimeout(_) => ErrorType::ConnectTimeout,
            ProbeError::Handshake(_) => ErrorType::HandshakeError,
            ProbeError::HandshakeTimeout(_) => ErrorType::HandshakeTimeout,
            ProbeError::NoPeerCertificates => ErrorType::NoPeerCertificates,
        }
    }
}

/// Error types for notification delivery.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The request could not be sent or the response could not be read.
    #[error("webhook request failed: {0}")]
    Http(#[from] ReqwestError),

    /// The webhook answered with a non-success HTTP status.
    #[error("webhook returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as text
        body: String,
    },

    /// Some subjects could not be delivered.
    #[error("{failed} of {total} notification(s) failed")]
    Partial {
        /// Number of failed deliveries
        failed: usize,
        /// Number of attempted deliveries
        total: usize,
    },
}

/// Categories of host-level failures counted during a scan pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    /// Host line is not a usable `address:port`
    InvalidHost,
    /// TCP connect or name resolution failed
    ConnectError,
    /// TCP connect exceeded its time limit
    ConnectTimeout,
    /// TLS handshake or chain verification failed
    HandshakeError,
    /// TLS handshake exceeded its time limit
    HandshakeTimeout,
    /// Handshake finished without a server certificate
    NoPeerCertificates,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorType {
    /// Returns a human-readable string representation of the error type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::InvalidHost => "Invalid host",
            ErrorType::ConnectError => "TCP connect error",
            ErrorType::ConnectTimeout => "TCP connect timeout",
            ErrorType::HandshakeError => "TLS handshake error",
            ErrorType::HandshakeTimeout => "TLS handshake timeout",
            ErrorType::NoPeerCertificates => "No peer certificates",
        }
    }
}
