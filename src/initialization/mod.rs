//! Application initialization and resource setup.
//!
//! This module provides functions to initialize shared resources:
//! - Logger
//! - `rustls` crypto provider
//! - Trust store (Mozilla roots plus an optional CA bundle)
//! - TLS connector built from that trust store
//! - HTTP client for notifications
//!
//! All initialization functions return proper error types for error handling.

mod logger;

use std::path::Path;
use std::sync::Arc;

use log::info;
use rustls::crypto::{ring::default_provider, CryptoProvider};
use tokio_rustls::rustls::ClientConfig;
use tokio_rustls::TlsConnector;

use crate::config::WEBHOOK_TIMEOUT;
use crate::error_handling::InitializationError;
use crate::tls::TrustStore;

// Re-export public API
pub use logger::init_logger_with;

/// Initializes the crypto provider for TLS operations.
///
/// Configures the process-wide crypto provider for `rustls`. The connector
/// built by [`init_tls_connector`] names its provider explicitly, but other
/// `rustls` users in the process (the HTTP client) rely on the default.
pub fn init_crypto_provider() {
    // Reinstalling the provider is harmless, so the result is ignored
    let _ = CryptoProvider::install_default(default_provider());
}

/// Builds the trust store probes verify against.
///
/// Starts from the Mozilla root set in `webpki-roots`. When `ca_file` is given,
/// every certificate in that PEM bundle is trusted as well and kept whole, so
/// a path ending at one of those roots has the root itself checked for expiry.
/// Point it at the platform bundle (e.g. `/etc/ssl/certs/ca-certificates.crt`)
/// to have public roots examined too.
///
/// # Errors
///
/// Returns `InitializationError::TrustStoreError` if the file cannot be read or
/// holds no usable certificate.
pub fn init_trust_store(ca_file: Option<&Path>) -> Result<TrustStore, InitializationError> {
    let mut store = TrustStore::mozilla();
    if let Some(path) = ca_file {
        let pem = std::fs::read(path).map_err(|e| {
            InitializationError::TrustStoreError(format!("{}: {e}", path.display()))
        })?;
        let added = store.add_pem(&pem)?;
        info!("Trusting {added} CA certificate(s) from {}", path.display());
    }
    Ok(store)
}

/// Builds the TLS connector used by every probe.
///
/// Trusts exactly the anchors in `trust`. No client certificate is presented.
///
/// # Errors
///
/// Returns `InitializationError::TlsConfigError` if the provider rejects the
/// default protocol versions.
pub fn init_tls_connector(trust: &TrustStore) -> Result<TlsConnector, InitializationError> {
    let config = ClientConfig::builder_with_provider(Arc::new(default_provider()))
        .with_safe_default_protocol_versions()?
        .with_root_certificates(trust.root_store().clone())
        .with_no_client_auth();

    Ok(TlsConnector::from(Arc::new(config)))
}

/// Builds the HTTP client used to deliver notifications.
///
/// # Errors
///
/// Returns `InitializationError::HttpClientError` if the client cannot be built.
pub fn init_webhook_client() -> Result<reqwest::Client, InitializationError> {
    let client = reqwest::Client::builder()
        .timeout(WEBHOOK_TIMEOUT)
        .build()?;
    Ok(client)
}
