//! Trust anchors shared by the TLS connector and chain reconstruction.
//!
//! The same anchors feed the `rustls` root store (which decides whether a
//! handshake succeeds) and the path rebuilt afterwards (which decides what gets
//! evaluated). Anchors added from a certificate keep their parsed view so the
//! root itself can be checked; the bundled Mozilla anchors only carry a subject
//! and public key, so a path ending at one of them stops at its last
//! intermediate.

use std::collections::HashMap;

use log::{debug, warn};
use rustls::pki_types::CertificateDer;
use tokio_rustls::rustls::RootCertStore;
use x509_parser::pem::Pem;

use crate::error_handling::InitializationError;

use super::extract::{certificate_view, name_contents, CertificateView};

/// What the store knows about the anchor for a given subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorMatch<'a> {
    /// The full root certificate is known and can be evaluated
    Certificate(&'a CertificateView),
    /// Only the anchor's subject and key are known
    SubjectOnly,
}

/// Root certificates trusted for verification.
#[derive(Debug, Clone)]
pub struct TrustStore {
    roots: RootCertStore,
    anchors: HashMap<Vec<u8>, Option<CertificateView>>,
}

impl TrustStore {
    /// A store with no anchors; every handshake fails until roots are added.
    pub fn empty() -> Self {
        Self {
            roots: RootCertStore::empty(),
            anchors: HashMap::new(),
        }
    }

    /// The Mozilla root set shipped in `webpki-roots`.
    pub fn mozilla() -> Self {
        let mut store = Self::empty();
        store
            .roots
            .extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        for anchor in webpki_roots::TLS_SERVER_ROOTS {
            store.insert_subject(name_contents(anchor.subject.as_ref()).to_vec());
        }
        store
    }

    /// Trusts one DER-encoded root certificate.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::TlsConfigError` if `rustls` rejects the
    /// certificate as an anchor, or `InitializationError::TrustStoreError` if it
    /// cannot be parsed.
    pub fn add_der(&mut self, der: CertificateDer<'static>) -> Result<(), InitializationError> {
        let view = certificate_view(&der)
            .map_err(|e| InitializationError::TrustStoreError(e.to_string()))?;
        self.roots.add(der)?;
        self.insert_certificate(view);
        Ok(())
    }

    /// Trusts every `CERTIFICATE` block in a PEM bundle.
    ///
    /// Blocks that are not certificates are ignored; certificates that cannot
    /// be used as anchors are skipped with a warning, like system bundles that
    /// carry a few legacy entries.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::TrustStoreError` if the bundle is not PEM
    /// or contains no usable certificate.
    pub fn add_pem(&mut self, pem: &[u8]) -> Result<usize, InitializationError> {
        let mut added = 0;
        for (index, block) in Pem::iter_from_buffer(pem).enumerate() {
            let block = block.map_err(|e| {
                InitializationError::TrustStoreError(format!("PEM block #{index}: {e}"))
            })?;
            if block.label != "CERTIFICATE" {
                continue;
            }
            match self.add_der(CertificateDer::from(block.contents)) {
                Ok(()) => added += 1,
                Err(e) => warn!("Skipping CA certificate #{index}: {e}"),
            }
        }

        if added == 0 {
            return Err(InitializationError::TrustStoreError(
                "no usable CA certificates found".to_string(),
            ));
        }
        debug!("Added {added} CA certificate(s) to the trust store");
        Ok(added)
    }

    /// The store handed to `rustls`.
    pub fn root_store(&self) -> &RootCertStore {
        &self.roots
    }

    /// Number of distinct anchor subjects.
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Returns `true` when no anchor is trusted.
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Looks up the anchor whose subject equals `issuer` (in `name_contents` form).
    pub fn anchor_for(&self, issuer: &[u8]) -> Option<AnchorMatch<'_>> {
        self.anchors.get(issuer).map(|known| match known {
            Some(view) => AnchorMatch::Certificate(view),
            None => AnchorMatch::SubjectOnly,
        })
    }

    /// Records an anchor known by its full certificate.
    ///
    /// Replaces a subject-only entry for the same name.
    pub(crate) fn insert_certificate(&mut self, view: CertificateView) {
        self.anchors.insert(view.subject.clone(), Some(view));
    }

    /// Records an anchor known only by its subject.
    ///
    /// Never downgrades an entry that already has its certificate.
    pub(crate) fn insert_subject(&mut self, subject: Vec<u8>) {
        self.anchors.entry(subject).or_insert(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::{BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair};

    fn ca(common_name: &str) -> rcgen::Certificate {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::default();
        params.distinguished_name = DistinguishedName::new();
        params
            .distinguished_name
            .push(DnType::CommonName, common_name);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.self_signed(&key).unwrap()
    }

    #[test]
    fn test_mozilla_store_has_subject_only_anchors() {
        let store = TrustStore::mozilla();
        assert_eq!(store.len(), webpki_roots::TLS_SERVER_ROOTS.len());
        assert!(!store.root_store().is_empty());

        let subject = name_contents(webpki_roots::TLS_SERVER_ROOTS[0].subject.as_ref());
        assert_eq!(store.anchor_for(subject), Some(AnchorMatch::SubjectOnly));
    }

    #[test]
    fn test_added_root_is_matched_by_issuer_name() {
        let root = ca("Loopback Root CA");
        let mut store = TrustStore::empty();
        store.add_der(root.der().clone()).unwrap();

        let view = certificate_view(root.der()).unwrap();
        match store.anchor_for(&view.subject) {
            Some(AnchorMatch::Certificate(found)) => assert_eq!(found.common_name, "Loopback Root CA"),
            other => panic!("unexpected anchor: {other:?}"),
        }
        assert_eq!(store.anchor_for(b"unknown"), None);
    }

    #[test]
    fn test_certificate_wins_over_subject_only() {
        let view = certificate_view(ca("Shared Name").der()).unwrap();
        let mut store = TrustStore::empty();
        store.insert_certificate(view.clone());
        store.insert_subject(view.subject.clone());

        assert!(matches!(
            store.anchor_for(&view.subject),
            Some(AnchorMatch::Certificate(_))
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_pem_bundle() {
        let first = ca("Bundle Root One");
        let second = ca("Bundle Root Two");
        let bundle = format!("# comment\n{}{}", first.pem(), second.pem());

        let mut store = TrustStore::empty();
        assert_eq!(store.add_pem(bundle.as_bytes()).unwrap(), 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_pem_without_certificates_rejected() {
        let mut store = TrustStore::empty();
        assert!(matches!(
            store.add_pem(b"not a pem bundle"),
            Err(InitializationError::TrustStoreError(_))
        ));
        assert!(store.is_empty());
    }
}
