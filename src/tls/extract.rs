//! Certificate extraction utilities.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

/// The parts of an X.509 certificate the policy checks look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateView {
    /// Subject common name, empty when absent
    pub common_name: String,
    /// Raw signature bytes; identifies the certificate within one probe
    pub signature: Vec<u8>,
    /// Dotted OID of the signature algorithm (e.g. `1.2.840.113549.1.1.11`)
    pub signature_algorithm: String,
    /// Start of the validity period
    pub not_before: DateTime<Utc>,
    /// End of the validity period
    pub not_after: DateTime<Utc>,
    /// Subject and issuer names are byte-identical (a root or self-signed cert)
    pub self_issued: bool,
    /// DER subject name, without the outer `SEQUENCE` header
    pub subject: Vec<u8>,
    /// DER issuer name, without the outer `SEQUENCE` header
    pub issuer: Vec<u8>,
}

/// Strips the outer `SEQUENCE` header from a DER-encoded name.
///
/// Trust anchors carry their subject as the bare RDN sequence contents while
/// parsed certificates expose the full TLV, so names are compared in this form.
/// Input that is not a well-formed `SEQUENCE` is returned unchanged.
pub fn name_contents(raw: &[u8]) -> &[u8] {
    let Some((&0x30, rest)) = raw.split_first() else {
        return raw;
    };
    let Some((&first, rest)) = rest.split_first() else {
        return raw;
    };

    let (len, body) = if first < 0x80 {
        (usize::from(first), rest)
    } else {
        let width = usize::from(first & 0x7f);
        if width == 0 || width > 4 || rest.len() < width {
            return raw;
        }
        let len = rest[..width]
            .iter()
            .fold(0usize, |acc, byte| (acc << 8) | usize::from(*byte));
        (len, &rest[width..])
    };

    if body.len() == len {
        body
    } else {
        raw
    }
}

/// Parses a DER certificate into a [`CertificateView`].
///
/// # Errors
///
/// Returns an error if the DER cannot be parsed or the expiry date is outside
/// the range `chrono` can represent.
pub fn certificate_view(der: &[u8]) -> Result<CertificateView> {
    let (_, cert) = x509_parser::parse_x509_certificate(der)?;

    let common_name = cert
        .subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .unwrap_or_default()
        .to_string();

    let not_before_ts = cert.validity().not_before.timestamp();
    let not_before = DateTime::<Utc>::from_timestamp(not_before_ts, 0)
        .ok_or_else(|| anyhow!("not_before out of range: {}", not_before_ts))?;
    let not_after_ts = cert.validity().not_after.timestamp();
    let not_after = DateTime::<Utc>::from_timestamp(not_after_ts, 0)
        .ok_or_else(|| anyhow!("not_after out of range: {}", not_after_ts))?;

    let subject = name_contents(cert.subject().as_raw()).to_vec();
    let issuer = name_contents(cert.issuer().as_raw()).to_vec();

    Ok(CertificateView {
        common_name,
        signature: cert.signature_value.data.to_vec(),
        signature_algorithm: cert.signature_algorithm.algorithm.to_string(),
        not_before,
        not_after,
        self_issued: subject == issuer,
        subject,
        issuer,
    })
}
