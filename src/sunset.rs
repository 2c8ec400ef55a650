//! Signature algorithm sunset policy.
//!
//! Maps signature algorithm OIDs to a human readable name and the date after
//! which certificates using them are considered deprecated. SHA-1 based
//! algorithms sunset on 2017-01-01, following the browser deprecation schedule:
//!
//! - <https://technet.microsoft.com/en-us/library/security/2880823.aspx>
//! - <http://googleonlinesecurity.blogspot.com/2014/09/gradually-sunsetting-sha-1.html>
//!
//! MD2 and MD5 are already sunset: their date is the moment the table is built.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};

/// OID of md2WithRSAEncryption.
pub const OID_MD2_WITH_RSA: &str = "1.2.840.113549.1.1.2";
/// OID of md5WithRSAEncryption.
pub const OID_MD5_WITH_RSA: &str = "1.2.840.113549.1.1.4";
/// OID of sha1WithRSAEncryption.
pub const OID_SHA1_WITH_RSA: &str = "1.2.840.113549.1.1.5";
/// OID of id-dsa-with-sha1.
pub const OID_DSA_WITH_SHA1: &str = "1.2.840.10040.4.3";
/// OID of ecdsa-with-SHA1.
pub const OID_ECDSA_WITH_SHA1: &str = "1.2.840.10045.4.1";

/// One row of the sunset table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SunsetEntry {
    /// Human readable algorithm name used in finding messages
    pub algorithm_name: String,
    /// Certificates expiring on or after this instant are flagged
    pub sunsets_at: DateTime<Utc>,
}

/// Read-only lookup table from signature algorithm OID to its sunset entry.
#[derive(Debug, Clone, Default)]
pub struct SunsetPolicy {
    entries: HashMap<String, SunsetEntry>,
}

impl SunsetPolicy {
    /// An empty table; nothing is ever flagged.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in table of deprecated signature algorithms.
    pub fn builtin() -> Self {
        Self::builtin_at(Utc::now())
    }

    /// The built-in table, with `now` as the sunset date of MD2 and MD5.
    pub fn builtin_at(now: DateTime<Utc>) -> Self {
        let sha1_sunset = Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).single();
        let sha1_sunset = sha1_sunset.unwrap_or(DateTime::<Utc>::MIN_UTC);

        Self::empty()
            .with_entry(OID_MD2_WITH_RSA, "MD2 with RSA", now)
            .with_entry(OID_MD5_WITH_RSA, "MD5 with RSA", now)
            .with_entry(OID_SHA1_WITH_RSA, "SHA1 with RSA", sha1_sunset)
            .with_entry(OID_DSA_WITH_SHA1, "DSA with SHA1", sha1_sunset)
            .with_entry(OID_ECDSA_WITH_SHA1, "ECDSA with SHA1", sha1_sunset)
    }

    /// Adds or replaces the entry for `oid`.
    pub fn with_entry(
        mut self,
        oid: impl Into<String>,
        algorithm_name: impl Into<String>,
        sunsets_at: DateTime<Utc>,
    ) -> Self {
        self.entries.insert(
            oid.into(),
            SunsetEntry {
                algorithm_name: algorithm_name.into(),
                sunsets_at,
            },
        );
        self
    }

    /// Looks up the entry for a dotted signature algorithm OID.
    pub fn lookup(&self, oid: &str) -> Option<&SunsetEntry> {
        self.entries.get(oid)
    }

    /// Number of algorithms in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
