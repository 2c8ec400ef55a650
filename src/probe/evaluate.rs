//! Expiry and sunset rules applied to verified chains.
//!
//! Evaluation is pure: given the chains, one fixed "now" and the settings, the
//! findings are fully determined. Certificates are deduplicated by signature
//! bytes across all chains of one probe, since chains usually share their
//! intermediates and root.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::config::URGENT_EXPIRY_HOURS;
use crate::models::CertificateFinding;
use crate::tls::{CertificateView, VerifiedChain};

use super::ProbeSettings;

/// Evaluates every unique certificate in `chains`, leaf first, chain by chain.
///
/// # Arguments
///
/// * `host` - Host label used in finding messages
/// * `chains` - Verified chains from the handshake
/// * `now` - The instant all date checks are relative to
/// * `settings` - Expiry window, sunset switch and sunset table
///
/// # Returns
///
/// One `CertificateFinding` per unique certificate, in first-seen order. Clean
/// certificates are included with an empty issue list.
pub fn evaluate_chains(
    host: &str,
    chains: &[VerifiedChain],
    now: DateTime<Utc>,
    settings: &ProbeSettings,
) -> Vec<CertificateFinding> {
    let threshold = settings.window.threshold_from(now);
    let mut checked: HashSet<&[u8]> = HashSet::new();
    let mut findings = Vec::new();

    for chain in chains {
        for (index, cert) in chain.certificates.iter().enumerate() {
            if !checked.insert(cert.signature.as_slice()) {
                continue;
            }

            let mut issues = Vec::new();

            if let Some(issue) = check_expiry(host, cert, now, threshold) {
                issues.push(issue);
            }

            // Roots are trusted locally whatever they are signed with
            if settings.check_signature_algorithm && !chain.is_anchor(index) {
                if let Some(issue) = check_sunset(host, cert, settings) {
                    issues.push(issue);
                }
            }

            findings.push(CertificateFinding {
                common_name: cert.common_name.clone(),
                issues,
            });
        }
    }

    findings
}

/// Flags a certificate whose `not_after` falls before `threshold`.
fn check_expiry(
    host: &str,
    cert: &CertificateView,
    now: DateTime<Utc>,
    threshold: DateTime<Utc>,
) -> Option<String> {
    if threshold <= cert.not_after {
        return None;
    }

    // Truncated toward zero, like the day count below
    let hours_remaining = (cert.not_after - now).num_hours();
    if hours_remaining <= URGENT_EXPIRY_HOURS {
        Some(format!(
            "{host}: '{}' expires in {hours_remaining} hours!",
            cert.common_name
        ))
    } else {
        Some(format!(
            "{host}: '{}' expires in roughly {} days.",
            cert.common_name,
            hours_remaining / 24
        ))
    }
}

/// Flags a certificate that outlives the sunset date of its signature algorithm.
fn check_sunset(host: &str, cert: &CertificateView, settings: &ProbeSettings) -> Option<String> {
    let entry = settings.sunset_policy.lookup(&cert.signature_algorithm)?;
    if cert.not_after < entry.sunsets_at {
        return None;
    }
    Some(format!(
        "{host}: '{}' expires after the sunset date for its signature algorithm '{}'.",
        cert.common_name, entry.algorithm_name
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExpiryWindow;
    use crate::sunset::{SunsetPolicy, OID_ECDSA_WITH_SHA1, OID_SHA1_WITH_RSA};
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    const SHA256_WITH_RSA: &str = "1.2.840.113549.1.1.11";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn settings(check_signature_algorithm: bool) -> ProbeSettings {
        ProbeSettings {
            window: ExpiryWindow::default(),
            check_signature_algorithm,
            sunset_policy: Arc::new(SunsetPolicy::builtin_at(now())),
        }
    }

    fn cert(name: &str, algorithm: &str, not_after: DateTime<Utc>) -> CertificateView {
        CertificateView {
            common_name: name.to_string(),
            signature: format!("sig-{name}").into_bytes(),
            signature_algorithm: algorithm.to_string(),
            not_before: not_after - Duration::days(730),
            not_after,
            self_issued: false,
            subject: name.as_bytes().to_vec(),
            issuer: b"issuer".to_vec(),
        }
    }

    fn root(name: &str, algorithm: &str, not_after: DateTime<Utc>) -> CertificateView {
        CertificateView {
            self_issued: true,
            issuer: name.as_bytes().to_vec(),
            ..cert(name, algorithm, not_after)
        }
    }

    fn evaluate(chains: &[VerifiedChain], settings: &ProbeSettings) -> Vec<CertificateFinding> {
        evaluate_chains("host.test:443", chains, now(), settings)
    }

    #[test]
    fn test_far_future_certificate_is_clean() {
        let chain = VerifiedChain::new(vec![cert(
            "example.com",
            SHA256_WITH_RSA,
            now() + Duration::days(365),
        )]);
        let findings = evaluate(&[chain], &settings(true));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].common_name, "example.com");
        assert!(findings[0].is_clean());
    }

    #[test]
    fn test_expiry_uses_day_granularity_above_48_hours() {
        let chain = VerifiedChain::new(vec![cert(
            "soon.example.com",
            SHA256_WITH_RSA,
            now() + Duration::hours(24 * 10 + 5),
        )]);
        let findings = evaluate(&[chain], &settings(true));
        assert_eq!(
            findings[0].issues,
            vec!["host.test:443: 'soon.example.com' expires in roughly 10 days."]
        );
    }

    #[test]
    fn test_expiry_exactly_48_hours_is_urgent() {
        let chain = VerifiedChain::new(vec![cert(
            "urgent.example.com",
            SHA256_WITH_RSA,
            now() + Duration::hours(48),
        )]);
        let findings = evaluate(&[chain], &settings(true));
        assert_eq!(
            findings[0].issues,
            vec!["host.test:443: 'urgent.example.com' expires in 48 hours!"]
        );
    }

    #[test]
    fn test_expiry_49_hours_is_routine() {
        let chain = VerifiedChain::new(vec![cert(
            "routine.example.com",
            SHA256_WITH_RSA,
            now() + Duration::hours(49),
        )]);
        let findings = evaluate(&[chain], &settings(true));
        assert_eq!(
            findings[0].issues,
            vec!["host.test:443: 'routine.example.com' expires in roughly 2 days."]
        );
    }

    #[test]
    fn test_expired_certificate_reports_negative_hours() {
        let chain = VerifiedChain::new(vec![cert(
            "expired.example.com",
            SHA256_WITH_RSA,
            now() - Duration::hours(30),
        )]);
        let findings = evaluate(&[chain], &settings(true));
        assert_eq!(
            findings[0].issues,
            vec!["host.test:443: 'expired.example.com' expires in -30 hours!"]
        );
    }

    #[test]
    fn test_expiry_boundary_at_threshold() {
        // threshold == not_after: the threshold is not *after* not_after, so no finding
        let at_threshold = now() + Duration::days(20);
        let chain = VerifiedChain::new(vec![cert("edge", SHA256_WITH_RSA, at_threshold)]);
        assert!(evaluate(&[chain], &settings(true))[0].is_clean());

        let just_inside = at_threshold - Duration::seconds(1);
        let chain = VerifiedChain::new(vec![cert("edge", SHA256_WITH_RSA, just_inside)]);
        assert_eq!(evaluate(&[chain], &settings(true))[0].issues.len(), 1);
    }

    #[test]
    fn test_expiry_respects_configured_window() {
        let mut wide = settings(true);
        wide.window = ExpiryWindow {
            years: 1,
            months: 0,
            days: 0,
        };
        let chain = VerifiedChain::new(vec![cert(
            "yearly",
            SHA256_WITH_RSA,
            now() + Duration::days(200),
        )]);
        let findings = evaluate(std::slice::from_ref(&chain), &wide);
        assert_eq!(
            findings[0].issues,
            vec!["host.test:443: 'yearly' expires in roughly 200 days."]
        );
        assert!(evaluate(&[chain], &settings(true))[0].is_clean());
    }

    #[test]
    fn test_sunset_fires_for_sha1_intermediate() {
        let far = now() + Duration::days(365);
        let chain = VerifiedChain::new(vec![
            cert("leaf", SHA256_WITH_RSA, far),
            cert("SHA1 Intermediate", OID_SHA1_WITH_RSA, far),
            root("Root", SHA256_WITH_RSA, far),
        ]);
        let findings = evaluate(&[chain], &settings(true));
        assert_eq!(findings.len(), 3);
        assert!(findings[0].is_clean());
        assert_eq!(
            findings[1].issues,
            vec!["host.test:443: 'SHA1 Intermediate' expires after the sunset date for its signature algorithm 'SHA1 with RSA'."]
        );
        assert!(findings[2].is_clean());
    }

    #[test]
    fn test_sunset_never_fires_on_anchor() {
        let far = now() + Duration::days(365);
        let chain = VerifiedChain::new(vec![
            cert("leaf", SHA256_WITH_RSA, far),
            root("Old SHA1 Root", OID_SHA1_WITH_RSA, far),
        ]);
        let findings = evaluate(&[chain], &settings(true));
        assert!(findings.iter().all(CertificateFinding::is_clean));
    }

    #[test]
    fn test_sunset_applies_to_last_intermediate_when_root_not_served() {
        let far = now() + Duration::days(365);
        let chain = VerifiedChain::new(vec![
            cert("leaf", SHA256_WITH_RSA, far),
            cert("SHA1 Intermediate", OID_ECDSA_WITH_SHA1, far),
        ]);
        let findings = evaluate(&[chain], &settings(true));
        assert_eq!(findings[1].issues.len(), 1);
        assert!(findings[1].issues[0].contains("'ECDSA with SHA1'"));
    }

    #[test]
    fn test_sunset_disabled_by_flag() {
        let far = now() + Duration::days(365);
        let chain = VerifiedChain::new(vec![
            cert("leaf", OID_SHA1_WITH_RSA, far),
            root("Root", SHA256_WITH_RSA, far),
        ]);
        let findings = evaluate(&[chain], &settings(false));
        assert!(findings.iter().all(CertificateFinding::is_clean));
    }

    #[test]
    fn test_sunset_requires_not_after_on_or_after_sunset_date() {
        let mut custom = settings(true);
        let sunset = now() + Duration::days(100);
        custom.sunset_policy =
            Arc::new(SunsetPolicy::empty().with_entry(SHA256_WITH_RSA, "SHA256 with RSA", sunset));

        let before = VerifiedChain::new(vec![cert(
            "before",
            SHA256_WITH_RSA,
            sunset - Duration::seconds(1),
        )]);
        assert!(evaluate(&[before], &custom)[0].is_clean());

        let on = VerifiedChain::new(vec![cert("on", SHA256_WITH_RSA, sunset)]);
        assert_eq!(evaluate(&[on], &custom)[0].issues.len(), 1);
    }

    #[test]
    fn test_expiry_and_sunset_both_reported_in_order() {
        let soon = now() + Duration::hours(12);
        let chain = VerifiedChain::new(vec![
            cert("both", OID_SHA1_WITH_RSA, soon),
            root("Root", SHA256_WITH_RSA, now() + Duration::days(3650)),
        ]);
        let findings = evaluate(&[chain], &settings(true));
        assert_eq!(
            findings[0].issues,
            vec![
                "host.test:443: 'both' expires in 12 hours!".to_string(),
                "host.test:443: 'both' expires after the sunset date for its signature algorithm 'SHA1 with RSA'.".to_string(),
            ]
        );
    }

    #[test]
    fn test_duplicate_signatures_across_chains_evaluated_once() {
        let far = now() + Duration::days(365);
        let leaf = cert("leaf", SHA256_WITH_RSA, far);
        let intermediate = cert("intermediate", SHA256_WITH_RSA, far);
        let chains = vec![
            VerifiedChain::new(vec![
                leaf.clone(),
                intermediate.clone(),
                root("Root A", SHA256_WITH_RSA, far),
            ]),
            VerifiedChain::new(vec![leaf, intermediate, root("Root B", SHA256_WITH_RSA, far)]),
        ];
        let findings = evaluate(&chains, &settings(true));
        let names: Vec<&str> = findings.iter().map(|f| f.common_name.as_str()).collect();
        assert_eq!(names, vec!["leaf", "intermediate", "Root A", "Root B"]);
    }

    #[test]
    fn test_same_common_name_distinct_signatures_are_distinct() {
        let far = now() + Duration::days(365);
        let mut first = cert("shared.example.com", SHA256_WITH_RSA, far);
        first.signature = b"one".to_vec();
        let mut second = cert("shared.example.com", SHA256_WITH_RSA, far);
        second.signature = b"two".to_vec();

        let findings = evaluate(&[VerifiedChain::new(vec![first, second])], &settings(true));
        assert_eq!(findings.len(), 2);
    }

    #[test]
    fn test_duplicate_keeps_first_position_semantics() {
        // A cert that is the anchor in one chain but not another is judged where first seen
        let far = now() + Duration::days(365);
        let sha1_root = root("Cross Root", OID_SHA1_WITH_RSA, far);
        let chains = vec![
            VerifiedChain::new(vec![cert("leaf", SHA256_WITH_RSA, far), sha1_root.clone()]),
            VerifiedChain::new(vec![sha1_root, root("Other Root", SHA256_WITH_RSA, far)]),
        ];
        let findings = evaluate(&chains, &settings(true));
        assert_eq!(findings.len(), 3);
        assert!(findings.iter().all(CertificateFinding::is_clean));
    }
}
