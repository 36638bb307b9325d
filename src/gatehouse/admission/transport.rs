//! Transport-security policy: reject plaintext access when the tenant
//! requires HTTPS.

use crate::gatehouse::{admission::Rejection, tenant::TenantPolicy};
use axum::http::StatusCode;

/// Transport facts for one request, assembled by the host layer.
#[derive(Clone, Debug, Default)]
pub struct TransportMeta {
    /// Listener reached over TLS, declared by deployment configuration.
    pub tls: bool,
    /// Raw `x-forwarded-proto` value, when the header was present.
    pub forwarded_proto: Option<String>,
}

/// First entry of a possibly comma-separated forwarded protocol list.
fn parse_forwarded_proto(value: &str) -> Option<&str> {
    value
        .split(',')
        .next()
        .map(str::trim)
        .filter(|proto| !proto.is_empty())
}

/// A request is secure when it arrived over TLS directly, or when a trusted
/// proxy reports `https`. Forwarded headers from untrusted peers are ignored:
/// anyone can send them.
#[must_use]
pub fn is_secure(meta: &TransportMeta, trust_forwarded_headers: bool) -> bool {
    if meta.tls {
        return true;
    }

    trust_forwarded_headers
        && meta
            .forwarded_proto
            .as_deref()
            .and_then(parse_forwarded_proto)
            .is_some_and(|proto| proto.eq_ignore_ascii_case("https"))
}

/// `Some(rejection)` when policy demands HTTPS and the request is plaintext.
///
/// An unset `https_only` does not reject: the permissive half of the
/// fail-safe asymmetry. The cookie side still defaults to `Secure`.
#[must_use]
pub(crate) fn enforce(
    policy: &TenantPolicy,
    meta: &TransportMeta,
    trust_forwarded_headers: bool,
    company_name: &str,
) -> Option<Rejection> {
    if policy.https_only != Some(true) || is_secure(meta, trust_forwarded_headers) {
        return None;
    }

    Some(Rejection {
        status: StatusCode::FORBIDDEN,
        message: format!(
            "{company_name} only accepts sign-in over HTTPS. To allow plain HTTP, \
             clear the https_only flag in the tenant settings; keeping it enabled \
             is strongly recommended."
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn https_only_policy() -> TenantPolicy {
        TenantPolicy {
            https_only: Some(true),
            ..TenantPolicy::default()
        }
    }

    #[test]
    fn test_parse_forwarded_proto() {
        assert_eq!(parse_forwarded_proto("https"), Some("https"));
        assert_eq!(parse_forwarded_proto("https, http"), Some("https"));
        assert_eq!(parse_forwarded_proto("  HTTPS  "), Some("HTTPS"));
        assert_eq!(parse_forwarded_proto(""), None);
        assert_eq!(parse_forwarded_proto("  ,http"), None);
    }

    #[test]
    fn test_is_secure_direct_tls() {
        let meta = TransportMeta {
            tls: true,
            forwarded_proto: None,
        };

        assert!(is_secure(&meta, false));
        assert!(is_secure(&meta, true));
    }

    #[test]
    fn test_is_secure_trusted_forwarded_proto() {
        let meta = TransportMeta {
            tls: false,
            forwarded_proto: Some("https".to_string()),
        };

        assert!(is_secure(&meta, true));
        // Same header from an untrusted peer proves nothing
        assert!(!is_secure(&meta, false));
    }

    #[test]
    fn test_is_secure_forwarded_proto_variants() {
        for (value, expected) in [
            ("HTTPS", true),
            ("https, http", true),
            ("http", false),
            ("wss", false),
            ("", false),
        ] {
            let meta = TransportMeta {
                tls: false,
                forwarded_proto: Some(value.to_string()),
            };
            assert_eq!(is_secure(&meta, true), expected, "proto {value:?}");
        }
    }

    #[test]
    fn test_enforce_rejects_plaintext_when_https_only() {
        let meta = TransportMeta::default();
        let rejection = enforce(&https_only_policy(), &meta, false, "Acme Widgets")
            .expect("plaintext must be rejected");

        assert_eq!(rejection.status, StatusCode::FORBIDDEN);
        assert!(rejection.message.contains("Acme Widgets"));
        assert!(rejection.message.contains("https_only"));
    }

    #[test]
    fn test_enforce_allows_secure_transport() {
        let meta = TransportMeta {
            tls: true,
            forwarded_proto: None,
        };

        assert!(enforce(&https_only_policy(), &meta, false, "Acme").is_none());
    }

    #[test]
    fn test_enforce_permissive_when_policy_unset_or_disabled() {
        let meta = TransportMeta::default();

        for https_only in [None, Some(false)] {
            let policy = TenantPolicy {
                https_only,
                ..TenantPolicy::default()
            };
            assert!(enforce(&policy, &meta, false, "Acme").is_none());
        }
    }
}
