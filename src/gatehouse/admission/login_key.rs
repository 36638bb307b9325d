//! Shared-secret login key: silent diversion for unauthorized visitors.
//!
//! A visitor probing the login endpoint without the key is sent to the public
//! portal, a page indistinguishable from "there is no private login here".
//! Never answer with an explicit denial; that would confirm the gated surface
//! exists.

use crate::gatehouse::tenant::TenantPolicy;
use secrecy::ExposeSecret;
use subtle::ConstantTimeEq;

/// Outcome of the key gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyDecision {
    Clear,
    Divert,
}

/// Constant-time comparison. Length differences short-circuit inside
/// `ct_eq`, leaking only the secret's length.
fn keys_match(supplied: &str, secret: &str) -> bool {
    supplied.as_bytes().ct_eq(secret.as_bytes()).into()
}

/// When the tenant requires a login key, compare the supplied value against
/// the configured secret. Absence or mismatch diverts; a required key with no
/// configured secret admits nobody.
#[must_use]
pub fn evaluate(policy: &TenantPolicy, supplied: Option<&str>) -> KeyDecision {
    if !policy.login_key_required {
        return KeyDecision::Clear;
    }

    match (supplied, policy.login_key_secret.as_ref()) {
        (Some(supplied), Some(secret)) if keys_match(supplied, secret.expose_secret()) => {
            KeyDecision::Clear
        }
        _ => KeyDecision::Divert,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn keyed_policy(secret: Option<&str>) -> TenantPolicy {
        TenantPolicy {
            login_key_required: true,
            login_key_secret: secret.map(|s| SecretString::from(s.to_string())),
            ..TenantPolicy::default()
        }
    }

    #[test]
    fn test_not_required_ignores_parameter() {
        let policy = TenantPolicy::default();

        assert_eq!(evaluate(&policy, None), KeyDecision::Clear);
        assert_eq!(evaluate(&policy, Some("anything")), KeyDecision::Clear);
    }

    #[test]
    fn test_matching_key_clears() {
        let policy = keyed_policy(Some("0350a2cd"));

        assert_eq!(evaluate(&policy, Some("0350a2cd")), KeyDecision::Clear);
    }

    #[test]
    fn test_missing_or_wrong_key_diverts() {
        let policy = keyed_policy(Some("0350a2cd"));

        assert_eq!(evaluate(&policy, None), KeyDecision::Divert);
        assert_eq!(evaluate(&policy, Some("")), KeyDecision::Divert);
        assert_eq!(evaluate(&policy, Some("0350a2cc")), KeyDecision::Divert);
        // Prefix of the secret must not pass
        assert_eq!(evaluate(&policy, Some("0350a2c")), KeyDecision::Divert);
    }

    #[test]
    fn test_required_without_secret_admits_nobody() {
        let policy = keyed_policy(None);

        assert_eq!(evaluate(&policy, None), KeyDecision::Divert);
        assert_eq!(evaluate(&policy, Some("0350a2cd")), KeyDecision::Divert);
    }

    #[test]
    fn test_keys_match_is_exact() {
        assert!(keys_match("abc", "abc"));
        assert!(!keys_match("abc", "abd"));
        assert!(!keys_match("abc", "abcd"));
        assert!(!keys_match("", "abc"));
        assert!(keys_match("", ""));
    }
}
