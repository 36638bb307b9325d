//! Session-cookie attributes, resolved before any session is created.

use crate::gatehouse::tenant::TenantPolicy;
use axum::http::{header::InvalidHeaderValue, HeaderValue};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::RngCore;

pub(crate) const FORM_COOKIE_NAME: &str = "gatehouse_form";

/// Cookie transmission attributes for the session to be established.
///
/// `HttpOnly` is unconditional. `Secure` follows `https_only` with a
/// fail-safe default: an unset policy still yields a secure cookie, so a
/// half-configured tenant never downgrades to cleartext transmission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CookiePolicy {
    http_only: bool,
    secure: bool,
}

impl CookiePolicy {
    #[must_use]
    pub fn from_policy(policy: &TenantPolicy) -> Self {
        Self {
            http_only: true,
            secure: policy.https_only.unwrap_or(true),
        }
    }

    #[must_use]
    pub fn http_only(&self) -> bool {
        self.http_only
    }

    #[must_use]
    pub fn secure(&self) -> bool {
        self.secure
    }
}

/// Random token for the pre-authentication form cookie.
pub(crate) fn generate_form_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    Base64UrlUnpadded::encode_string(&bytes)
}

/// Build the `Set-Cookie` value for the login shell. Session-scoped on
/// purpose: the remember-me lifetime belongs to the credential flow.
pub(crate) fn form_cookie(
    policy: &CookiePolicy,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{FORM_COOKIE_NAME}={token}; Path=/; SameSite=Lax");
    if policy.http_only() {
        cookie.push_str("; HttpOnly");
    }
    if policy.secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}
