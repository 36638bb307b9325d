//! The gated login surface.
//!
//! Assembles the request facts the gate needs, runs the admission sequence
//! and turns the decision into an HTTP response. Everything the response
//! shows comes from tenant settings; request-derived values never echo back.

use crate::gatehouse::{
    admission::{
        session, transport::TransportMeta, AdmissionDecision, AdmissionGate, Admitted, GateError,
        RequestContext,
    },
    tenant::TenantSettings,
};
use axum::{
    extract::{ConnectInfo, Extension, Query},
    http::{
        header::{SET_COOKIE, USER_AGENT},
        HeaderMap, StatusCode,
    },
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};
use tracing::error;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct LoginParams {
    /// Login key, checked only when the tenant requires one.
    key: Option<String>,
}

#[utoipa::path(
    get,
    path= "/login",
    params(LoginParams),
    responses (
        (status = 200, description = "Admission granted, login page served", content_type = "text/html"),
        (status = 303, description = "Diverted to the portal"),
        (status = 403, description = "Plaintext connection rejected by tenant policy"),
        (status = 429, description = "Source address temporarily blocked after repeated failures"),
        (status = 500, description = "Tenant configuration unavailable, admission denied")
    ),
    tag = "gate",
)]
/// Run the admission gate and serve the login page when it allows.
pub async fn login(
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    gate: Extension<Arc<AdmissionGate>>,
    Query(params): Query<LoginParams>,
    headers: HeaderMap,
) -> Response {
    let trust_forwarded_headers = gate.config().trust_forwarded_headers();

    let request = RequestContext {
        source_address: resolve_source_address(peer.ip(), &headers, trust_forwarded_headers),
        user_agent: header_value(&headers, USER_AGENT.as_str()),
        transport: TransportMeta {
            tls: gate.config().tls_enabled(),
            forwarded_proto: header_value(&headers, "x-forwarded-proto"),
        },
        login_key: params.key,
    };

    match gate.admit(&request).await {
        Ok(AdmissionDecision::Allow(admitted)) => login_page(&admitted),

        Ok(AdmissionDecision::RedirectTo(target)) => Redirect::to(&target).into_response(),

        Ok(AdmissionDecision::Reject(rejection)) => {
            (rejection.status, rejection.message).into_response()
        }

        Err(GateError::ConfigUnavailable(source)) => {
            error!("Tenant configuration is unavailable: {source:#}");

            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "The sign-in service is temporarily unavailable, please try again later.",
            )
                .into_response()
        }
    }
}

/// Serve the login shell with the pre-authentication form cookie.
fn login_page(admitted: &Admitted) -> Response {
    let token = session::generate_form_token();

    match session::form_cookie(&admitted.cookie, &token) {
        Ok(cookie) => {
            let mut headers = HeaderMap::new();
            headers.insert(SET_COOKIE, cookie);

            (headers, Html(render_login_page(&admitted.settings))).into_response()
        }

        Err(error) => {
            error!("Failed to build the form cookie: {}", error);

            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Render the login shell. Tenant-controlled fields are operator input, not
/// trusted markup, so everything is escaped on the way in.
fn render_login_page(settings: &TenantSettings) -> String {
    let company = escape_html(&settings.company_name);

    let mut branding = String::new();
    if let Some(logo) = &settings.company_logo {
        branding.push_str(&format!(
            "<img src='{}' alt='{}' class='logo'>\n",
            escape_html(logo),
            company
        ));
    }
    if let Some(message) = &settings.login_message {
        branding.push_str(&format!(
            "<p class='notice'>{}</p>\n",
            escape_html(message)
        ));
    }

    format!(
        "<!DOCTYPE html>\n\
         <html lang='en'>\n\
         <head>\n\
         <meta charset='utf-8'>\n\
         <meta name='viewport' content='width=device-width, initial-scale=1'>\n\
         <title>{company} - Sign in</title>\n\
         </head>\n\
         <body>\n\
         <main>\n\
         <h1>{company}</h1>\n\
         {branding}\
         <form method='post' action='/login'>\n\
         <label for='username'>Username</label>\n\
         <input type='text' id='username' name='username' autocomplete='username' required>\n\
         <label for='password'>Password</label>\n\
         <input type='password' id='password' name='password' autocomplete='current-password' required>\n\
         <button type='submit'>Sign in</button>\n\
         </form>\n\
         </main>\n\
         </body>\n\
         </html>\n"
    )
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Address the lockout counters key on.
///
/// Forwarded headers are honored only when the deployment declared a trusted
/// proxy in front; otherwise the socket peer is authoritative, since anyone
/// can send an `x-forwarded-for`.
fn resolve_source_address(
    peer: IpAddr,
    headers: &HeaderMap,
    trust_forwarded_headers: bool,
) -> IpAddr {
    if !trust_forwarded_headers {
        return peer;
    }

    forwarded_client_ip(headers).unwrap_or(peer)
}

/// Client IP from common proxy headers: first `x-forwarded-for` hop, then
/// `x-real-ip`.
fn forwarded_client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .and_then(|value| value.parse().ok());
    if forwarded.is_some() {
        return forwarded;
    }

    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .and_then(|value| value.parse().ok())
}

/// Minimal HTML escaping for text and attribute positions.
fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gatehouse::{
        admission::session::CookiePolicy,
        tenant::{MailSettings, TenantPolicy},
    };
    use axum::http::HeaderValue;

    fn peer() -> IpAddr {
        "192.0.2.10".parse().expect("valid address")
    }

    fn settings() -> TenantSettings {
        TenantSettings {
            company_name: "Acme Widgets".to_string(),
            company_logo: None,
            login_message: None,
            start_page: None,
            portal_enabled: true,
            mail: MailSettings::default(),
            policy: TenantPolicy::default(),
        }
    }

    #[test]
    fn untrusted_forwarded_headers_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9"));

        assert_eq!(resolve_source_address(peer(), &headers, false), peer());
    }

    #[test]
    fn trusted_forwarded_for_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 198.51.100.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));

        assert_eq!(
            resolve_source_address(peer(), &headers, true),
            "203.0.113.9".parse::<IpAddr>().expect("valid address")
        );
    }

    #[test]
    fn trusted_real_ip_is_the_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));

        assert_eq!(
            resolve_source_address(peer(), &headers, true),
            "198.51.100.2".parse::<IpAddr>().expect("valid address")
        );
    }

    #[test]
    fn unparseable_forwarded_value_falls_back_to_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));

        assert_eq!(resolve_source_address(peer(), &headers, true), peer());
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<script>alert('1')&\"</script>"),
            "&lt;script&gt;alert(&#39;1&#39;)&amp;&quot;&lt;/script&gt;"
        );
        assert_eq!(escape_html("Acme Widgets"), "Acme Widgets");
    }

    #[test]
    fn login_page_escapes_tenant_fields() {
        let mut settings = settings();
        settings.company_name = "Acme <Widgets>".to_string();
        settings.login_message = Some("Use your <b>work</b> account".to_string());

        let page = render_login_page(&settings);

        assert!(page.contains("Acme &lt;Widgets&gt;"));
        assert!(page.contains("Use your &lt;b&gt;work&lt;/b&gt; account"));
        assert!(!page.contains("<b>work</b>"));
    }

    #[test]
    fn login_page_sets_the_form_cookie() {
        let admitted = Admitted {
            settings: settings(),
            cookie: CookiePolicy::from_policy(&TenantPolicy::default()),
        };

        let response = login_page(&admitted);
        assert_eq!(response.status(), StatusCode::OK);

        let cookie = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .expect("cookie header present");

        assert!(cookie.starts_with("gatehouse_form="));
        assert!(cookie.contains("; HttpOnly"));
        assert!(cookie.contains("; Secure"));
    }
}
