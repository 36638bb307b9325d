//! The admission gate: decides whether a request may reach the login form
//! before any credential is checked.

pub mod login_key;
pub mod lockout;
pub mod session;
pub mod transport;


use crate::gatehouse::{
    audit::AuditLog,
    config::GateConfig,
    tenant::{SettingsStore, TenantSettings},
};
use axum::http::StatusCode;
use lockout::{LockoutController, LockoutDecision};
use session::CookiePolicy;
use std::{net::IpAddr, sync::Arc};
use tracing::{debug, info};
use transport::TransportMeta;

/// Facts about one request, assembled by the host layer.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub source_address: IpAddr,
    pub user_agent: Option<String>,
    pub transport: TransportMeta,
    pub login_key: Option<String>,
}

/// Terminal rejection: status plus a human-readable explanation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejection {
    pub status: StatusCode,
    pub message: String,
}

/// Everything the downstream login surface needs once admission is granted.
#[derive(Clone, Debug)]
pub struct Admitted {
    pub settings: TenantSettings,
    pub cookie: CookiePolicy,
}

/// Outcome of the gate, produced once per request and never persisted.
///
/// The variants carry materially different security semantics: `RedirectTo`
/// is a deliberate disguise for a key mismatch, not a failure.
#[derive(Clone, Debug)]
pub enum AdmissionDecision {
    Allow(Admitted),
    RedirectTo(String),
    Reject(Rejection),
}

/// Fatal failures. The gate cannot decide safely and the caller must deny
/// admission; no default-permissive policy is ever assumed.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// The settings row is missing or a backing store is unreachable. Carries
    /// the underlying cause for logging; the visitor-facing message stays
    /// generic.
    #[error("tenant configuration is unavailable")]
    ConfigUnavailable(anyhow::Error),
}

pub struct AdmissionGate {
    settings: Arc<dyn SettingsStore>,
    lockout: LockoutController,
    config: GateConfig,
}

impl AdmissionGate {
    #[must_use]
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        audit: Arc<dyn AuditLog>,
        config: GateConfig,
    ) -> Self {
        let lockout =
            LockoutController::new(audit, config.lockout_threshold(), config.lockout_window());

        Self {
            settings,
            lockout,
            config,
        }
    }

    /// Settings the host layer needs to assemble a [`RequestContext`].
    #[must_use]
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Run the admission sequence for one request.
    ///
    /// Stage order is load-bearing: settings first (every stage needs policy),
    /// transport before the lockout read so failure counters never travel over
    /// plaintext, lockout before the key gate so a blocked address cannot
    /// learn whether its key guess was right. The first non-allow outcome
    /// short-circuits the rest.
    ///
    /// # Errors
    /// `GateError::ConfigUnavailable` when the settings row cannot be loaded
    /// or the audit store fails mid-sequence.
    pub async fn admit(&self, request: &RequestContext) -> Result<AdmissionDecision, GateError> {
        let settings = self
            .settings
            .load()
            .await
            .map_err(GateError::ConfigUnavailable)?
            .ok_or_else(|| {
                GateError::ConfigUnavailable(anyhow::anyhow!("tenant settings row is absent"))
            })?;

        if let Some(rejection) = transport::enforce(
            &settings.policy,
            &request.transport,
            self.config.trust_forwarded_headers(),
            &settings.company_name,
        ) {
            info!(
                source_address = %request.source_address,
                "plaintext login rejected by transport policy"
            );
            return Ok(AdmissionDecision::Reject(rejection));
        }

        match self
            .lockout
            .check(request.source_address, request.user_agent.as_deref())
            .await
            .map_err(GateError::ConfigUnavailable)?
        {
            LockoutDecision::Blocked { .. } => {
                return Ok(AdmissionDecision::Reject(Rejection {
                    status: StatusCode::TOO_MANY_REQUESTS,
                    message: format!(
                        "Too many failed sign-in attempts from your address. {} has \
                         temporarily blocked access to the login page; please try \
                         again later. This action has been logged.",
                        settings.company_name
                    ),
                }));
            }
            LockoutDecision::Clear => {}
        }

        if login_key::evaluate(&settings.policy, request.login_key.as_deref())
            == login_key::KeyDecision::Divert
        {
            debug!("login key missing or mismatched, diverting to portal");
            return Ok(AdmissionDecision::RedirectTo(
                self.config.portal_url().to_string(),
            ));
        }

        let cookie = CookiePolicy::from_policy(&settings.policy);

        Ok(AdmissionDecision::Allow(Admitted { settings, cookie }))
    }
}
