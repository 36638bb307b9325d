//! Tenant settings: the single configuration row every admission stage reads.

use anyhow::{Context, Result};
use async_trait::async_trait;
use secrecy::SecretString;
use sqlx::{PgPool, Row};
use tracing::Instrument;

const DEFAULT_REMEMBER_ME_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Security policy half of the tenant row, consumed by the admission stages.
#[derive(Clone, Debug)]
pub struct TenantPolicy {
    /// `None` means the operator never set the policy. The request is then not
    /// rejected over plaintext, but cookies still default to `Secure`.
    pub https_only: Option<bool>,
    pub login_key_required: bool,
    pub login_key_secret: Option<SecretString>,
    pub remember_me_expiry_seconds: i64,
}

impl Default for TenantPolicy {
    fn default() -> Self {
        Self {
            https_only: None,
            login_key_required: false,
            login_key_secret: None,
            remember_me_expiry_seconds: DEFAULT_REMEMBER_ME_EXPIRY_SECONDS,
        }
    }
}

/// Mail fields stored in the same row; consumed by the mailer, not the gate.
#[derive(Clone, Debug, Default)]
pub struct MailSettings {
    pub from_name: Option<String>,
    pub from_email: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<i32>,
    pub smtp_encryption: Option<String>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<SecretString>,
}

/// The full tenant settings row.
#[derive(Clone, Debug)]
pub struct TenantSettings {
    pub company_name: String,
    pub company_logo: Option<String>,
    pub login_message: Option<String>,
    pub start_page: Option<String>,
    pub portal_enabled: bool,
    pub mail: MailSettings,
    pub policy: TenantPolicy,
}

/// Read side of the tenant settings store.
///
/// Loaded once per request with no caching, so lockout and transport decisions
/// always reflect the latest policy.
#[async_trait]
pub trait SettingsStore: Send + Sync + 'static {
    /// Load the tenant settings row, `Ok(None)` when the row is absent.
    ///
    /// # Errors
    /// Returns an error if the store is unreachable.
    async fn load(&self) -> Result<Option<TenantSettings>>;
}

/// Postgres-backed settings store.
#[derive(Clone)]
pub struct PgSettingsStore {
    pool: PgPool,
}

impl PgSettingsStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsStore for PgSettingsStore {
    async fn load(&self) -> Result<Option<TenantSettings>> {
        let query = r"
        SELECT
            company_name, company_logo, login_message, start_page, portal_enabled,
            mail_from_name, mail_from_email, smtp_host, smtp_port, smtp_encryption,
            smtp_username, smtp_password,
            https_only, login_key_required, login_key_secret, remember_me_expiry_seconds
        FROM tenant_settings
        WHERE id = 1
    ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to load tenant settings")?;

        Ok(row.map(|row| TenantSettings {
            company_name: row.get("company_name"),
            company_logo: row.get("company_logo"),
            login_message: row.get("login_message"),
            start_page: row.get("start_page"),
            portal_enabled: row.get("portal_enabled"),
            mail: MailSettings {
                from_name: row.get("mail_from_name"),
                from_email: row.get("mail_from_email"),
                smtp_host: row.get("smtp_host"),
                smtp_port: row.get("smtp_port"),
                smtp_encryption: row.get("smtp_encryption"),
                smtp_username: row.get("smtp_username"),
                smtp_password: row
                    .get::<Option<String>, _>("smtp_password")
                    .map(SecretString::from),
            },
            policy: TenantPolicy {
                https_only: row.get("https_only"),
                login_key_required: row.get("login_key_required"),
                login_key_secret: row
                    .get::<Option<String>, _>("login_key_secret")
                    .map(SecretString::from),
                remember_me_expiry_seconds: row.get("remember_me_expiry_seconds"),
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_policy_defaults() {
        let policy = TenantPolicy::default();

        assert_eq!(policy.https_only, None);
        assert!(!policy.login_key_required);
        assert!(policy.login_key_secret.is_none());
        assert_eq!(
            policy.remember_me_expiry_seconds,
            DEFAULT_REMEMBER_ME_EXPIRY_SECONDS
        );
    }

    #[test]
    fn tenant_policy_debug_redacts_secret() {
        let policy = TenantPolicy {
            login_key_required: true,
            login_key_secret: Some(SecretString::from("hunter2".to_string())),
            ..TenantPolicy::default()
        };

        let rendered = format!("{policy:?}");
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn mail_settings_debug_redacts_password() {
        let mail = MailSettings {
            smtp_password: Some(SecretString::from("s3cr3t".to_string())),
            ..MailSettings::default()
        };

        let rendered = format!("{mail:?}");
        assert!(!rendered.contains("s3cr3t"));
    }
}
