//! Append-only audit log of authentication events.
//!
//! The credential flow writes `Failed` / `Succeeded` records; the lockout
//! controller writes `Blocked` records and reads the per-address failure count
//! over a trailing window. Records are immutable once written.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use sqlx::{PgPool, Row};
use std::{net::IpAddr, time::Duration};
use tracing::Instrument;
use uuid::Uuid;

const MAX_FIELD_LENGTH: usize = 255;

/// Record kind. The gate only deals in `Login` events; other kinds are written
/// by the surrounding application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Login,
}

impl EventKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "Login",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventAction {
    Failed,
    Blocked,
    Succeeded,
}

impl EventAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Failed => "Failed",
            Self::Blocked => "Blocked",
            Self::Succeeded => "Succeeded",
        }
    }
}

/// A single audit record.
#[derive(Clone, Debug)]
pub struct AuthEvent {
    pub kind: EventKind,
    pub action: EventAction,
    pub source_address: IpAddr,
    pub user_agent: Option<String>,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

impl AuthEvent {
    /// Build a record stamped with the current instant. Request-derived fields
    /// are sanitized before they ever reach the store.
    #[must_use]
    pub fn new(
        kind: EventKind,
        action: EventAction,
        source_address: IpAddr,
        user_agent: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            action,
            source_address,
            user_agent: user_agent.map(sanitize_field),
            message: message.into(),
            occurred_at: Utc::now(),
        }
    }
}

/// Strip control characters and cap the length of request-derived values.
pub(crate) fn sanitize_field(value: &str) -> String {
    let cleaned = Regex::new(r"[\x00-\x1F\x7F]").map_or_else(
        |_| value.to_string(),
        |re| re.replace_all(value, "").into_owned(),
    );

    cleaned.trim().chars().take(MAX_FIELD_LENGTH).collect()
}

/// Append-only audit sink plus the aggregate read the lockout check needs.
#[async_trait]
pub trait AuditLog: Send + Sync + 'static {
    /// Append one record.
    ///
    /// # Errors
    /// Returns an error if the store rejects the write or is unreachable.
    async fn append(&self, event: AuthEvent) -> Result<()>;

    /// Count records matching kind, action and source address whose
    /// `occurred_at` lies inside the trailing window ending now.
    ///
    /// # Errors
    /// Returns an error if the store is unreachable.
    async fn count_recent(
        &self,
        kind: EventKind,
        action: EventAction,
        source_address: IpAddr,
        window: Duration,
    ) -> Result<i64>;
}

/// Postgres-backed audit log.
#[derive(Clone)]
pub struct PgAuditLog {
    pool: PgPool,
}

impl PgAuditLog {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLog for PgAuditLog {
    async fn append(&self, event: AuthEvent) -> Result<()> {
        let query = "INSERT INTO auth_events (id, kind, action, source_address, user_agent, message, occurred_at) VALUES ($1, $2, $3, $4, $5, $6, $7)";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT"
        );
        sqlx::query(query)
            .bind(Uuid::now_v7())
            .bind(event.kind.as_str())
            .bind(event.action.as_str())
            .bind(event.source_address)
            .bind(event.user_agent.as_deref())
            .bind(&event.message)
            .bind(event.occurred_at)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to append auth event")?;

        Ok(())
    }

    async fn count_recent(
        &self,
        kind: EventKind,
        action: EventAction,
        source_address: IpAddr,
        window: Duration,
    ) -> Result<i64> {
        let query = "SELECT COUNT(*) FROM auth_events WHERE source_address = $1 AND kind = $2 AND action = $3 AND occurred_at > NOW() - $4::interval";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT"
        );
        let row = sqlx::query(query)
            .bind(source_address)
            .bind(kind.as_str())
            .bind(action.as_str())
            .bind(format!("{} seconds", window.as_secs()))
            .fetch_one(&self.pool)
            .instrument(span)
            .await
            .context("failed to count auth events")?;

        Ok(row.get(0))
    }
}
