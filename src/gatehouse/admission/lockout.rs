//! Per-address lockout over the audit log's failure history.
//!
//! Counting is keyed purely by the source address: one address can lock the
//! login page for everyone behind it, and an attacker rotating addresses
//! spreads attempts across the limit. Known trade-off of the scheme, kept for
//! compatibility with the accounts already relying on it; review before
//! changing the key.

use crate::gatehouse::audit::{AuditLog, AuthEvent, EventAction, EventKind};
use anyhow::{Context, Result};
use std::{net::IpAddr, sync::Arc, time::Duration};
use tracing::warn;

/// Outcome of the lockout check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LockoutDecision {
    Clear,
    Blocked { failed_count: i64 },
}

pub struct LockoutController {
    audit: Arc<dyn AuditLog>,
    threshold: i64,
    window: Duration,
}

impl LockoutController {
    #[must_use]
    pub fn new(audit: Arc<dyn AuditLog>, threshold: i64, window: Duration) -> Self {
        Self {
            audit,
            threshold,
            window,
        }
    }

    /// Count recent login failures for the address; at or above the threshold,
    /// write one `Blocked` record and report the block.
    ///
    /// The count is a point-in-time snapshot: concurrent requests may all read
    /// a sub-threshold value and pass, briefly overshooting the limit. This is
    /// an accepted race; the store stays lock-free.
    ///
    /// # Errors
    /// Returns an error when the audit store is unreachable. Callers must fail
    /// closed.
    pub async fn check(
        &self,
        source_address: IpAddr,
        user_agent: Option<&str>,
    ) -> Result<LockoutDecision> {
        let failed_count = self
            .audit
            .count_recent(
                EventKind::Login,
                EventAction::Failed,
                source_address,
                self.window,
            )
            .await
            .context("failed to count recent login failures")?;

        if failed_count < self.threshold {
            return Ok(LockoutDecision::Clear);
        }

        warn!(%source_address, failed_count, "login blocked by lockout");

        self.audit
            .append(AuthEvent::new(
                EventKind::Login,
                EventAction::Blocked,
                source_address,
                user_agent,
                format!("{source_address} was blocked access to login due to repeated failed attempts"),
            ))
            .await
            .context("failed to record lockout block")?;

        Ok(LockoutDecision::Blocked { failed_count })
    }
}
