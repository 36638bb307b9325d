//! Gate configuration shared by every admission stage.

use std::time::Duration;

#[derive(Clone, Debug)]
pub struct GateConfig {
    lockout_threshold: i64,
    lockout_window: Duration,
    portal_url: String,
    trust_forwarded_headers: bool,
    tls_enabled: bool,
}

impl GateConfig {
    /// Failed login attempts per source address before admission is blocked.
    pub const DEFAULT_LOCKOUT_THRESHOLD: i64 = 15;

    /// Trailing window in seconds over which failed attempts are counted.
    pub const DEFAULT_LOCKOUT_WINDOW_SECONDS: u64 = 10 * 60;

    /// Redirect target when the login key is required and does not match.
    pub const DEFAULT_PORTAL_URL: &'static str = "/portal";

    #[must_use]
    pub fn new() -> Self {
        Self {
            lockout_threshold: Self::DEFAULT_LOCKOUT_THRESHOLD,
            lockout_window: Duration::from_secs(Self::DEFAULT_LOCKOUT_WINDOW_SECONDS),
            portal_url: Self::DEFAULT_PORTAL_URL.to_string(),
            trust_forwarded_headers: false,
            tls_enabled: false,
        }
    }

    #[must_use]
    pub fn with_lockout_threshold(mut self, threshold: i64) -> Self {
        self.lockout_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_lockout_window(mut self, window: Duration) -> Self {
        self.lockout_window = window;
        self
    }

    #[must_use]
    pub fn with_portal_url(mut self, portal_url: String) -> Self {
        self.portal_url = portal_url;
        self
    }

    #[must_use]
    pub fn with_trust_forwarded_headers(mut self, trust: bool) -> Self {
        self.trust_forwarded_headers = trust;
        self
    }

    #[must_use]
    pub fn with_tls_enabled(mut self, tls_enabled: bool) -> Self {
        self.tls_enabled = tls_enabled;
        self
    }

    #[must_use]
    pub fn lockout_threshold(&self) -> i64 {
        self.lockout_threshold
    }

    #[must_use]
    pub fn lockout_window(&self) -> Duration {
        self.lockout_window
    }

    #[must_use]
    pub fn portal_url(&self) -> &str {
        &self.portal_url
    }

    #[must_use]
    pub fn trust_forwarded_headers(&self) -> bool {
        self.trust_forwarded_headers
    }

    #[must_use]
    pub fn tls_enabled(&self) -> bool {
        self.tls_enabled
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self::new()
    }
}
