// ABOUTME: SMPP keep-alive configuration and failure accounting for the enquire_link ticker
// ABOUTME: The session tears the connection down once consecutive failures reach the limit

use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for SMPP keep-alive functionality
///
/// Controls the periodic enquire_link PDUs a bound session sends to detect a
/// dead connection.
///
/// # Example
///
/// ```rust
/// use smpp_session::client::KeepAliveConfig;
/// use std::time::Duration;
///
/// // Default configuration (10s interval, 5s timeout, 1 failure)
/// let config = KeepAliveConfig::default();
///
/// // Custom configuration
/// let config = KeepAliveConfig::new(Duration::from_secs(60))
///     .with_timeout(Duration::from_secs(15))
///     .with_max_failures(3);
///
/// // Disabled keep-alive
/// let config = KeepAliveConfig::disabled();
/// assert!(!config.enabled);
/// ```
#[derive(Debug, Clone)]
pub struct KeepAliveConfig {
    /// Interval between enquire_link PDUs (default: 10 seconds)
    pub interval: Duration,

    /// Timeout for enquire_link responses (default: 5 seconds)
    ///
    /// Should be shorter than the interval so pings never overlap.
    pub timeout: Duration,

    /// Consecutive failures that end the session (default: 1)
    pub max_failures: u32,

    /// Whether keep-alive is enabled (default: true)
    pub enabled: bool,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            timeout: Duration::from_secs(5),
            max_failures: 1,
            enabled: true,
        }
    }
}

impl KeepAliveConfig {
    /// Create a new keep-alive configuration with custom interval
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Set the timeout for enquire_link responses
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the consecutive failures tolerated before the connection is
    /// considered dead. Zero is treated as one.
    pub fn with_max_failures(mut self, max_failures: u32) -> Self {
        self.max_failures = max_failures.max(1);
        self
    }

    /// Create a disabled keep-alive configuration
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

/// Snapshot of keep-alive health
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeepAliveStatus {
    /// Count of enquire_link operations that have failed in a row
    pub consecutive_failures: u32,

    /// Total enquire_link PDUs sent
    pub total_pings: u32,

    /// Total enquire_link_resp received
    pub total_pongs: u32,
}

/// Failure accounting for the keep-alive ticker
#[derive(Debug)]
pub struct KeepAliveManager {
    max_failures: u32,
    status: KeepAliveStatus,
}

impl KeepAliveManager {
    pub fn new(config: &KeepAliveConfig) -> Self {
        Self {
            max_failures: config.max_failures.max(1),
            status: KeepAliveStatus::default(),
        }
    }

    /// Record that an enquire_link was sent
    pub fn on_ping_sent(&mut self) {
        self.status.total_pings += 1;
        debug!(total = self.status.total_pings, "enquire_link sent");
    }

    /// Record a successful enquire_link response
    pub fn on_ping_success(&mut self) {
        self.status.consecutive_failures = 0;
        self.status.total_pongs += 1;
    }

    /// Record a failed enquire_link operation
    pub fn on_ping_failure(&mut self) {
        self.status.consecutive_failures += 1;
        warn!(
            consecutive_failures = self.status.consecutive_failures,
            max_failures = self.max_failures,
            "enquire_link failed"
        );
    }

    /// Check if the connection should be considered failed
    pub fn is_connection_failed(&self) -> bool {
        self.status.consecutive_failures >= self.max_failures
    }

    pub fn status(&self) -> KeepAliveStatus {
        self.status.clone()
    }
}
