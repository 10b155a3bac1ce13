// ABOUTME: Session configuration with sensible defaults and fluent setters
// ABOUTME: Everything a Session needs is fixed here before any network activity

use crate::client::keepalive::KeepAliveConfig;
use crate::client::traits::InboundHandler;
use crate::client::types::BindCredentials;
use crate::ratelimit::RateLimiter;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_WINDOW_SIZE: usize = 10;
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for one SMPP session
///
/// ```rust
/// use smpp_session::client::{BindCredentials, KeepAliveConfig, SessionConfig};
/// use std::time::Duration;
///
/// let config = SessionConfig::new(
///     "localhost:2775",
///     BindCredentials::transceiver("system_id", "password"),
/// )
/// .with_window_size(50)
/// .with_response_timeout(Duration::from_secs(5))
/// .with_keep_alive(KeepAliveConfig::new(Duration::from_secs(30)));
///
/// assert_eq!(config.window_size, 50);
/// ```
#[derive(Clone)]
pub struct SessionConfig {
    /// `host:port` of the SMSC
    pub addr: String,
    pub credentials: BindCredentials,
    /// Maximum requests awaiting a response at once (default: 10)
    pub window_size: usize,
    /// Deadline for each request's response (default: 1 second)
    pub response_timeout: Duration,
    /// Deadline for the TCP handshake (default: 5 seconds)
    pub connect_timeout: Duration,
    pub keep_alive: KeepAliveConfig,
    /// Consulted before every submission and query; `None` sends unthrottled
    pub rate_limiter: Option<Arc<dyn RateLimiter>>,
    /// Receives deliver_sm and other unsolicited PDUs
    pub inbound_handler: Option<Arc<dyn InboundHandler>>,
}

impl SessionConfig {
    pub fn new(addr: impl Into<String>, credentials: BindCredentials) -> Self {
        Self {
            addr: addr.into(),
            credentials,
            window_size: DEFAULT_WINDOW_SIZE,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            keep_alive: KeepAliveConfig::default(),
            rate_limiter: None,
            inbound_handler: None,
        }
    }

    /// Set the window size. Zero is treated as one.
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size.max(1);
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: KeepAliveConfig) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    pub fn with_inbound_handler(mut self, handler: Arc<dyn InboundHandler>) -> Self {
        self.inbound_handler = Some(handler);
        self
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("addr", &self.addr)
            .field("system_id", &self.credentials.system_id)
            .field("bind_type", &self.credentials.bind_type)
            .field("window_size", &self.window_size)
            .field("response_timeout", &self.response_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("keep_alive", &self.keep_alive)
            .field("rate_limited", &self.rate_limiter.is_some())
            .field("inbound_handler", &self.inbound_handler.is_some())
            .finish()
    }
}
