// ABOUTME: Pluggable outbound rate limiting consulted before every PDU submission
// ABOUTME: Ships a leaky-bucket limiter and a no-op limiter behind one `wait` capability

use crate::client::SmppResult;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Boxed future returned by [`RateLimiter::wait`]
pub type WaitFuture<'a> = Pin<Box<dyn Future<Output = SmppResult<()>> + Send + 'a>>;

/// Grants permission to send PDUs.
///
/// `wait(n)` resolves once `n` permits are available. The session always
/// asks for one permit per PDU and bounds the wait by its response timeout.
pub trait RateLimiter: Send + Sync {
    fn wait(&self, n: u32) -> WaitFuture<'_>;
}

impl RateLimiter for leaky_bucket::RateLimiter {
    fn wait(&self, n: u32) -> WaitFuture<'_> {
        Box::pin(async move {
            self.acquire(n as usize).await;
            Ok(())
        })
    }
}

/// Limiter that never waits
#[derive(Debug, Default, Clone, Copy)]
pub struct Unlimited;

impl RateLimiter for Unlimited {
    fn wait(&self, _n: u32) -> WaitFuture<'_> {
        Box::pin(async { Ok(()) })
    }
}

/// A leaky bucket allowing `per_second` PDUs each second, starting full.
pub fn per_second(per_second: usize) -> leaky_bucket::RateLimiter {
    let per_second = per_second.max(1);
    leaky_bucket::RateLimiter::builder()
        .initial(per_second)
        .refill(per_second)
        .interval(Duration::from_secs(1))
        .max(per_second)
        .build()
}
