//! Client-side quota enforcement for the Riot API.
//!
//! Riot applies two limits at once to every key: a short per-second window and
//! a longer multi-minute window. [`RateLimiter`] holds one [`TokenBucket`] per
//! window and every outgoing request must get a token from both.

use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

mod token_bucket;

pub use token_bucket::TokenBucket;

/// The waiting caller was cancelled before it got a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("rate limiter wait cancelled")]
pub struct Cancelled;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimiterConfigError {
    #[error("{bucket} bucket capacity must be greater than zero")]
    ZeroCapacity { bucket: &'static str },

    #[error("{bucket} bucket period must be greater than zero")]
    ZeroPeriod { bucket: &'static str },
}

/// `capacity` operations allowed per `period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaWindow {
    pub capacity: u32,
    pub period: Duration,
}

impl QuotaWindow {
    pub const fn new(capacity: u32, period: Duration) -> Self {
        Self { capacity, period }
    }
}

/// Short and long window buckets shared by every call to the same API key.
#[derive(Debug)]
pub struct RateLimiter {
    short: TokenBucket,
    long: TokenBucket,
}

impl RateLimiter {
    pub fn new(short: QuotaWindow, long: QuotaWindow) -> Result<Self, LimiterConfigError> {
        let limiter = Self {
            short: TokenBucket::new("short", short)?,
            long: TokenBucket::new("long", long)?,
        };

        debug!(
            short_capacity = short.capacity,
            short_period = ?short.period,
            long_capacity = long.capacity,
            long_period = ?long.period,
            "🚦 Rate limiter configured"
        );

        Ok(limiter)
    }

    /// Take one token from the short bucket, then one from the long bucket.
    ///
    /// The order is fixed. If the wait on the long bucket is cancelled, the short
    /// token already taken stays spent: it stands for a call slot that was
    /// claimed even though the call never went out.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), Cancelled> {
        self.short.acquire(cancel).await?;
        self.long.acquire(cancel).await
    }

    pub fn short(&self) -> &TokenBucket {
        &self.short
    }

    pub fn long(&self) -> &TokenBucket {
        &self.long
    }
}
