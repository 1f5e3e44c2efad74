use std::{
    collections::VecDeque,
    sync::{Mutex, PoisonError},
    time::Duration,
};

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::{Cancelled, LimiterConfigError, QuotaWindow};

/// A bucket of `capacity` permits shared by every caller holding a reference to it.
///
/// A consumed token comes back exactly one `period` after it was taken, so no
/// window of length `period` ever sees more than `capacity` grants. Refill is
/// computed from the monotonic clock when a caller asks for a token.
#[derive(Debug)]
pub struct TokenBucket {
    name: &'static str,
    capacity: usize,
    period: Duration,
    /// Grant instants of the tokens currently out of the bucket, oldest first.
    grants: Mutex<VecDeque<Instant>>,
}

impl TokenBucket {
    pub fn new(name: &'static str, window: QuotaWindow) -> Result<Self, LimiterConfigError> {
        if window.capacity == 0 {
            return Err(LimiterConfigError::ZeroCapacity { bucket: name });
        }
        if window.period.is_zero() {
            return Err(LimiterConfigError::ZeroPeriod { bucket: name });
        }

        let capacity = window.capacity as usize;

        Ok(Self {
            name,
            capacity,
            period: window.period,
            grants: Mutex::new(VecDeque::with_capacity(capacity)),
        })
    }

    /// Tokens that could be taken right now without waiting.
    pub fn available(&self) -> usize {
        let mut grants = self.lock();
        Self::release_expired(&mut grants, self.period, Instant::now());
        self.capacity - grants.len()
    }

    /// Wait until a token is available and take it.
    ///
    /// Returns [`Cancelled`] without consuming anything if `cancel` fires first.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), Cancelled> {
        loop {
            if cancel.is_cancelled() {
                return Err(Cancelled);
            }

            let ready_at = match self.try_take(Instant::now()) {
                Ok(()) => return Ok(()),
                Err(ready_at) => ready_at,
            };

            trace!(bucket = self.name, "⏳ Waiting for a token");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Cancelled),
                _ = sleep_until(ready_at) => {}
            }
        }
    }

    /// Take a token if one is free, otherwise report when the oldest one comes back.
    fn try_take(&self, now: Instant) -> Result<(), Instant> {
        let mut grants = self.lock();
        Self::release_expired(&mut grants, self.period, now);

        if grants.len() < self.capacity {
            grants.push_back(now);
            return Ok(());
        }

        Err(grants
            .front()
            .map(|oldest| *oldest + self.period)
            .unwrap_or(now))
    }

    fn release_expired(grants: &mut VecDeque<Instant>, period: Duration, now: Instant) {
        while grants
            .front()
            .is_some_and(|oldest| now.duration_since(*oldest) >= period)
        {
            grants.pop_front();
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Instant>> {
        // Nothing panics while the queue is half-updated.
        self.grants.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
