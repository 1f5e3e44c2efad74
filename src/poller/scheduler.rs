use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{PassSummary, SyncError};

/// One unit of periodic work.
#[async_trait]
pub trait SyncPass: Send + Sync {
    async fn run_pass(&self, cancel: &CancellationToken) -> Result<PassSummary, SyncError>;
}

/// Runs a [`SyncPass`] on a fixed period, never two at the same time.
pub struct SyncScheduler<P: ?Sized> {
    pass: Arc<P>,
    period: Duration,
    run_on_startup: bool,
    gate: Arc<Semaphore>,
}

impl<P> SyncScheduler<P>
where
    P: SyncPass + ?Sized + 'static,
{
    pub fn new(pass: Arc<P>, period: Duration) -> Self {
        Self {
            pass,
            period: period.max(Duration::from_millis(1)),
            run_on_startup: true,
            gate: Arc::new(Semaphore::new(1)),
        }
    }

    /// Whether the first pass starts immediately or after one period.
    pub fn run_on_startup(mut self, run_on_startup: bool) -> Self {
        self.run_on_startup = run_on_startup;
        self
    }

    pub fn start(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    /// Tick until `shutdown` fires, then wait for the in-flight pass to unwind.
    pub async fn run(&self, shutdown: CancellationToken) {
        let first = if self.run_on_startup {
            Instant::now()
        } else {
            Instant::now() + self.period
        };
        let mut ticker = interval_at(first, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut passes = JoinSet::new();

        info!(
            period_secs = self.period.as_secs(),
            run_on_startup = self.run_on_startup,
            "🔄 Sync scheduler started"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    while let Some(res) = passes.try_join_next() {
                        log_join(res);
                    }

                    let Ok(permit) = self.gate.clone().try_acquire_owned() else {
                        warn!("🔄 ⚠️ Previous sync pass still running, skipping tick");
                        continue;
                    };

                    let pass = self.pass.clone();
                    let cancel = shutdown.child_token();
                    passes.spawn(async move {
                        let _permit = permit;
                        report(&pass.run_pass(&cancel).await);
                    });
                }
            }
        }

        info!("🔄 Sync scheduler stopping");
        while let Some(res) = passes.join_next().await {
            log_join(res);
        }
        info!("🔄 Sync scheduler stopped");
    }

    /// Run one pass right now, or return `None` if a pass is already running.
    pub async fn trigger(
        &self,
        cancel: &CancellationToken,
    ) -> Option<Result<PassSummary, SyncError>> {
        let Ok(_permit) = self.gate.try_acquire() else {
            debug!("🔄 Sync pass already running, trigger ignored");
            return None;
        };

        let res = self.pass.run_pass(cancel).await;
        report(&res);
        Some(res)
    }
}

fn report(res: &Result<PassSummary, SyncError>) {
    match res {
        Ok(summary) => debug!(?summary, "🔄 Sync pass finished"),
        Err(SyncError::Cancelled) => info!("🔄 Sync pass cancelled"),
        Err(e) => error!(error = %e, "🔄 ❌ Sync pass failed"),
    }
}

fn log_join(res: Result<(), tokio::task::JoinError>) {
    if let Err(e) = res {
        error!(error = %e, "🔄 ❌ Sync pass task aborted");
    }
}
