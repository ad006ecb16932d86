//! # Background Sweep
//!
//! A periodic task that expires stale registry entries. The task holds only a
//! weak reference to the registry and ends on its own once the registry is gone.

use std::sync::Arc;
use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;
use tokio::time::interval_at;
use tokio_util::sync::CancellationToken;
use tokio_util::sync::DropGuard;
use tracing::debug;
use tracing::trace;

use crate::registry::CancellationRegistry;
use crate::registry::Inner;

/// Handle to a running sweep task. Dropping it stops the task.
pub struct Sweeper {
    _guard: DropGuard,
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Stops the task and waits for it to finish.
    pub async fn shutdown(self) {
        let Self { _guard: guard, handle } = self;
        drop(guard);
        if let Err(err) = handle.await {
            debug!(error = %err, "sweeper task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl CancellationRegistry {
    /// Starts the periodic sweep on the current tokio runtime.
    ///
    /// The first sweep runs one full interval after the call.
    pub fn spawn_sweeper(&self) -> Sweeper {
        let stop = CancellationToken::new();
        let inner = Arc::downgrade(&self.inner);
        let period = self.config().sweep_interval.max(Duration::from_millis(1));
        let handle = tokio::spawn(sweep(inner, period, stop.clone()));
        Sweeper { _guard: stop.drop_guard(), handle }
    }
}

async fn sweep(inner: Weak<Inner>, period: Duration, stop: CancellationToken) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    debug!(?period, "cancellation sweeper started");
    loop {
        tokio::select! {
            _ = stop.cancelled() => break,
            _ = ticker.tick() => {
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                let expired = inner.expire_tokens();
                trace!(expired, expiry = ?inner.config().expiry, "sweep finished");
            }
        }
    }
    debug!("cancellation sweeper stopped");
}
