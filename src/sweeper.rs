use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::Engine;
use crate::observability;

/// Result of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Orders cancelled and rooms released this pass.
    pub expired: usize,
    /// Orders that were no longer expired PENDING once their room lock was
    /// taken (paid, cancelled, or deadline moved in the meantime).
    pub skipped: usize,
    /// Orders whose cancellation hit a transient failure; retried next
    /// pass.
    pub failed: usize,
}

/// One pass: cancel every PENDING order past its decision deadline and
/// release its room. A failure on one order never aborts the rest, and
/// re-running is idempotent — whatever is left gets retried on the next
/// cycle.
pub async fn sweep(engine: &Engine) -> SweepStats {
    let started = std::time::Instant::now();
    let now = Utc::now();
    let mut stats = SweepStats::default();

    for (order_id, room_id) in engine.collect_expired(now) {
        match engine.expire_reservation(order_id, now).await {
            Ok(true) => {
                info!(order = %order_id, room = %room_id, "expired unconfirmed reservation");
                metrics::counter!(observability::SWEEPER_EXPIRED_TOTAL).increment(1);
                stats.expired += 1;
            }
            Ok(false) => {
                debug!(order = %order_id, "sweep skip: no longer an expired pending order");
                stats.skipped += 1;
            }
            Err(e) => {
                warn!(order = %order_id, "sweep failed, deferring to next cycle: {e}");
                metrics::counter!(observability::SWEEPER_ERRORS_TOTAL).increment(1);
                stats.failed += 1;
            }
        }
    }

    metrics::histogram!(observability::SWEEP_DURATION_SECONDS)
        .record(started.elapsed().as_secs_f64());
    stats
}

/// Owned handle to the periodic sweeper task. The task runs one pass
/// immediately, then on every `sweep_interval` tick until stopped.
pub struct Sweeper {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    pub fn start(engine: Arc<Engine>) -> Self {
        let period = engine.policy().sweep_interval;
        let (shutdown, mut rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let stats = sweep(&engine).await;
                        if stats.expired > 0 || stats.failed > 0 {
                            info!(
                                expired = stats.expired,
                                skipped = stats.skipped,
                                failed = stats.failed,
                                "sweep complete"
                            );
                        }
                    }
                    _ = rx.changed() => break,
                }
            }
        });
        Self { shutdown, handle }
    }

    /// Stop the task and wait for it to wind down.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}
