use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use tokio::sync::{mpsc, oneshot};
use tracing::trace;

use crate::net::Poolable;
use crate::utils::error::{PoolError, Result};

use super::PoolInner;

/// Work queue entries for the maintenance worker.
enum SweepRequest {
    /// Run one bounded eviction sweep.
    Sweep,
    /// Acknowledge once every earlier request has been serviced.
    Drain(oneshot::Sender<()>),
}

/// Submission handle to a pool's maintenance worker.
///
/// Exactly one worker services the queue, strictly in order, so sweeps
/// never run concurrently with each other. Submission never blocks the
/// caller beyond an unbounded channel send.
pub(super) struct Sweeper {
    tx: mpsc::UnboundedSender<SweepRequest>,
    /// Coalesces bursts of submissions into a single queued sweep. Each
    /// sweep recomputes pool state freshly, so dropped duplicates are
    /// harmless; this exists only to keep the queue short under traffic.
    pending: Arc<AtomicBool>,
}

impl Sweeper {
    /// Enqueue a sweep. Fire-and-forget; a no-op once the worker is gone.
    pub(super) fn schedule(&self) {
        if self.pending.swap(true, Ordering::AcqRel) {
            return; // a sweep is already queued
        }
        let _ = self.tx.send(SweepRequest::Sweep);
    }

    /// Wait for the queue to catch up. Test support only.
    pub(super) async fn drain(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(SweepRequest::Drain(ack))
            .map_err(|_| PoolError::MaintenanceUnavailable)?;
        done.await.map_err(|_| PoolError::MaintenanceUnavailable)
    }
}

/// Spawn the maintenance worker for a pool.
///
/// The worker holds only a weak reference to the pool: it exits when the
/// last pool handle is dropped (the channel closes) and never keeps the
/// registry alive on its own.
pub(super) fn spawn<C: Poolable>(pool: Weak<PoolInner<C>>) -> Sweeper {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let pending = Arc::new(AtomicBool::new(false));
    let worker_pending = pending.clone();

    tokio::spawn(async move {
        while let Some(request) = rx.recv().await {
            match request {
                SweepRequest::Sweep => {
                    // Clear before sweeping so submissions arriving during
                    // the sweep queue a fresh one.
                    worker_pending.store(false, Ordering::Release);
                    match pool.upgrade() {
                        Some(pool) => pool.sweep(),
                        None => break,
                    }
                }
                SweepRequest::Drain(ack) => {
                    let _ = ack.send(());
                }
            }
        }
        trace!("Maintenance worker stopped");
    });

    Sweeper { tx, pending }
}
