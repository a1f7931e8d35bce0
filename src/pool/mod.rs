use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::config::{Config, PoolOptions};
use crate::net::{Address, Poolable};
use crate::telemetry::{EventHistory, EventKind, PoolEvent};
use crate::utils::error::Result;

mod sweeper;

/// Connection pool for reusable transport connections
///
/// Manages an ordered registry of idle and shared connections, enabling
/// connection reuse and reducing connection establishment overhead. A
/// non-multiplexed connection is handed to at most one caller at a time;
/// a multiplexed connection stays registered while any number of callers
/// use it concurrently.
///
/// The handle is cheap to clone; all clones operate on the same registry.
/// Construction spawns the maintenance worker, so a pool must be created
/// inside a Tokio runtime.
pub struct Pool<C: Poolable> {
    inner: Arc<PoolInner<C>>,
}

impl<C: Poolable> Clone for Pool<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

pub(crate) struct PoolInner<C> {
    /// Registry of connections, most-recently-used at the front.
    ///
    /// Insert-at-front and scan-from-front are the contract: acquire
    /// prefers recently used connections, eviction trims from the back.
    connections: Mutex<VecDeque<Arc<C>>>,
    keep_alive: Duration,
    max_idle: usize,
    sweep_cap: usize,
    sweeper: sweeper::Sweeper,
    events: EventHistory,
    options: PoolOptions,
}

/// Why a connection was removed and closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EvictReason {
    Dead,
    Expired,
    Excess,
    Shutdown,
}

impl EvictReason {
    fn as_str(self) -> &'static str {
        match self {
            EvictReason::Dead => "dead",
            EvictReason::Expired => "expired",
            EvictReason::Excess => "excess",
            EvictReason::Shutdown => "shutdown",
        }
    }
}

impl<C: Poolable> Pool<C> {
    /// Create a new connection pool with the given options
    pub fn new(options: PoolOptions) -> Self {
        let inner = Arc::new_cyclic(|weak| PoolInner {
            connections: Mutex::new(VecDeque::new()),
            keep_alive: options.keep_alive_duration(),
            max_idle: options.effective_max_idle(),
            sweep_cap: options.sweep_cap,
            sweeper: sweeper::spawn(weak.clone()),
            events: EventHistory::new(256, 24),
            options,
        });

        Self { inner }
    }

    /// Create a pool from loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.pool.clone())
    }

    /// Get a reusable connection for `address`, if one is registered.
    ///
    /// Returns `None` on a miss; establishing a replacement connection is
    /// the caller's responsibility. Equivalent to [`Pool::acquire_with`]
    /// with a claim step that always succeeds.
    pub fn acquire(&self, address: &Address) -> Option<Arc<C>> {
        self.acquire_with(address, |_| true)
    }

    /// Get a reusable connection, running `claim` on each exclusive match.
    ///
    /// The registry is scanned from most- to least-recently-used. A
    /// candidate must match the address, be alive, and be within the
    /// keep-alive window; anything else is skipped in place. The first
    /// matching non-multiplexed connection is removed from the registry
    /// and offered to `claim` (bookkeeping such as binding the connection
    /// to the caller's context; it must not block). If `claim` rejects it,
    /// the connection is closed and the scan continues with the next
    /// candidate. A matching multiplexed connection is returned without
    /// being removed and becomes the most-recently-used entry.
    pub fn acquire_with<F>(&self, address: &Address, mut claim: F) -> Option<Arc<C>>
    where
        F: FnMut(&C) -> bool,
    {
        let mut rejected: SmallVec<[Arc<C>; 2]> = SmallVec::new();

        let found = {
            let mut conns = self.inner.connections.lock().unwrap();
            let mut found = None;
            let mut idx = 0;

            while idx < conns.len() {
                let conn = &conns[idx];
                if conn.address() != address
                    || !conn.is_alive()
                    || conn.idle_start_time().elapsed() >= self.inner.keep_alive
                {
                    idx += 1;
                    continue;
                }

                // idx is in bounds, so remove always yields the entry
                let conn = match conns.remove(idx) {
                    Some(conn) => conn,
                    None => break,
                };

                if conn.is_multiplexed() {
                    // Stays registered for further sharing, but counts as
                    // the most recently used entry from here on.
                    conns.push_front(conn.clone());
                    found = Some(conn);
                    break;
                }

                if claim(&conn) {
                    found = Some(conn);
                    break;
                }

                // Claim failed: the connection is neither returned nor
                // re-inserted. Close it once the lock is released.
                rejected.push(conn);
            }

            found
        };

        for conn in rejected {
            trace!("Discarding connection to {} after failed claim", conn.address());
            conn.close();
            self.inner.events.record_event(
                EventKind::Discarded,
                conn.address(),
                Some(json!({"reason": "claim_failed"})),
            );
        }

        match &found {
            Some(conn) => trace!("Reusing pooled connection to {}", conn.address()),
            None => debug!("Pool miss for {}", address),
        }

        self.inner.sweeper.schedule();
        found
    }

    /// Donate a non-multiplexed connection back to the pool.
    ///
    /// A dead connection is closed and never registered. Multiplexed
    /// connections must be offered with [`Pool::share`] instead; passing
    /// one here is ignored.
    pub fn release(&self, conn: Arc<C>) {
        if conn.is_multiplexed() {
            debug!(
                "Multiplexed connection to {} must be shared, not released",
                conn.address()
            );
            self.inner.sweeper.schedule();
            return;
        }

        if !conn.is_alive() {
            trace!("Discarding dead connection to {} on release", conn.address());
            conn.close();
            self.inner.events.record_event(
                EventKind::Discarded,
                conn.address(),
                Some(json!({"reason": "dead_on_release"})),
            );
            self.inner.sweeper.schedule();
            return;
        }

        conn.reset_idle_start_time();

        {
            let mut conns = self.inner.connections.lock().unwrap();
            // Guard against double release corrupting the registry.
            if conns.iter().any(|c| Arc::ptr_eq(c, &conn)) {
                debug!(
                    "Connection to {} already registered, ignoring duplicate release",
                    conn.address()
                );
            } else {
                trace!("Returned connection to pool for {}", conn.address());
                conns.push_front(conn);
            }
        }

        self.inner.sweeper.schedule();
    }

    /// Offer a multiplexed connection for sharing.
    ///
    /// The caller keeps using the connection; the pool only registers it
    /// so other callers can pick it up. Intended to be called once per
    /// connection, right after it is established. A dead connection is
    /// skipped but not closed, since the caller still co-owns it.
    pub fn share(&self, conn: Arc<C>) {
        if !conn.is_multiplexed() {
            debug!(
                "Connection to {} is not multiplexed and cannot be shared",
                conn.address()
            );
            self.inner.sweeper.schedule();
            return;
        }

        if !conn.is_alive() {
            trace!("Not sharing dead connection to {}", conn.address());
            self.inner.sweeper.schedule();
            return;
        }

        conn.reset_idle_start_time();

        {
            let mut conns = self.inner.connections.lock().unwrap();
            if conns.iter().any(|c| Arc::ptr_eq(c, &conn)) {
                debug!(
                    "Connection to {} already shared, ignoring duplicate",
                    conn.address()
                );
            } else {
                trace!("Sharing multiplexed connection to {}", conn.address());
                conns.push_front(conn);
            }
        }

        self.inner.sweeper.schedule();
    }

    /// Number of registered connections
    pub fn size(&self) -> usize {
        self.inner.connections.lock().unwrap().len()
    }

    /// Number of registered multiplexed connections
    pub fn count_multiplexed(&self) -> usize {
        self.inner
            .connections
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.is_multiplexed())
            .count()
    }

    /// Number of registered non-multiplexed connections
    pub fn count_non_multiplexed(&self) -> usize {
        self.inner
            .connections
            .lock()
            .unwrap()
            .iter()
            .filter(|c| !c.is_multiplexed())
            .count()
    }

    /// Number of idle non-multiplexed connections, the quantity bounded by
    /// `max_idle_connections`
    pub fn idle_count(&self) -> usize {
        self.inner
            .connections
            .lock()
            .unwrap()
            .iter()
            .filter(|c| PoolInner::is_trimmable(c))
            .count()
    }

    /// Get pool statistics
    pub fn stats(&self) -> PoolStats {
        let conns = self.inner.connections.lock().unwrap();
        let total = conns.len();
        let multiplexed = conns.iter().filter(|c| c.is_multiplexed()).count();
        let idle = conns.iter().filter(|c| PoolInner::is_trimmable(c)).count();

        PoolStats {
            total,
            multiplexed,
            non_multiplexed: total - multiplexed,
            idle,
            options: self.inner.options.clone(),
        }
    }

    /// Close and remove every idle connection.
    ///
    /// Shutdown path: multiplexed connections still serving streams are
    /// left registered and untouched.
    pub fn evict_all(&self) {
        let evicted: Vec<Arc<C>> = {
            let mut conns = self.inner.connections.lock().unwrap();
            let mut keep = VecDeque::with_capacity(conns.len());
            let mut out = Vec::new();

            while let Some(conn) = conns.pop_front() {
                if conn.is_idle() {
                    out.push(conn);
                } else {
                    keep.push_back(conn);
                }
            }

            *conns = keep;
            out
        };

        for conn in evicted {
            conn.close();
            debug!("Evicted connection to {} on shutdown", conn.address());
            self.inner.events.record_event(
                EventKind::Evicted,
                conn.address(),
                Some(json!({"reason": EvictReason::Shutdown.as_str()})),
            );
        }
    }

    /// Wait until every maintenance sweep queued so far has run.
    ///
    /// Exists to make tests deterministic; production code never needs to
    /// observe sweep completion.
    pub async fn drain(&self) -> Result<()> {
        self.inner.sweeper.drain().await
    }

    /// Recently recorded eviction and discard events
    pub fn recent_events(&self) -> Vec<PoolEvent> {
        self.inner.events.get_events()
    }
}

impl<C: Poolable> PoolInner<C> {
    /// One bounded maintenance sweep.
    ///
    /// Phase 1 removes at most `sweep_cap` dead or idle-expired entries,
    /// oldest region first. Phase 2 trims idle non-multiplexed entries,
    /// least-recently-used first, until `max_idle` is respected. Collected
    /// connections are closed only after the registry lock is released. A
    /// backlog larger than the cap drains across subsequent sweeps, each
    /// triggered by ordinary pool traffic.
    pub(crate) fn sweep(&self) {
        let mut evicted: SmallVec<[(Arc<C>, EvictReason); 4]> = SmallVec::new();

        {
            let mut conns = self.connections.lock().unwrap();

            // Phase 1: dead and expired entries, oldest first, capped.
            let mut removed = 0;
            let mut idx = conns.len();
            while idx > 0 && removed < self.sweep_cap {
                idx -= 1;

                let reason = {
                    let conn = &conns[idx];
                    if !conn.is_alive() {
                        Some(EvictReason::Dead)
                    } else if conn.is_idle()
                        && conn.idle_start_time().elapsed() >= self.keep_alive
                    {
                        Some(EvictReason::Expired)
                    } else {
                        // A multiplexed connection with live streams is in
                        // use and never removed here, stale clock or not.
                        None
                    }
                };

                if let Some(reason) = reason {
                    if let Some(conn) = conns.remove(idx) {
                        evicted.push((conn, reason));
                        removed += 1;
                    }
                }
            }

            // Phase 2: trim excess idle entries, least-recently-used first.
            let mut idle = conns.iter().filter(|c| Self::is_trimmable(c)).count();
            while idle > self.max_idle {
                match conns.iter().rposition(|c| Self::is_trimmable(c)) {
                    Some(pos) => {
                        if let Some(conn) = conns.remove(pos) {
                            evicted.push((conn, EvictReason::Excess));
                        }
                        idle -= 1;
                    }
                    None => break,
                }
            }
        }

        // Socket teardown stays outside the registry lock so close latency
        // cannot serialize unrelated acquire/release calls.
        for (conn, reason) in evicted {
            conn.close();
            debug!("Evicted {} connection to {}", reason.as_str(), conn.address());
            self.events.record_event(
                EventKind::Evicted,
                conn.address(),
                Some(json!({"reason": reason.as_str()})),
            );
        }
    }

    /// Idle non-multiplexed entries are what `max_idle` bounds.
    fn is_trimmable(conn: &Arc<C>) -> bool {
        !conn.is_multiplexed() && conn.is_idle()
    }
}

/// Statistics about the connection pool
#[derive(Debug, Clone)]
pub struct PoolStats {
    /// Total number of registered connections
    pub total: usize,
    /// Registered multiplexed connections
    pub multiplexed: usize,
    /// Registered non-multiplexed connections
    pub non_multiplexed: usize,
    /// Idle non-multiplexed connections (bounded by `max_idle_connections`)
    pub idle: usize,
    /// Options the pool was built with
    pub options: PoolOptions,
}
