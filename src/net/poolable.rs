use std::time::Instant;

use crate::net::Address;

/// Contract between the pool and the connections it manages.
///
/// The pool treats a connection as an opaque reusable handle: it never
/// inspects payloads or protocol state, only the lifecycle surface below.
/// Connections are shared by reference (`Arc`), so every method takes
/// `&self`; implementations keep their mutable state behind atomics or a
/// lock of their own.
pub trait Poolable: Send + Sync + 'static {
    /// The reuse identity this connection was established for.
    fn address(&self) -> &Address;

    /// Whether the underlying transport is still usable.
    ///
    /// Must reflect real transport health (e.g. detect a half-closed
    /// socket) and must report `false` once the connection is closed.
    fn is_alive(&self) -> bool;

    /// Whether no logical streams are currently running on the connection.
    fn is_idle(&self) -> bool;

    /// Whether many logical streams may run on the connection concurrently.
    /// Fixed at creation.
    fn is_multiplexed(&self) -> bool;

    /// Start of the current idle period.
    ///
    /// Implementations refresh this whenever the connection transitions
    /// from busy to idle, so `idle_start_time().elapsed()` measures how
    /// long the connection has gone unused.
    fn idle_start_time(&self) -> Instant;

    /// Restart the idle clock at now.
    fn reset_idle_start_time(&self);

    /// Tear down the transport. Idempotent: calling it twice must be
    /// tolerated and must never panic. After the first call `is_alive()`
    /// reports `false`.
    fn close(&self);
}
