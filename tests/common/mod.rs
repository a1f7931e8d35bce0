//! Shared test double for the pool's connection contract.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tidepool::{Address, Poolable, Scheme};

/// In-memory stand-in for a transport connection.
///
/// Aliveness, close calls, and busy streams are tracked with atomics so
/// tests can drive and observe the connection from several tasks at once.
pub struct FakeConn {
    address: Address,
    multiplexed: bool,
    alive: AtomicBool,
    close_calls: AtomicUsize,
    busy_streams: AtomicUsize,
    idle_since: Mutex<Instant>,
}

impl FakeConn {
    pub fn new(address: Address) -> Arc<Self> {
        Self::build(address, false)
    }

    pub fn multiplexed(address: Address) -> Arc<Self> {
        Self::build(address, true)
    }

    fn build(address: Address, multiplexed: bool) -> Arc<Self> {
        Arc::new(Self {
            address,
            multiplexed,
            alive: AtomicBool::new(true),
            close_calls: AtomicUsize::new(0),
            busy_streams: AtomicUsize::new(0),
            idle_since: Mutex::new(Instant::now()),
        })
    }

    /// Simulate transport death (peer reset) without a close call.
    pub fn kill(&self) {
        self.alive.store(false, Ordering::Release);
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::Acquire)
    }

    pub fn begin_stream(&self) {
        self.busy_streams.fetch_add(1, Ordering::AcqRel);
    }

    pub fn end_stream(&self) {
        if self.busy_streams.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.reset_idle_start_time();
        }
    }

    /// Pretend the connection has been idle for `age` already.
    pub fn backdate_idle(&self, age: Duration) {
        *self.idle_since.lock().unwrap() = Instant::now() - age;
    }
}

impl Poolable for FakeConn {
    fn address(&self) -> &Address {
        &self.address
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    fn is_idle(&self) -> bool {
        self.busy_streams.load(Ordering::Acquire) == 0
    }

    fn is_multiplexed(&self) -> bool {
        self.multiplexed
    }

    fn idle_start_time(&self) -> Instant {
        *self.idle_since.lock().unwrap()
    }

    fn reset_idle_start_time(&self) {
        *self.idle_since.lock().unwrap() = Instant::now();
    }

    fn close(&self) {
        self.alive.store(false, Ordering::Release);
        self.close_calls.fetch_add(1, Ordering::AcqRel);
    }
}

pub fn addr(host: &str) -> Address {
    Address::new(Scheme::Http, host, 80)
}
