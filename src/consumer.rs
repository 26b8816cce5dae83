//! Consumer contract: a callback invoked per value by a manager-owned
//! worker.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A callback invoked once per dequeued value.
///
/// A consumer does not own a thread — the
/// [`crate::manager::MpscManager`] runs it on the worker it spawns for
/// the subscribed queue. The manager guarantees exactly one worker per
/// queue, so `consume` is called single-threadedly for a given
/// subscription; a consumer instance reused across multiple queues must
/// tolerate concurrent invocation itself.
pub trait Consumer<V>: Send + Sync {
    /// Handle one dequeued value.
    fn consume(&self, value: V);

    /// Whether the worker driving this consumer should keep running.
    fn enabled(&self) -> bool;

    /// Ask the worker to stop after draining what's already buffered.
    fn set_enabled(&self, enabled: bool);
}

/// Shared, manager-held reference to a consumer.
pub type ConsumerHandle<V> = Arc<dyn Consumer<V>>;

/// Minimal `enabled` flag most [`Consumer`] implementations compose
/// rather than reimplementing by hand.
#[derive(Debug)]
pub struct ConsumerFlag(AtomicBool);

impl Default for ConsumerFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsumerFlag {
    pub fn new() -> Self {
        Self(AtomicBool::new(true))
    }

    pub fn enabled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.0.store(enabled, Ordering::Release);
    }
}
