//! Producer contract: a background task bound to one queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::queue::QueueHandle;

/// A background task that pushes values at the queue bound to `K`.
///
/// The manager injects the queue reference via [`Producer::set_queue`] on
/// `register_producer`; a producer must not assume a queue is present
/// before that call. Canonical implementations (see the crate-level
/// tests) retry on `QueueFull`, exit their loop on `QueueDisabled` or
/// `QueueAbsent`, and set `done` before returning.
pub trait Producer<K, V>: Send + Sync {
    /// The key of the queue this producer writes to.
    fn key(&self) -> &K;

    /// Whether the producer's worker should keep running.
    fn enabled(&self) -> bool;

    /// Ask the worker to stop. Does not block; use [`Producer::wait_done`]
    /// to join it.
    fn set_enabled(&self, enabled: bool);

    /// Whether the worker has exited.
    fn done(&self) -> bool;

    /// Start (or resume) producing. Implementations own their worker
    /// thread handle internally and must tolerate being called once per
    /// attachment.
    fn produce(&self);

    /// Block until the worker has exited.
    fn wait_done(&self);

    /// Install (or clear) the queue this producer writes to. Called only
    /// by the manager on `register_producer`/`unregister_producer`.
    fn set_queue(&self, queue: Option<QueueHandle<V>>);
}

/// Shared, manager-held reference to a producer.
pub type ProducerHandle<K, V> = Arc<dyn Producer<K, V>>;

/// Shared `enabled`/`done` flag pair most [`Producer`] implementations
/// compose rather than reimplementing the bookkeeping by hand.
#[derive(Debug, Default)]
pub struct ProducerFlags {
    enabled: AtomicBool,
    done: AtomicBool,
}

impl ProducerFlags {
    pub fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
            done: AtomicBool::new(false),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub fn done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    pub fn mark_done(&self) {
        self.done.store(true, Ordering::Release);
    }
}
