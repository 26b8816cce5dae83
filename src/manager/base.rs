//! Base registry manager (C6): AddQueue/RemoveQueue/Enqueue/Register/
//! Unregister/Start/Stop, shared by every manager shape.
//!
//! The original source serialises these operations behind a single
//! *reentrant* lock because `RemoveQueue` calls back into `Unsubscribe`
//! while already holding it. This rendition uses a plain
//! `parking_lot::Mutex` instead: internal helpers never call a public
//! locking method while already holding the lock. See DESIGN.md.

use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};
use parking_lot::Mutex;

use crate::config::BrokerConfig;
use crate::error::Result;
use crate::metrics::{BrokerMetrics, MetricsSummary};
use crate::producer::ProducerHandle;
use crate::queue::{QueueHandle, State};

use super::Registries;

/// Owns the key→queue/producer/consumer registries and the
/// administrative operations that mutate them.
///
/// `BaseManager` does not spawn threads of its own — that is
/// [`crate::manager::MpscManager`]'s job — but it does own every
/// producer's worker thread indirectly, via `wait_done` on
/// `unregister_producer`/`remove_queue`/`stop_processing`.
pub struct BaseManager<K, V> {
    pub(crate) registries: Mutex<Registries<K, V>>,
    pub(crate) is_enabled: Arc<AtomicBool>,
    pub(crate) metrics: Arc<Mutex<BrokerMetrics>>,
    pub(crate) config: BrokerConfig,
}

impl<K, V> BaseManager<K, V>
where
    K: Ord + Clone + Debug + Send + Sync + 'static,
    V: Send + 'static,
{
    /// Create a manager with default [`BrokerConfig`] values.
    pub fn new() -> Self {
        Self::with_config(BrokerConfig::default()).expect("default BrokerConfig is always valid")
    }

    /// Create a manager using the given configuration.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if `config` fails [`BrokerConfig::validate`].
    pub fn with_config(config: BrokerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            registries: Mutex::new(Registries::default()),
            is_enabled: Arc::new(AtomicBool::new(true)),
            metrics: Arc::new(Mutex::new(BrokerMetrics::new())),
            config,
        })
    }

    /// Whether the manager currently accepts processing.
    pub fn is_enabled(&self) -> bool {
        self.is_enabled.load(Ordering::Acquire)
    }

    /// Point-in-time metrics snapshot.
    pub fn metrics(&self) -> MetricsSummary {
        self.metrics.lock().summary()
    }

    /// Register a new queue under `key`. Enables the queue on success.
    pub fn add_queue(&self, key: K, queue: QueueHandle<V>) -> State {
        let mut reg = self.registries.lock();
        if reg.queues.contains_key(&key) {
            debug!("add_queue({key:?}) -> QueueExists");
            return State::QueueExists;
        }
        queue.set_enabled(true);
        reg.queues.insert(key.clone(), queue);
        drop(reg);

        self.metrics.lock().record_queue_added();
        debug!("add_queue({key:?}) -> Ok");
        State::Ok
    }

    /// Disable and remove the queue at `key`, draining its consumer
    /// registration and unregistering (and joining) every producer on it.
    ///
    /// This does not itself join a consumer *worker thread* — that
    /// requires the MPSC layer's thread table, so
    /// [`crate::manager::MpscManager::remove_queue`] calls `unsubscribe`
    /// first and then this method.
    pub fn remove_queue(&self, key: &K) -> State {
        let mut reg = self.registries.lock();
        let queue = match reg.queues.remove(key) {
            Some(q) => q,
            None => return State::QueueAbsent,
        };

        let remaining = queue.len();
        queue.stop();
        reg.consumers.remove(key);
        let producers = reg.producers.remove(key).unwrap_or_default();
        drop(reg);

        if remaining > self.config.drain_log_threshold {
            warn!("remove_queue({key:?}) discarding {remaining} buffered values");
        }

        for p in &producers {
            p.set_enabled(false);
        }
        for p in producers {
            p.wait_done();
            p.set_queue(None);
        }

        self.metrics.lock().record_queue_removed();
        debug!("remove_queue({key:?}) -> Ok");
        State::Ok
    }

    /// Fetch the queue bound to `key`, if any.
    pub fn get_queue(&self, key: &K) -> (Option<QueueHandle<V>>, State) {
        let reg = self.registries.lock();
        match reg.queues.get(key) {
            Some(q) => (Some(q.clone()), State::Ok),
            None => (None, State::QueueAbsent),
        }
    }

    /// Non-blocking enqueue. Holds the registry lock across the
    /// `try_push` call so this never stalls behind a blocking queue's
    /// `push`.
    pub fn enqueue(&self, key: &K, value: V) -> State {
        let reg = self.registries.lock();
        let state = match reg.queues.get(key) {
            Some(q) => q.try_push(value),
            None => State::QueueAbsent,
        };
        drop(reg);

        let mut metrics = self.metrics.lock();
        match state {
            State::Ok => metrics.record_enqueue_ok(),
            State::QueueFull => {
                metrics.record_enqueue_full();
                drop(metrics);
                warn!("enqueue({key:?}) -> QueueFull");
            }
            State::QueueDisabled => {
                metrics.record_enqueue_disabled();
                drop(metrics);
                warn!("enqueue({key:?}) -> QueueDisabled");
            }
            _ => {}
        }
        state
    }

    /// Bind `producer` to the queue at `key` and register it.
    ///
    /// Always allows multiple producers per key — the MPSC registration
    /// policy. A future single-producer manager would refuse once one
    /// producer is already bound; see the Open Question in DESIGN.md.
    pub fn register_producer(&self, key: &K, producer: ProducerHandle<K, V>) -> State {
        let mut reg = self.registries.lock();
        let queue = match reg.queues.get(key) {
            Some(q) => q.clone(),
            None => return State::QueueAbsent,
        };

        producer.set_queue(Some(queue));
        if !self.producer_registration_allowed(key) {
            producer.set_queue(None);
            return State::QueueBusy;
        }

        reg.producers.entry(key.clone()).or_default().push(producer);
        drop(reg);

        self.metrics.lock().record_producer_registered();
        debug!("register_producer({key:?}) -> Ok");
        State::Ok
    }

    /// Unbind `producer` from `key`, disabling and joining its worker.
    pub fn unregister_producer(&self, key: &K, producer: &ProducerHandle<K, V>) -> State {
        let mut reg = self.registries.lock();
        let found = match reg.producers.get_mut(key) {
            Some(list) => list.iter().position(|p| Arc::ptr_eq(p, producer)),
            None => None,
        };

        let removed = match found {
            Some(idx) => {
                let list = reg.producers.get_mut(key).unwrap();
                let p = list.remove(idx);
                if list.is_empty() {
                    reg.producers.remove(key);
                }
                p
            }
            None => return State::ProducerNotFound,
        };
        drop(reg);

        removed.set_enabled(false);
        removed.wait_done();
        removed.set_queue(None);

        self.metrics.lock().record_producer_unregistered();
        debug!("unregister_producer({key:?}) -> Ok");
        State::Ok
    }

    /// Whether every registered queue is currently empty.
    pub fn are_all_queues_empty(&self) -> bool {
        let reg = self.registries.lock();
        reg.queues.values().all(|q| q.is_empty())
    }

    /// Whether every registered producer has finished its worker.
    pub fn are_all_producers_done(&self) -> bool {
        let reg = self.registries.lock();
        reg.producers.values().flatten().all(|p| p.done())
    }

    /// Re-enable the manager, every queue, and every still-registered
    /// consumer. Does not respawn consumer worker threads — that is
    /// [`crate::manager::MpscManager::start_processing`]'s job.
    pub fn start_processing(&self) {
        self.is_enabled.store(true, Ordering::Release);
        let reg = self.registries.lock();
        for q in reg.queues.values() {
            q.set_enabled(true);
        }
        for c in reg.consumers.values() {
            c.set_enabled(true);
        }
    }

    /// Disable the manager, stop every queue, disable every consumer, and
    /// unregister (disable + join + clear) every producer.
    pub fn stop_processing(&self) {
        self.is_enabled.store(false, Ordering::Release);
        let mut reg = self.registries.lock();
        for q in reg.queues.values() {
            q.stop();
        }
        for c in reg.consumers.values() {
            c.set_enabled(false);
        }
        let producers: Vec<_> = std::mem::take(&mut reg.producers)
            .into_values()
            .flatten()
            .collect();
        drop(reg);

        for p in &producers {
            p.set_enabled(false);
        }
        let count = producers.len();
        for p in producers {
            p.wait_done();
            p.set_queue(None);
        }

        let mut metrics = self.metrics.lock();
        for _ in 0..count {
            metrics.record_producer_unregistered();
        }
        debug!("stop_processing done");
    }

    fn producer_registration_allowed(&self, _key: &K) -> bool {
        true
    }
}

impl<K, V> Default for BaseManager<K, V>
where
    K: Ord + Clone + Debug + Send + Sync + 'static,
    V: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
